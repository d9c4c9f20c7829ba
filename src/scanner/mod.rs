//! Single-pass scanner for watch-list change fragments.
//!
//! One rendering of the change list is a sequence of "line" elements, each
//! annotated with structural classes. The scanner folds the document-ordered
//! event stream through an explicit state machine and emits one
//! [`WatchlistEntry`] per edit line, in document order. Lines describing
//! log actions (moves, deletions, protections) are skipped wholesale.
//!
//! The scanner is fail-fast, not best-effort: the first line that cannot be
//! classified aborts the whole fragment with a [`ScanError`].

mod events;

pub use events::{fragment_events, MarkupEvent, StartTag};

use scraper::Html;

use crate::error::ScanError;

/// Marks one rendered change-list line.
pub const LINE_CLASS: &str = "mw-changeslist-line";
/// Line class meaning the latest change was already viewed.
pub const LINE_WATCHED_CLASS: &str = "mw-changeslist-line-watched";
/// Line class meaning the page has changes the user has not viewed.
pub const LINE_NOT_WATCHED_CLASS: &str = "mw-changeslist-line-not-watched";
/// Present on lines describing log actions rather than edits.
pub const LOG_ACTION_ATTRIBUTE: &str = "data-mw-logaction";
/// Marks the diff/history link that begins an entry.
pub const DIFF_LINK_CLASS: &str = "mw-changeslist-diff";
/// Marks the link carrying the editing user's identity.
pub const USER_LINK_CLASS: &str = "mw-userlink";
/// Marks the element whose text is the byte-size delta of the edit.
pub const DIFF_BYTES_CLASS: &str = "mw-diff-bytes";

/// Whether the user has already viewed the latest change to a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeenState {
    /// The latest change was already viewed; nothing new to open.
    Watched,
    /// The page has changes the user has not looked at yet.
    NotWatched,
}

/// One row of the change list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchlistEntry {
    pub page_title: String,
    /// Path or URL of the page's diff, as rendered in the fragment.
    pub link_target: String,
    pub user: Option<String>,
    pub user_link: Option<String>,
    /// Raw byte-delta text, e.g. `"+120"`.
    pub diff: Option<String>,
    pub seen: SeenState,
}

/// Scanner state threaded through the event fold.
#[derive(Debug, Default)]
struct ScanState {
    /// Classification announced by the current line, consumed when the
    /// line's entry is created. `None` means unknown.
    pending_seen: Option<SeenState>,
    /// True while inside a log-action line; everything until the next line
    /// boundary is ignored.
    skipping_line: bool,
    /// True right after a byte-delta marker; the next text event is the
    /// current entry's diff.
    collecting_diff: bool,
    entries: Vec<WatchlistEntry>,
}

impl ScanState {
    fn on_start_tag(&mut self, tag: &StartTag<'_>) -> Result<(), ScanError> {
        if tag.has_class(LINE_CLASS) {
            return self.on_line_boundary(tag);
        }
        if self.skipping_line {
            return Ok(());
        }
        if tag.has_class(DIFF_LINK_CLASS) {
            return self.on_diff_link(tag);
        }
        if tag.has_class(USER_LINK_CLASS) {
            let entry = self
                .entries
                .last_mut()
                .ok_or(ScanError::DanglingUserLink)?;
            entry.user = tag.attr("title").map(str::to_owned);
            entry.user_link = tag.attr("href").map(str::to_owned);
            return Ok(());
        }
        if tag.has_class(DIFF_BYTES_CLASS) {
            self.collecting_diff = true;
        }
        Ok(())
    }

    fn on_line_boundary(&mut self, tag: &StartTag<'_>) -> Result<(), ScanError> {
        if tag.attr(LOG_ACTION_ATTRIBUTE).is_some() {
            // Log actions carry no edit to open; the line's contents are
            // ignored and any pending classification stays untouched.
            self.skipping_line = true;
            return Ok(());
        }
        if tag.has_class(LINE_WATCHED_CLASS) {
            self.pending_seen = Some(SeenState::Watched);
        } else if tag.has_class(LINE_NOT_WATCHED_CLASS) {
            self.pending_seen = Some(SeenState::NotWatched);
        } else {
            return Err(ScanError::UnclassifiedLine);
        }
        self.skipping_line = false;
        Ok(())
    }

    fn on_diff_link(&mut self, tag: &StartTag<'_>) -> Result<(), ScanError> {
        let page_title = required_attr(tag, "title", "diff link")?;
        let link_target = required_attr(tag, "href", "diff link")?;
        let seen = self
            .pending_seen
            .take()
            .ok_or_else(|| ScanError::UnclassifiedEntry {
                title: page_title.to_owned(),
            })?;
        self.entries.push(WatchlistEntry {
            page_title: page_title.to_owned(),
            link_target: link_target.to_owned(),
            user: None,
            user_link: None,
            diff: None,
            seen,
        });
        Ok(())
    }

    fn on_text(&mut self, text: &str) -> Result<(), ScanError> {
        if !self.collecting_diff {
            return Ok(());
        }
        let entry = self
            .entries
            .last_mut()
            .ok_or(ScanError::DanglingDiffText)?;
        entry.diff = Some(text.to_owned());
        self.collecting_diff = false;
        Ok(())
    }
}

fn required_attr<'a>(
    tag: &StartTag<'a>,
    attribute: &'static str,
    marker: &'static str,
) -> Result<&'a str, ScanError> {
    match tag.attr(attribute) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ScanError::MissingAttribute { attribute, marker }),
    }
}

/// Folds a markup event sequence into ordered watchlist entries.
///
/// The sequence is consumed exactly once, front to back; there is no
/// backtracking. The first classification failure aborts the scan.
pub fn scan_events<'a, I>(events: I) -> Result<Vec<WatchlistEntry>, ScanError>
where
    I: IntoIterator<Item = MarkupEvent<'a>>,
{
    let mut state = ScanState::default();
    for event in events {
        match event {
            MarkupEvent::StartTag(tag) => state.on_start_tag(&tag)?,
            MarkupEvent::Text(text) => state.on_text(text)?,
        }
    }
    Ok(state.entries)
}

/// Parses a change-list fragment and scans it.
pub fn scan_fragment(fragment: &str) -> Result<Vec<WatchlistEntry>, ScanError> {
    let document = Html::parse_fragment(fragment);
    scan_events(fragment_events(&document))
}
