//! Composes the scanner, the seen-state filter, the URL rewriter, and the
//! history store into one run over a change-list fragment.
//!
//! The run ends at an ordered list of planned opens; actually driving a
//! browser is the caller's business. Store failures never abort a run
//! (the [`History`] facade logs and drops them); scanning and URL
//! failures do.

use log::info;
use url::Url;

use crate::clock::Clock;
use crate::config::PipelineConfig;
use crate::db::History;
use crate::error::PipelineError;
use crate::rewrite::set_query_parameter;
use crate::scanner::{scan_fragment, SeenState, WatchlistEntry};

const DIFF_PARAMETER: &str = "diff";
/// `diff=0` selects the diff against the latest revision.
const DIFF_AGAINST_LATEST: &str = "0";

/// One decided open: the entry plus the canonical diff URL to hand to a
/// browser-opening collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOpen {
    pub entry: WatchlistEntry,
    pub url: String,
}

/// Counters for the caller's reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Entries scanned from the fragment.
    pub fetched: usize,
    /// Unseen entries that got an open planned.
    pub planned: usize,
    /// Entries whose latest change was already viewed.
    pub skipped_seen: usize,
    /// Unseen entries beyond the per-run open limit.
    pub deferred: usize,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub opens: Vec<PlannedOpen>,
    pub report: RunReport,
}

/// Scans one fragment and decides which diffs to open.
///
/// Every scanned entry refreshes its watch-list membership record. Unseen
/// entries, up to `config.max_opens`, get a target URL built from their
/// change link and a page-open record; unseen entries past the limit are
/// counted as deferred.
pub fn plan_opens(
    fragment: &str,
    config: &PipelineConfig,
    history: &History,
    clock: &dyn Clock,
) -> Result<RunOutcome, PipelineError> {
    let entries = scan_fragment(fragment)?;

    let mut report = RunReport {
        fetched: entries.len(),
        ..RunReport::default()
    };
    let mut opens = Vec::new();

    for entry in entries {
        history.record_watchlist_membership(&entry.page_title, &clock.now());
        match entry.seen {
            SeenState::Watched => {
                info!("Skipped {} as it was seen.", entry.page_title);
                report.skipped_seen += 1;
            }
            SeenState::NotWatched if opens.len() < config.max_opens => {
                let url = diff_url(&config.base_url, &entry.link_target)?;
                history.record_page_open(&entry.page_title, &clock.now());
                info!("Planned open of {} ({}).", entry.page_title, url);
                opens.push(PlannedOpen { entry, url });
            }
            SeenState::NotWatched => {
                report.deferred += 1;
            }
        }
    }

    report.planned = opens.len();
    info!("Fetched {} page(s).", report.fetched);
    info!(
        "Unseen entries that were not opened: {}.",
        report.deferred
    );

    Ok(RunOutcome { opens, report })
}

/// Resolves an entry's change link against the base site and pins the
/// diff parameter to the latest revision.
fn diff_url(base_url: &Url, link_target: &str) -> Result<String, PipelineError> {
    let absolute = base_url
        .join(link_target)
        .map_err(|source| PipelineError::Link {
            link: link_target.to_owned(),
            source,
        })?;
    Ok(set_query_parameter(
        absolute.as_str(),
        DIFF_PARAMETER,
        DIFF_AGAINST_LATEST,
    )?)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::{DateTime, Duration, FixedOffset};

    use super::*;
    use crate::db::{HistoryStore, OpenConflictPolicy};
    use crate::error::ScanError;

    /// Yields strictly increasing timestamps, one second apart.
    struct SteppingClock {
        base: DateTime<FixedOffset>,
        step: Cell<i64>,
    }

    impl SteppingClock {
        fn new() -> Self {
            Self {
                base: DateTime::parse_from_rfc3339("2026-08-04T10:00:00+02:00").unwrap(),
                step: Cell::new(0),
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<FixedOffset> {
            let step = self.step.get();
            self.step.set(step + 1);
            self.base + Duration::seconds(step)
        }
    }

    fn in_memory_history() -> History {
        History::from_store(
            HistoryStore::open_in_memory(OpenConflictPolicy::default()).unwrap(),
        )
    }

    const TWO_LINE_FRAGMENT: &str = r#"<ul>
        <li class="mw-changeslist-line mw-changeslist-line-not-watched">
            <a class="mw-changeslist-diff" href="/w/index.php?title=Earth&amp;diff=123&amp;oldid=100" title="Earth">diff</a>
            <span class="mw-diff-bytes">+120</span>
        </li>
        <li class="mw-changeslist-line mw-changeslist-line-watched">
            <a class="mw-changeslist-diff" href="/w/index.php?title=Mars&amp;diff=456&amp;oldid=400" title="Mars">diff</a>
        </li>
    </ul>"#;

    #[test]
    fn plans_opens_for_unseen_entries_only() {
        let history = in_memory_history();
        let outcome = plan_opens(
            TWO_LINE_FRAGMENT,
            &PipelineConfig::default(),
            &history,
            &SteppingClock::new(),
        )
        .unwrap();

        assert_eq!(outcome.opens.len(), 1);
        assert_eq!(outcome.opens[0].entry.page_title, "Earth");
        assert_eq!(
            outcome.opens[0].url,
            "https://en.wikipedia.org/w/index.php?title=Earth&diff=0&oldid=100"
        );
        assert_eq!(
            outcome.report,
            RunReport {
                fetched: 2,
                planned: 1,
                skipped_seen: 1,
                deferred: 0,
            }
        );
    }

    #[test]
    fn records_membership_for_every_entry_but_opens_only_planned_ones() {
        let history = in_memory_history();
        plan_opens(
            TWO_LINE_FRAGMENT,
            &PipelineConfig::default(),
            &history,
            &SteppingClock::new(),
        )
        .unwrap();

        let store = history.store().unwrap();
        let members: Vec<String> = store
            .watchlist_pages()
            .unwrap()
            .into_iter()
            .map(|page| page.name)
            .collect();
        assert_eq!(members, vec!["Earth", "Mars"]);
        assert_eq!(store.page_open_count("Earth").unwrap(), 1);
        assert_eq!(store.page_open_count("Mars").unwrap(), 0);
    }

    #[test]
    fn open_limit_defers_remaining_unseen_entries() {
        let fragment = r#"<ul>
            <li class="mw-changeslist-line mw-changeslist-line-not-watched">
                <a class="mw-changeslist-diff" href="/a" title="Alpha">diff</a>
            </li>
            <li class="mw-changeslist-line mw-changeslist-line-not-watched">
                <a class="mw-changeslist-diff" href="/b" title="Beta">diff</a>
            </li>
        </ul>"#;

        let config = PipelineConfig {
            max_opens: 1,
            ..PipelineConfig::default()
        };
        let history = in_memory_history();
        let outcome =
            plan_opens(fragment, &config, &history, &SteppingClock::new()).unwrap();

        assert_eq!(outcome.opens.len(), 1);
        assert_eq!(outcome.opens[0].entry.page_title, "Alpha");
        assert_eq!(outcome.report.deferred, 1);
        assert_eq!(
            history.store().unwrap().page_open_count("Beta").unwrap(),
            0
        );
    }

    #[test]
    fn unavailable_history_still_produces_a_plan() {
        let outcome = plan_opens(
            TWO_LINE_FRAGMENT,
            &PipelineConfig::default(),
            &History::unavailable(),
            &SteppingClock::new(),
        )
        .unwrap();

        assert_eq!(outcome.opens.len(), 1);
        assert_eq!(outcome.report.fetched, 2);
    }

    #[test]
    fn scan_failures_abort_the_run() {
        let fragment = r#"<ul><li class="mw-changeslist-line"></li></ul>"#;
        let result = plan_opens(
            fragment,
            &PipelineConfig::default(),
            &History::unavailable(),
            &SteppingClock::new(),
        );

        assert!(matches!(
            result,
            Err(PipelineError::Scan(ScanError::UnclassifiedLine))
        ));
    }

    #[test]
    fn open_timestamps_are_distinct_within_a_run() {
        let fragment = r#"<ul>
            <li class="mw-changeslist-line mw-changeslist-line-not-watched">
                <a class="mw-changeslist-diff" href="/a" title="Alpha">diff</a>
            </li>
            <li class="mw-changeslist-line mw-changeslist-line-not-watched">
                <a class="mw-changeslist-diff" href="/b" title="Beta">diff</a>
            </li>
        </ul>"#;

        let history = in_memory_history();
        plan_opens(
            fragment,
            &PipelineConfig::default(),
            &history,
            &SteppingClock::new(),
        )
        .unwrap();

        let opens = history.store().unwrap().recent_opens(10).unwrap();
        assert_eq!(opens.len(), 2);
        assert_ne!(opens[0].opened_at, opens[1].opened_at);
    }
}
