//! Error types for the scanning and URL-rewriting core.
//!
//! Store failures are deliberately absent here: persistence problems are
//! logged and degraded to no-ops (see [`crate::db::History`]) instead of
//! surfacing as errors to the caller.

use thiserror::Error;

/// Fatal scanning failures. The first one aborts the whole fragment; the
/// change-list markup is assumed well-formed, so a failure means the source
/// is malformed or the rendering changed incompatibly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    /// A change-list line carries neither the watched nor the not-watched
    /// class and is not a log action.
    #[error("change-list line has no seen classification")]
    UnclassifiedLine,

    /// A diff link appeared while the current line's classification was
    /// still unresolved.
    #[error("entry {title:?} created before its line was classified")]
    UnclassifiedEntry { title: String },

    /// A required attribute was absent (or empty) on a marker that the
    /// input contract says must carry it.
    #[error("missing required attribute {attribute:?} on {marker} marker")]
    MissingAttribute {
        attribute: &'static str,
        marker: &'static str,
    },

    /// A user link appeared before any entry existed to attach it to.
    #[error("user link appeared before any change entry")]
    DanglingUserLink,

    /// Diff-size text appeared before any entry existed to attach it to.
    #[error("diff size text appeared before any change entry")]
    DanglingDiffText,
}

/// Failures of a single query-rewrite call. These never corrupt other
/// state; the caller simply loses that one URL.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewriteError {
    /// The input string is not a parseable absolute URL.
    #[error("invalid url {url:?}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The query string failed strict validation: an empty query, an empty
    /// field, a field without `=`, or a field with an empty key.
    #[error("malformed query field {field:?} in {url:?}")]
    QueryFormat { url: String, field: String },
}

/// Everything that can abort a pipeline run. Callers pattern-match on the
/// variant to tell a markup problem from a URL problem.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    /// An entry's change link could not be resolved against the configured
    /// base URL.
    #[error("could not resolve change link {link:?}")]
    Link {
        link: String,
        #[source]
        source: url::ParseError,
    },
}
