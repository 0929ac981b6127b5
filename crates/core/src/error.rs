//! Error types for the Available-Copies / SSI core
//!
//! Two separate taxonomies live here, matching the split the engine makes
//! between outcomes that are normal parts of the protocol and outcomes that
//! indicate the caller misused the API:
//!
//! - [`AbortReason`] — why a transaction's `end()` failed validation, or why
//!   it was forced to abort outside of `end()`. These are not bugs; they are
//!   printed to the user verbatim.
//! - [`AvailError`] — a protocol error: the caller referenced a transaction,
//!   variable, or site that doesn't exist, or operated on a terminal
//!   transaction. These never mutate state and are surfaced as diagnostics.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, AvailError>;

/// Reason a transaction aborted.
///
/// Carries enough context for logging even though the user-facing tag
/// (see [`AbortReason::tag`]) is fixed text per spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// A site accessed for a write failed after the write was issued but
    /// before (or at) commit time.
    SiteFailedAfterWrite {
        /// Site that failed.
        site: u8,
    },
    /// First-committer-wins: another transaction committed a version of
    /// this variable after this transaction's start.
    WwConflict {
        /// Variable index in conflict.
        var: u8,
    },
    /// Committing would close a cycle with two consecutive RW edges.
    DangerousCycle,
    /// No site hosting the variable can serve a snapshot, now or ever.
    NoReadableCopy,
    /// No site hosting the variable was up at write time.
    NoUpSiteForWrite,
}

impl AbortReason {
    /// The fixed-text tag printed after `Tn aborts:` (spec.md §7).
    pub fn tag(&self) -> &'static str {
        match self {
            AbortReason::SiteFailedAfterWrite { .. } => "site-failed-after-write",
            AbortReason::WwConflict { .. } => "WW-conflict",
            AbortReason::DangerousCycle => "dangerous-cycle",
            AbortReason::NoReadableCopy => "no-readable-copy",
            AbortReason::NoUpSiteForWrite => "no-up-site-for-write",
        }
    }
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Protocol-level errors: bugs in the caller, never in the protocol itself.
///
/// None of these mutate transaction, site, or graph state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AvailError {
    /// Referenced a transaction id that was never begun.
    #[error("unknown transaction {0}")]
    UnknownTransaction(String),

    /// Operated on a transaction already in a terminal state.
    #[error("transaction {0} is already terminal")]
    TerminalTransaction(String),

    /// Referenced a variable name outside `x1..=x20`.
    #[error("unknown variable {0}")]
    UnknownVariable(String),

    /// Referenced a site id outside `1..=10`.
    #[error("unknown site {0}")]
    UnknownSite(String),

    /// `begin` named a transaction id that is already live or terminal.
    #[error("transaction {0} already exists")]
    DuplicateTransaction(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_reason_tags_match_spec_vocabulary() {
        assert_eq!(
            AbortReason::SiteFailedAfterWrite { site: 3 }.tag(),
            "site-failed-after-write"
        );
        assert_eq!(AbortReason::WwConflict { var: 1 }.tag(), "WW-conflict");
        assert_eq!(AbortReason::DangerousCycle.tag(), "dangerous-cycle");
        assert_eq!(AbortReason::NoReadableCopy.tag(), "no-readable-copy");
        assert_eq!(AbortReason::NoUpSiteForWrite.tag(), "no-up-site-for-write");
    }

    #[test]
    fn avail_error_messages_name_the_offending_token() {
        let err = AvailError::UnknownTransaction("T9".to_string());
        assert!(err.to_string().contains("T9"));
    }
}
