//! The engine's typed response to a dispatched command.
//!
//! Kept free of any string formatting — that lives entirely in the CLI's
//! formatting module, which is the only place that knows the textual line
//! shapes (spec.md §6).

use availdb_core::{AbortReason, SiteId, TxnId, VarId};
use availdb_sites::SiteDump;
use std::collections::BTreeMap;

/// The result of dispatching one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// A successful read.
    Read {
        /// Variable read.
        var: VarId,
        /// Value observed.
        value: i64,
    },
    /// A read could not be served immediately and is now queued.
    Waiting {
        /// Waiting transaction.
        txn: TxnId,
        /// Variable it is waiting on.
        var: VarId,
    },
    /// A write was buffered and sent to the given sites.
    Written {
        /// Variable written.
        var: VarId,
        /// Sites that accepted the buffered write.
        sites: Vec<SiteId>,
    },
    /// A transaction committed.
    Committed {
        /// The committed transaction.
        txn: TxnId,
    },
    /// A transaction aborted, at `end` or forced.
    Aborted {
        /// The aborted transaction.
        txn: TxnId,
        /// Why.
        reason: AbortReason,
    },
    /// A `begin`, `fail`, or `recover` that produces no output line of
    /// its own but succeeded.
    Ack,
    /// A protocol error: a bug in the caller, never printed to stdout.
    ProtocolError(String),
    /// The result of `dump()`.
    Dump(BTreeMap<SiteId, SiteDump>),
}
