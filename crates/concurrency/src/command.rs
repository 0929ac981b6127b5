//! The command stream the engine consumes — one tagged variant per
//! recognized shape (spec.md §6), dispatched by a single entry point
//! rather than through inheritance.

use availdb_core::{SiteId, TxnId, VarId};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `begin(Tn)`
    Begin(TxnId),
    /// `R(Tn, xi)`
    Read(TxnId, VarId),
    /// `W(Tn, xi, v)`
    Write(TxnId, VarId, i64),
    /// `end(Tn)`
    End(TxnId),
    /// `fail(k)`
    Fail(SiteId),
    /// `recover(k)`
    Recover(SiteId),
    /// `dump()`
    Dump,
}
