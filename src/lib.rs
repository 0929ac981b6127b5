//! # availdb
//!
//! A replicated, multi-version key-value core enforcing Serializable
//! Snapshot Isolation on top of the Available Copies replication
//! protocol, across a fixed ten-site cluster.
//!
//! The engine is driven entirely through a tagged [`Command`]/[`Output`]
//! pair dispatched against a single [`TransactionManager`] — there is no
//! inheritance hierarchy and no hidden mutable state outside that one
//! struct.
//!
//! # Quick start
//!
//! ```
//! use availdb::{Command, TransactionManager};
//! use availdb_core::{SiteId, TxnId, VarId};
//!
//! let mut tm = TransactionManager::new();
//! tm.dispatch(Command::Begin(TxnId::new("T1")));
//! tm.dispatch(Command::Write(TxnId::new("T1"), VarId::new(2).unwrap(), 7));
//! tm.dispatch(Command::End(TxnId::new("T1")));
//! ```
//!
//! # Architecture
//!
//! | Crate | Responsibility |
//! |-------|----------------|
//! | `availdb-core` | Identifier newtypes, placement policy, logical clock, error taxonomy |
//! | `availdb-sites` | Per-site version chains, failure history, Available-Copies read/write rules |
//! | `availdb-concurrency` | Transaction table, dependency graph, the three commit-validation phases, `TransactionManager` |
//! | `availdb-cli` | The batch command-script driver (`availdb` binary) |
//!
//! Durable on-disk storage, network transport, distributed clocks, dynamic
//! cluster membership, schema evolution, range scans, and secondary
//! indices are explicit non-goals: the ten sites and twenty variables are
//! fixed at compile time, and everything lives in memory for the lifetime
//! of one process.

pub use availdb_concurrency::{
    Command, DependencyGraph, EdgeKind, Output, Transaction, TransactionManager,
    TransactionStatus, TransactionTable, WaitingOperation,
};
pub use availdb_core::{AbortReason, AvailError, LogicalClock, Result, SiteId, TxnId, VarId};
pub use availdb_sites::{FailureHistory, ReadCandidate, Site, SiteDump, SiteStore, VariableVersion};
