//! Transaction records: lifecycle status, read set, and write buffer.

use std::collections::HashMap;

use availdb_core::{AbortReason, SiteId, TxnId, VarId};

/// The lifecycle status of a transaction.
///
/// Legal transitions: `Active -> Waiting`, `Waiting -> Active`,
/// `Active -> Committed`, `Active -> Aborted`, `Waiting -> Aborted`.
/// `Committed` and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Accepting reads, writes, and commit attempts.
    Active,
    /// Blocked on a read with no currently readable copy; resumed by a
    /// `recover` event.
    Waiting,
    /// Committed; its writes are now visible site state.
    Committed,
    /// Aborted; see the transaction's `abort_reason` for why.
    Aborted,
}

impl TransactionStatus {
    /// Whether the transaction has reached a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionStatus::Committed | TransactionStatus::Aborted)
    }

    /// Whether the transaction may still accept reads or writes: active
    /// or waiting on one, per spec.md §4.2 step 1.
    pub fn is_live(self) -> bool {
        matches!(self, TransactionStatus::Active | TransactionStatus::Waiting)
    }
}

/// A value recorded in a transaction's read set: what was read, which
/// site served it, and which transaction committed that version.
#[derive(Debug, Clone)]
pub struct ReadRecord {
    /// The value observed.
    pub value: i64,
    /// The site that served the snapshot.
    pub source_site: SiteId,
    /// The transaction that committed the version read.
    pub writer: TxnId,
    /// The logical time the version read was committed.
    pub commit_time: u64,
}

/// One in-flight or finished transaction.
#[derive(Debug, Clone)]
pub struct Transaction {
    id: TxnId,
    start_time: u64,
    status: TransactionStatus,
    abort_reason: Option<AbortReason>,
    read_set: HashMap<VarId, ReadRecord>,
    write_buffer: HashMap<VarId, i64>,
    write_sites: HashMap<VarId, Vec<SiteId>>,
    accessed_sites_at_write_time: HashMap<SiteId, u64>,
}

impl Transaction {
    /// Begin a new, active transaction.
    pub fn new(id: TxnId, start_time: u64) -> Self {
        Transaction {
            id,
            start_time,
            status: TransactionStatus::Active,
            abort_reason: None,
            read_set: HashMap::new(),
            write_buffer: HashMap::new(),
            write_sites: HashMap::new(),
            accessed_sites_at_write_time: HashMap::new(),
        }
    }

    /// This transaction's id.
    pub fn id(&self) -> &TxnId {
        &self.id
    }

    /// The logical time `begin` was processed.
    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    /// Current lifecycle status.
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Move to a new status. Panics if the transaction is already
    /// terminal — terminal transactions are retained for dependency
    /// lookups but never mutated further.
    pub fn set_status(&mut self, status: TransactionStatus) {
        assert!(!self.status.is_terminal(), "cannot transition a terminal transaction");
        self.status = status;
    }

    /// Mark the transaction aborted with a reason, recording it for
    /// diagnostics and for the `Tn aborts: <reason>` output line.
    pub fn abort(&mut self, reason: AbortReason) {
        self.status = TransactionStatus::Aborted;
        self.abort_reason = Some(reason);
    }

    /// Mark the transaction committed.
    pub fn commit(&mut self) {
        self.status = TransactionStatus::Committed;
    }

    /// The recorded abort reason, if aborted.
    pub fn abort_reason(&self) -> Option<&AbortReason> {
        self.abort_reason.as_ref()
    }

    /// A pending local write, if `var` was written by this transaction
    /// earlier in its lifetime (read-your-writes).
    pub fn buffered_write(&self, var: VarId) -> Option<i64> {
        self.write_buffer.get(&var).copied()
    }

    /// A cached read, if `var` was already read by this transaction.
    pub fn cached_read(&self, var: VarId) -> Option<&ReadRecord> {
        self.read_set.get(&var)
    }

    /// Record a fresh snapshot read.
    pub fn record_read(&mut self, var: VarId, record: ReadRecord) {
        self.read_set.insert(var, record);
    }

    /// Record a buffered write and the sites it reached.
    pub fn record_write(&mut self, var: VarId, value: i64, sites: Vec<SiteId>, now: u64) {
        self.write_buffer.insert(var, value);
        for &site in &sites {
            self.accessed_sites_at_write_time
                .entry(site)
                .and_modify(|earliest| *earliest = (*earliest).min(now))
                .or_insert(now);
        }
        self.write_sites.insert(var, sites);
    }

    /// This transaction's full read set.
    pub fn read_set(&self) -> &HashMap<VarId, ReadRecord> {
        &self.read_set
    }

    /// This transaction's full write buffer.
    pub fn write_buffer(&self) -> &HashMap<VarId, i64> {
        &self.write_buffer
    }

    /// The sites that accepted the write for `var`, if any.
    pub fn write_sites_for(&self, var: VarId) -> Option<&[SiteId]> {
        self.write_sites.get(&var).map(Vec::as_slice)
    }

    /// Every `(site, earliest write time)` pair this transaction touched.
    pub fn accessed_sites_at_write_time(&self) -> &HashMap<SiteId, u64> {
        &self.accessed_sites_at_write_time
    }
}
