//! The transaction table and the FIFO waiting-read queue.

use std::collections::{HashMap, VecDeque};

use availdb_core::{AvailError, TxnId, VarId};

use crate::transaction::Transaction;

/// A read blocked on a variable with no currently readable snapshot.
///
/// Immutable data, not a suspended thread or future: retried by the
/// manager whenever a `recover` event is processed (spec.md §4.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitingOperation {
    /// The waiting transaction.
    pub txn: TxnId,
    /// The variable it is waiting to read.
    pub var: VarId,
}

/// All live and terminal transaction records, plus the waiting queue.
#[derive(Debug, Default)]
pub struct TransactionTable {
    transactions: HashMap<TxnId, Transaction>,
    waiting: VecDeque<WaitingOperation>,
}

impl TransactionTable {
    /// An empty table.
    pub fn new() -> Self {
        TransactionTable::default()
    }

    /// Begin a new transaction. Errors if the id is already in use —
    /// terminal records are retained for dependency lookups, so a
    /// `begin` naming a finished id would otherwise silently clobber it.
    pub fn begin(&mut self, id: TxnId, start_time: u64) -> Result<&mut Transaction, AvailError> {
        if self.transactions.contains_key(&id) {
            return Err(AvailError::DuplicateTransaction(id.to_string()));
        }
        let txn = Transaction::new(id.clone(), start_time);
        Ok(self.transactions.entry(id).or_insert(txn))
    }

    /// Look up a transaction record, whatever its status.
    pub fn get(&self, id: &TxnId) -> Option<&Transaction> {
        self.transactions.get(id)
    }

    /// Look up a transaction record mutably.
    pub fn get_mut(&mut self, id: &TxnId) -> Option<&mut Transaction> {
        self.transactions.get_mut(id)
    }

    /// Look up a transaction, failing with a protocol error if unknown.
    pub fn require(&self, id: &TxnId) -> Result<&Transaction, AvailError> {
        self.get(id)
            .ok_or_else(|| AvailError::UnknownTransaction(id.to_string()))
    }

    /// Look up a transaction mutably, failing with a protocol error if
    /// unknown.
    pub fn require_mut(&mut self, id: &TxnId) -> Result<&mut Transaction, AvailError> {
        self.get_mut(id)
            .ok_or_else(|| AvailError::UnknownTransaction(id.to_string()))
    }

    /// Every live (non-terminal) transaction other than `except`.
    pub fn live_transactions_except<'a>(&'a self, except: &'a TxnId) -> impl Iterator<Item = &'a Transaction> {
        self.transactions
            .values()
            .filter(move |t| t.id() != except && t.status().is_live())
    }

    /// Every committed transaction, for commit-time dependency bookkeeping.
    pub fn committed_transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .values()
            .filter(|t| matches!(t.status(), crate::transaction::TransactionStatus::Committed))
    }

    /// Enqueue a blocked read.
    pub fn enqueue_waiting(&mut self, op: WaitingOperation) {
        self.waiting.push_back(op);
    }

    /// Remove every waiting entry for `txn` (it is about to be aborted).
    pub fn drop_waiting_for(&mut self, txn: &TxnId) {
        self.waiting.retain(|op| &op.txn != txn);
    }

    /// Drain the entire waiting queue in FIFO order, for a `recover` retry
    /// pass. Entries that remain unresumed should be re-enqueued by the
    /// caller via [`TransactionTable::enqueue_waiting`].
    pub fn drain_waiting(&mut self) -> Vec<WaitingOperation> {
        self.waiting.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_twice_with_same_id_errors() {
        let mut table = TransactionTable::new();
        table.begin(TxnId::new("T1"), 0).unwrap();
        assert!(table.begin(TxnId::new("T1"), 1).is_err());
    }

    #[test]
    fn waiting_queue_is_fifo() {
        let mut table = TransactionTable::new();
        table.enqueue_waiting(WaitingOperation { txn: TxnId::new("T1"), var: VarId::new(1).unwrap() });
        table.enqueue_waiting(WaitingOperation { txn: TxnId::new("T2"), var: VarId::new(2).unwrap() });
        let drained = table.drain_waiting();
        assert_eq!(drained[0].txn, TxnId::new("T1"));
        assert_eq!(drained[1].txn, TxnId::new("T2"));
        assert!(table.drain_waiting().is_empty());
    }

    #[test]
    fn drop_waiting_for_removes_only_that_transaction() {
        let mut table = TransactionTable::new();
        table.enqueue_waiting(WaitingOperation { txn: TxnId::new("T1"), var: VarId::new(1).unwrap() });
        table.enqueue_waiting(WaitingOperation { txn: TxnId::new("T2"), var: VarId::new(2).unwrap() });
        table.drop_waiting_for(&TxnId::new("T1"));
        let drained = table.drain_waiting();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].txn, TxnId::new("T2"));
    }
}
