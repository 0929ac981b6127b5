//! Commit-time validation: the three phases run by `end(T)`.
//!
//! First failure decides; phases run in order A, B, C.

use availdb_core::{AbortReason, TxnId, VarId};
use availdb_sites::SiteStore;

use crate::graph::{DependencyGraph, EdgeKind};
use crate::table::TransactionTable;
use crate::transaction::Transaction;

/// Phase A — Available Copies check.
///
/// For every site this transaction wrote to, a failure strictly after the
/// write and up to (and including) `now` voids that write's durability.
/// Recovery after the failure does not rehabilitate it.
pub fn phase_a(sites: &SiteStore, txn: &Transaction, now: u64) -> Result<(), AbortReason> {
    for (&site, &write_time) in txn.accessed_sites_at_write_time() {
        if !sites.continuously_up_over(site, write_time, now) {
            return Err(AbortReason::SiteFailedAfterWrite { site: site.get() });
        }
    }
    Ok(())
}

/// Phase B — first-committer-wins.
///
/// For every variable this transaction buffered a write for, if any
/// hosting site (up or down — down sites' commit history still counts)
/// holds a version committed strictly after this transaction's start, a
/// concurrent writer beat it to the punch.
pub fn phase_b(sites: &SiteStore, txn: &Transaction) -> Result<(), AbortReason> {
    for &var in txn.write_buffer().keys() {
        for site in sites.sites_for(var) {
            if sites.newest_commit_after(site, var, txn.start_time()).is_some() {
                return Err(AbortReason::WwConflict { var: var.get() });
            }
        }
    }
    Ok(())
}

/// The outcome of a Phase C attempt: the provisional edges added (always
/// populated, regardless of outcome, so an aborting caller can roll them
/// back) plus whether a dangerous cycle was found.
pub struct PhaseCResult {
    /// Edges provisionally added to the graph.
    pub added: Vec<(TxnId, TxnId, EdgeKind)>,
    /// `Err` if committing would close a dangerous cycle.
    pub outcome: Result<(), AbortReason>,
}

/// Phase C — dangerous-structure detection.
///
/// Provisionally adds the edges that committing `txn` would fix, then
/// checks whether doing so closes a cycle through `txn` with two
/// consecutive `RW` edges. The added edges are always returned so the
/// caller can roll them back if the transaction ultimately aborts, here
/// or in a later phase.
pub fn phase_c(
    sites: &SiteStore,
    table: &TransactionTable,
    graph: &mut DependencyGraph,
    txn_id: &TxnId,
    txn: &Transaction,
) -> PhaseCResult {
    let mut added = Vec::new();

    for &var in txn.write_buffer().keys() {
        for prior in table.committed_transactions() {
            if prior.id() == txn_id {
                continue;
            }
            if prior.write_buffer().contains_key(&var)
                && graph.add_edge(prior.id().clone(), txn_id.clone(), EdgeKind::Ww)
            {
                added.push((prior.id().clone(), txn_id.clone(), EdgeKind::Ww));
            }
        }
    }

    for (&var, record) in txn.read_set() {
        if &record.writer == txn_id {
            continue;
        }
        if version_has_been_superseded(sites, var, record.commit_time)
            && graph.add_edge(record.writer.clone(), txn_id.clone(), EdgeKind::Ww)
        {
            added.push((record.writer.clone(), txn_id.clone(), EdgeKind::Ww));
        }
    }

    let is_committed = |id: &TxnId| {
        table
            .get(id)
            .map(|t| matches!(t.status(), crate::transaction::TransactionStatus::Committed))
            .unwrap_or(false)
    };
    let outcome = if graph.has_dangerous_cycle_through(txn_id, is_committed) {
        Err(AbortReason::DangerousCycle)
    } else {
        Ok(())
    };
    PhaseCResult { added, outcome }
}

fn version_has_been_superseded(sites: &SiteStore, var: VarId, observed_commit_time: u64) -> bool {
    sites
        .sites_for(var)
        .into_iter()
        .any(|site| sites.newest_commit_after(site, var, observed_commit_time).is_some())
}

/// Roll back provisional edges added by a Phase C attempt that ultimately
/// aborted.
pub fn rollback(graph: &mut DependencyGraph, edges: &[(TxnId, TxnId, EdgeKind)]) {
    for (from, to, kind) in edges {
        graph.remove_edge(from, to, *kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use availdb_core::{SiteId, TxnId as Txn};

    fn var(n: u8) -> VarId {
        VarId::new(n).unwrap()
    }

    fn site(n: u8) -> SiteId {
        SiteId::new(n).unwrap()
    }

    #[test]
    fn phase_a_passes_when_no_site_failed_after_write() {
        let sites = SiteStore::new();
        let mut txn = Transaction::new(Txn::new("T1"), 0);
        txn.record_write(var(2), 5, vec![site(1)], 1);
        assert!(phase_a(&sites, &txn, 5).is_ok());
    }

    #[test]
    fn phase_a_fails_when_written_site_fails_afterward() {
        let mut sites = SiteStore::new();
        let mut txn = Transaction::new(Txn::new("T1"), 0);
        txn.record_write(var(2), 5, vec![site(1)], 1);
        sites.fail(site(1), 2);
        assert_eq!(
            phase_a(&sites, &txn, 5),
            Err(AbortReason::SiteFailedAfterWrite { site: 1 })
        );
    }

    #[test]
    fn phase_b_passes_with_no_intervening_commit() {
        let sites = SiteStore::new();
        let mut txn = Transaction::new(Txn::new("T1"), 0);
        txn.record_write(var(2), 5, vec![site(1)], 1);
        assert!(phase_b(&sites, &txn).is_ok());
    }

    #[test]
    fn phase_b_fails_on_intervening_commit_by_someone_else() {
        let mut sites = SiteStore::new();
        let targets = sites.up_sites_for(var(2));
        sites.write_committed(var(2), 999, 3, &Txn::new("T9"), &targets);
        let mut txn = Transaction::new(Txn::new("T1"), 0);
        txn.record_write(var(2), 5, vec![site(1)], 1);
        assert_eq!(phase_b(&sites, &txn), Err(AbortReason::WwConflict { var: 2 }));
    }
}
