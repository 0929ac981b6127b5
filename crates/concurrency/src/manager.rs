//! The transaction manager: the driver that ties the site store, the
//! transaction table, and the dependency graph together.
//!
//! `dispatch` is the single entry point (spec.md §9's "tagged variant,
//! not inheritance" design note): it ticks the logical clock once per
//! delivered command and routes to the handler below.

use tracing::{debug, info, warn};

use availdb_core::{AbortReason, AvailError, LogicalClock, SiteId, TxnId, VarId};
use availdb_sites::SiteStore;

use crate::command::Command;
use crate::output::Output;
use crate::table::{TransactionTable, WaitingOperation};
use crate::transaction::{ReadRecord, Transaction, TransactionStatus};
use crate::{graph, validation};

/// Owns every piece of mutable state in the system: the sites, the
/// transaction table (and waiting queue), the dependency graph, and the
/// logical clock. No locking — this is the single aggregate a
/// single-threaded event loop mutates one command at a time.
pub struct TransactionManager {
    sites: SiteStore,
    table: TransactionTable,
    graph: graph::DependencyGraph,
    clock: LogicalClock,
}

impl TransactionManager {
    /// A fresh manager with the initial ten-site cluster installed.
    pub fn new() -> Self {
        TransactionManager {
            sites: SiteStore::new(),
            table: TransactionTable::new(),
            graph: graph::DependencyGraph::new(),
            clock: LogicalClock::new(),
        }
    }

    /// Dispatch one command. Advances the logical clock by exactly one
    /// tick, then routes to the matching handler. Returns every output
    /// line produced — almost always one, except `recover`, which may
    /// also resume any number of queued reads.
    pub fn dispatch(&mut self, cmd: Command) -> Vec<Output> {
        let now = self.clock.tick();
        debug!(time = now, ?cmd, "dispatching command");
        match cmd {
            Command::Begin(id) => vec![self.begin(id, now)],
            Command::Read(txn, var) => vec![self.read(&txn, var, now)],
            Command::Write(txn, var, value) => vec![self.write(&txn, var, value, now)],
            Command::End(txn) => vec![self.end(&txn, now)],
            Command::Fail(site) => vec![self.fail(site, now)],
            Command::Recover(site) => self.recover(site, now),
            Command::Dump => vec![Output::Dump(self.sites.dump())],
        }
    }

    fn begin(&mut self, id: TxnId, now: u64) -> Output {
        match self.table.begin(id.clone(), now) {
            Ok(_) => {
                info!(txn = %id, start_time = now, "transaction began");
                Output::Ack
            }
            Err(e) => protocol_error(e),
        }
    }

    fn read(&mut self, txn_id: &TxnId, var: VarId, now: u64) -> Output {
        let Some(txn) = self.table.get(txn_id) else {
            return protocol_error(AvailError::UnknownTransaction(txn_id.to_string()));
        };
        if !txn.status().is_live() {
            return protocol_error(AvailError::TerminalTransaction(txn_id.to_string()));
        }

        if let Some(value) = txn.buffered_write(var) {
            return Output::Read { var, value };
        }
        if let Some(record) = txn.cached_read(var) {
            return Output::Read { var, value: record.value };
        }

        let start_time = txn.start_time();
        match self.sites.read_snapshot(var, start_time) {
            Some(candidate) => {
                let record = ReadRecord {
                    value: candidate.value,
                    source_site: candidate.source_site,
                    writer: candidate.writer.clone(),
                    commit_time: candidate.commit_time,
                };
                let txn = self.table.get_mut(txn_id).expect("looked up above");
                if txn.status() == TransactionStatus::Waiting {
                    txn.set_status(TransactionStatus::Active);
                }
                txn.record_read(var, record);
                self.add_rw_edges_for_stale_readers(txn_id, var);
                info!(txn = %txn_id, %var, value = candidate.value, site = %candidate.source_site, "read served");
                Output::Read { var, value: candidate.value }
            }
            None => {
                if self.variable_permanently_unreadable(var) {
                    let txn = self.table.get_mut(txn_id).expect("looked up above");
                    txn.abort(AbortReason::NoReadableCopy);
                    self.table.drop_waiting_for(txn_id);
                    warn!(txn = %txn_id, %var, "aborted: no readable copy");
                    Output::Aborted { txn: txn_id.clone(), reason: AbortReason::NoReadableCopy }
                } else {
                    let txn = self.table.get_mut(txn_id).expect("looked up above");
                    txn.set_status(TransactionStatus::Waiting);
                    self.table.enqueue_waiting(WaitingOperation { txn: txn_id.clone(), var });
                    debug!(txn = %txn_id, %var, time = now, "read queued");
                    Output::Waiting { txn: txn_id.clone(), var }
                }
            }
        }
    }

    /// The forced-abort condition of spec.md §4.2: `var` is *replicated*
    /// and every hosting site is currently down. A single-home variable
    /// whose home site is down always waits for recovery instead —
    /// there is no other copy to fall back to, but there's also no
    /// reason to give up, so the read just queues.
    fn variable_permanently_unreadable(&self, var: VarId) -> bool {
        var.is_replicated() && self.sites.up_sites_for(var).is_empty()
    }

    fn add_rw_edges_for_stale_readers(&mut self, reader: &TxnId, var: VarId) {
        let writers: Vec<TxnId> = self
            .table
            .live_transactions_except(reader)
            .filter(|u| u.buffered_write(var).is_some())
            .map(|u| u.id().clone())
            .collect();
        for writer in writers {
            self.graph.add_edge(reader.clone(), writer, graph::EdgeKind::Rw);
        }
    }

    fn write(&mut self, txn_id: &TxnId, var: VarId, value: i64, now: u64) -> Output {
        let Some(txn) = self.table.get(txn_id) else {
            return protocol_error(AvailError::UnknownTransaction(txn_id.to_string()));
        };
        if !txn.status().is_live() {
            return protocol_error(AvailError::TerminalTransaction(txn_id.to_string()));
        }

        let up_sites = self.sites.up_sites_for(var);
        if up_sites.is_empty() {
            let txn = self.table.get_mut(txn_id).expect("looked up above");
            txn.abort(AbortReason::NoUpSiteForWrite);
            self.table.drop_waiting_for(txn_id);
            warn!(txn = %txn_id, %var, "aborted: no up site for write");
            return Output::Aborted { txn: txn_id.clone(), reason: AbortReason::NoUpSiteForWrite };
        }

        let readers: Vec<TxnId> = self
            .table
            .live_transactions_except(txn_id)
            .filter(|u| u.cached_read(var).is_some())
            .map(|u| u.id().clone())
            .collect();
        for reader in readers {
            self.graph.add_edge(reader, txn_id.clone(), graph::EdgeKind::Rw);
        }

        let txn = self.table.get_mut(txn_id).expect("looked up above");
        txn.record_write(var, value, up_sites.clone(), now);
        info!(txn = %txn_id, %var, value, sites = ?up_sites, "write buffered");
        Output::Written { var, sites: up_sites }
    }

    fn end(&mut self, txn_id: &TxnId, now: u64) -> Output {
        let Some(txn) = self.table.get(txn_id) else {
            return protocol_error(AvailError::UnknownTransaction(txn_id.to_string()));
        };
        if !txn.status().is_live() {
            return protocol_error(AvailError::TerminalTransaction(txn_id.to_string()));
        }

        if let Err(reason) = validation::phase_a(&self.sites, txn, now) {
            return self.abort(txn_id, reason);
        }
        if let Err(reason) = validation::phase_b(&self.sites, txn) {
            return self.abort(txn_id, reason);
        }
        let phase_c = validation::phase_c(&self.sites, &self.table, &mut self.graph, txn_id, txn);
        if let Err(reason) = phase_c.outcome {
            validation::rollback(&mut self.graph, &phase_c.added);
            return self.abort(txn_id, reason);
        }

        let write_vars: Vec<VarId> = txn.write_buffer().keys().copied().collect();
        for var in write_vars {
            let value = *txn.write_buffer().get(&var).expect("key just listed");
            let up_now = self.sites.up_sites_for(var);
            let targets: Vec<SiteId> = txn
                .write_sites_for(var)
                .unwrap_or(&[])
                .iter()
                .copied()
                .filter(|s| up_now.contains(s))
                .collect();
            self.sites.write_committed(var, value, now, txn_id, &targets);
        }

        let txn = self.table.get_mut(txn_id).expect("looked up above");
        txn.commit();
        info!(txn = %txn_id, "committed");
        // phase_c.added edges are kept permanently; no rollback on commit.
        Output::Committed { txn: txn_id.clone() }
    }

    fn abort(&mut self, txn_id: &TxnId, reason: AbortReason) -> Output {
        let txn = self.table.get_mut(txn_id).expect("end() already confirmed this id exists");
        txn.abort(reason.clone());
        self.table.drop_waiting_for(txn_id);
        warn!(txn = %txn_id, reason = %reason, "aborted at commit");
        Output::Aborted { txn: txn_id.clone(), reason }
    }

    fn fail(&mut self, site: SiteId, now: u64) -> Output {
        self.sites.fail(site, now);
        info!(%site, time = now, "site failed");
        Output::Ack
    }

    fn recover(&mut self, site: SiteId, now: u64) -> Vec<Output> {
        self.sites.recover(site, now);
        info!(%site, time = now, "site recovered");

        let mut outputs = vec![Output::Ack];
        let pending = self.table.drain_waiting();
        for op in pending {
            match self.sites.read_snapshot(op.var, self.table.get(&op.txn).map(|t| t.start_time()).unwrap_or(now)) {
                Some(candidate) => {
                    let record = ReadRecord {
                        value: candidate.value,
                        source_site: candidate.source_site,
                        writer: candidate.writer.clone(),
                        commit_time: candidate.commit_time,
                    };
                    if let Some(txn) = self.table.get_mut(&op.txn) {
                        txn.set_status(TransactionStatus::Active);
                        txn.record_read(op.var, record);
                        info!(txn = %op.txn, var = %op.var, value = candidate.value, "waiting read resumed");
                        outputs.push(Output::Read { var: op.var, value: candidate.value });
                    }
                }
                None if self.variable_permanently_unreadable(op.var) => {
                    if let Some(txn) = self.table.get_mut(&op.txn) {
                        txn.abort(AbortReason::NoReadableCopy);
                        warn!(txn = %op.txn, var = %op.var, "aborted while waiting: no readable copy");
                        outputs.push(Output::Aborted { txn: op.txn.clone(), reason: AbortReason::NoReadableCopy });
                    }
                }
                None => {
                    self.table.enqueue_waiting(op);
                }
            }
        }
        outputs
    }

    /// A read-only snapshot of the ten sites, for tests and tooling.
    pub fn sites(&self) -> &SiteStore {
        &self.sites
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        TransactionManager::new()
    }
}

fn protocol_error(err: AvailError) -> Output {
    warn!(error = %err, "protocol error");
    Output::ProtocolError(err.to_string())
}
