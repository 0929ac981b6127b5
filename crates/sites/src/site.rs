//! A single site: its failure history plus the version chains it hosts.

use std::collections::HashMap;

use availdb_core::{SiteId, TxnId, VarId};

use crate::history::FailureHistory;
use crate::version::VariableVersion;

/// One site in the ten-site cluster.
///
/// A site only holds version chains for the variables it hosts
/// (`availdb_core::variable::sites_for`); reading or writing a variable the
/// site doesn't host is a caller bug, not a runtime case, so the lookups
/// here panic rather than return `Option` for missing variables.
#[derive(Debug, Clone)]
pub struct Site {
    id: SiteId,
    history: FailureHistory,
    versions: HashMap<VarId, Vec<VariableVersion>>,
    /// For replicated variables only: whether this site may serve the
    /// variable as a read snapshot source. Cleared on failure, set again
    /// the next time a commit installs a fresh version here. Single-home
    /// variables ignore this flag entirely (spec.md §4.1).
    readable: HashMap<VarId, bool>,
}

impl Site {
    /// Build a site with its initial committed versions already installed
    /// for every variable it hosts.
    pub fn new(id: SiteId, hosted: &[VarId]) -> Self {
        let mut versions = HashMap::new();
        let mut readable = HashMap::new();
        for &var in hosted {
            versions.insert(
                var,
                vec![VariableVersion::initial(availdb_core::variable::initial_value(var))],
            );
            if var.is_replicated() {
                readable.insert(var, true);
            }
        }
        Site {
            id,
            history: FailureHistory::new(),
            versions,
            readable,
        }
    }

    /// This site's id.
    pub fn id(&self) -> SiteId {
        self.id
    }

    /// Whether this site is up right now.
    pub fn is_up(&self) -> bool {
        self.history.is_up()
    }

    /// Whether this site hosts `var` at all.
    pub fn hosts(&self, var: VarId) -> bool {
        self.versions.contains_key(&var)
    }

    /// Whether `var` was up continuously over `(a, b]` at this site.
    pub fn continuously_up_over(&self, a: u64, b: u64) -> bool {
        self.history.continuously_up_over(a, b)
    }

    /// Mark the site as failed at time `t`. No-op if already down.
    ///
    /// Replicated variables hosted here become unreadable as new snapshot
    /// sources until a fresh commit lands after recovery.
    pub fn fail(&mut self, t: u64) {
        if !self.history.is_up() {
            return;
        }
        self.history.fail(t);
        for flag in self.readable.values_mut() {
            *flag = false;
        }
    }

    /// Mark the site as recovered at time `t`. No-op if already up.
    pub fn recover(&mut self, t: u64) {
        self.history.recover(t);
    }

    /// Whether this site may currently serve `var` as a read snapshot
    /// source: it must be up, and if `var` is replicated, it must also
    /// hold a post-recovery commit.
    pub fn eligible_as_snapshot_source(&self, var: VarId) -> bool {
        if !self.is_up() {
            return false;
        }
        match self.readable.get(&var) {
            Some(flag) => *flag,
            None => true, // single-home variable: no gating
        }
    }

    /// The most recent committed version of `var` with `commit_time <= at`.
    pub fn version_as_of(&self, var: VarId, at: u64) -> Option<&VariableVersion> {
        self.versions
            .get(&var)
            .expect("site does not host this variable")
            .iter()
            .rev()
            .find(|v| v.commit_time <= at)
    }

    /// The most recently committed version of `var`, regardless of `at`
    /// (used by `dump`, which ignores up/down state entirely).
    pub fn latest_version(&self, var: VarId) -> &VariableVersion {
        self.versions
            .get(&var)
            .expect("site does not host this variable")
            .last()
            .expect("every hosted variable always has at least its initial version")
    }

    /// Append a newly committed version. `commit_time` must exceed every
    /// prior commit time in this variable's chain at this site.
    pub fn append_version(&mut self, var: VarId, value: i64, commit_time: u64, writer: TxnId) {
        let chain = self
            .versions
            .get_mut(&var)
            .expect("site does not host this variable");
        debug_assert!(
            chain.last().map(|v| v.commit_time) < Some(commit_time),
            "version chains are strictly increasing in commit_time"
        );
        chain.push(VariableVersion::new(value, commit_time, writer));
        if var.is_replicated() {
            self.readable.insert(var, true);
        }
    }

    /// The variables this site hosts, in ascending order.
    pub fn hosted_variables(&self) -> Vec<VarId> {
        let mut vars: Vec<VarId> = self.versions.keys().copied().collect();
        vars.sort();
        vars
    }
}
