//! The ten-site cluster: placement, reads, writes, failure/recovery, dump.

use std::collections::BTreeMap;

use availdb_core::{variable, SiteId, TxnId, VarId};

use crate::site::Site;

/// A read candidate returned by [`SiteStore::read_snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadCandidate {
    /// The value as of the transaction's snapshot.
    pub value: i64,
    /// The site that served the read.
    pub source_site: SiteId,
    /// The transaction that committed the version read.
    pub writer: TxnId,
    /// The logical time the version read was committed.
    pub commit_time: u64,
}

/// One site's state as reported by [`SiteStore::dump`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteDump {
    /// Whether the site is currently up.
    pub up: bool,
    /// The latest committed value of every variable this site hosts.
    pub values: BTreeMap<VarId, i64>,
}

/// The fixed ten-site cluster holding all variable version chains.
#[derive(Debug, Clone)]
pub struct SiteStore {
    sites: Vec<Site>,
}

impl SiteStore {
    /// Build a store with every site's initial versions installed.
    pub fn new() -> Self {
        let mut hosted_by_site: Vec<Vec<VarId>> = vec![Vec::new(); SiteId::COUNT as usize];
        for var in VarId::all() {
            for site in variable::sites_for(var) {
                hosted_by_site[(site.get() - 1) as usize].push(var);
            }
        }
        let sites = SiteId::all()
            .map(|id| Site::new(id, &hosted_by_site[(id.get() - 1) as usize]))
            .collect();
        SiteStore { sites }
    }

    fn site(&self, id: SiteId) -> &Site {
        &self.sites[(id.get() - 1) as usize]
    }

    fn site_mut(&mut self, id: SiteId) -> &mut Site {
        &mut self.sites[(id.get() - 1) as usize]
    }

    /// The sites that host `var`.
    pub fn sites_for(&self, var: VarId) -> Vec<SiteId> {
        variable::sites_for(var)
    }

    /// The sites hosting `var` that are currently up.
    pub fn up_sites_for(&self, var: VarId) -> Vec<SiteId> {
        variable::sites_for(var)
            .into_iter()
            .filter(|&id| self.site(id).is_up())
            .collect()
    }

    /// Fail the given site at logical time `t`.
    pub fn fail(&mut self, site: SiteId, t: u64) {
        self.site_mut(site).fail(t);
    }

    /// Recover the given site at logical time `t`.
    pub fn recover(&mut self, site: SiteId, t: u64) {
        self.site_mut(site).recover(t);
    }

    /// Whether `site` is currently up.
    pub fn is_up(&self, site: SiteId) -> bool {
        self.site(site).is_up()
    }

    /// Whether `site` was continuously up over `(a, b]`.
    pub fn continuously_up_over(&self, site: SiteId, a: u64, b: u64) -> bool {
        self.site(site).continuously_up_over(a, b)
    }

    /// Find a readable snapshot of `var` as of `txn_start`.
    ///
    /// Iterates the hosting sites in ascending id order and returns the
    /// first one that is currently eligible to serve as a snapshot source
    /// and was up continuously from the chosen version's commit time
    /// through `txn_start` (spec.md §4.1).
    pub fn read_snapshot(&self, var: VarId, txn_start: u64) -> Option<ReadCandidate> {
        for id in variable::sites_for(var) {
            let site = self.site(id);
            if !site.eligible_as_snapshot_source(var) {
                continue;
            }
            let Some(version) = site.version_as_of(var, txn_start) else {
                continue;
            };
            if site.continuously_up_over(version.commit_time, txn_start) {
                return Some(ReadCandidate {
                    value: version.value,
                    source_site: id,
                    writer: version.writer.clone(),
                    commit_time: version.commit_time,
                });
            }
        }
        None
    }

    /// The latest committed version of `var` at `site` as of `txn_start`,
    /// without any up/readability filtering — used by commit validation,
    /// which reasons about version chains directly rather than about
    /// read eligibility.
    pub fn version_as_of(&self, site: SiteId, var: VarId, at: u64) -> Option<i64> {
        self.site(site).version_as_of(var, at).map(|v| v.value)
    }

    /// The commit time of the newest version of `var` at `site`, if any
    /// version exists with `commit_time > after`.
    pub fn newest_commit_after(&self, site: SiteId, var: VarId, after: u64) -> Option<(u64, TxnId)> {
        let latest = self.site(site).latest_version(var);
        if latest.commit_time > after {
            Some((latest.commit_time, latest.writer.clone()))
        } else {
            None
        }
    }

    /// Install a newly committed version of `var` at every site in
    /// `targets`.
    pub fn write_committed(&mut self, var: VarId, value: i64, commit_time: u64, writer: &TxnId, targets: &[SiteId]) {
        for &id in targets {
            self.site_mut(id)
                .append_version(var, value, commit_time, writer.clone());
        }
    }

    /// A snapshot of every site's up/down state and latest committed
    /// values, for the `dump` command. Down sites are included; `dump`
    /// reports the latest committed version regardless of reachability.
    pub fn dump(&self) -> BTreeMap<SiteId, SiteDump> {
        self.sites
            .iter()
            .map(|site| {
                let values = site
                    .hosted_variables()
                    .into_iter()
                    .map(|var| (var, site.latest_version(var).value))
                    .collect();
                (site.id(), SiteDump { up: site.is_up(), values })
            })
            .collect()
    }
}

impl Default for SiteStore {
    fn default() -> Self {
        SiteStore::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(n: u8) -> VarId {
        VarId::new(n).unwrap()
    }

    fn site(n: u8) -> SiteId {
        SiteId::new(n).unwrap()
    }

    #[test]
    fn new_store_reads_initial_values() {
        let store = SiteStore::new();
        let read = store.read_snapshot(var(3), 0).unwrap();
        assert_eq!(read.value, 30);
        assert_eq!(read.source_site, site(4));
    }

    #[test]
    fn replicated_variable_readable_from_any_site() {
        let store = SiteStore::new();
        let read = store.read_snapshot(var(2), 0).unwrap();
        assert_eq!(read.value, 20);
        assert_eq!(read.source_site, site(1));
    }

    #[test]
    fn failed_single_home_site_makes_variable_unreadable() {
        let mut store = SiteStore::new();
        store.fail(site(4), 1);
        assert!(store.read_snapshot(var(3), 5).is_none());
    }

    #[test]
    fn replicated_variable_falls_back_to_next_up_site() {
        let mut store = SiteStore::new();
        store.fail(site(1), 1);
        let read = store.read_snapshot(var(2), 5).unwrap();
        assert_eq!(read.source_site, site(2));
    }

    #[test]
    fn recovered_replicated_site_unreadable_until_fresh_commit() {
        let mut store = SiteStore::new();
        store.fail(site(1), 1);
        store.recover(site(1), 4);
        // site 1 is up but not yet readable for x2 (replicated)
        let read = store.read_snapshot(var(2), 5).unwrap();
        assert_eq!(read.source_site, site(2));
        store.write_committed(var(2), 99, 6, &TxnId::new("T9"), &[site(1)]);
        let read2 = store.read_snapshot(var(2), 7).unwrap();
        assert_eq!(read2.source_site, site(1));
        assert_eq!(read2.value, 99);
    }

    #[test]
    fn dump_reports_down_sites_and_latest_values() {
        let mut store = SiteStore::new();
        store.fail(site(4), 1);
        let dump = store.dump();
        let d4 = &dump[&site(4)];
        assert!(!d4.up);
        assert_eq!(d4.values[&var(3)], 30);
    }
}
