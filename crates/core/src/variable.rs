//! Variable placement policy and initial values.
//!
//! Pure functions only — no mutable state. Shared by `availdb-sites` (which
//! needs to know which sites host a variable) and `availdb-concurrency`
//! (which needs the same answer for Phase A/B validation).

use crate::ids::{SiteId, VarId};

/// Initial committed value of a variable: `10 * index`.
pub fn initial_value(var: VarId) -> i64 {
    10 * var.get() as i64
}

/// The sites that host `var`.
///
/// Even indices are replicated on all ten sites; odd indices are
/// single-homed at site `1 + (index mod 10)`.
pub fn sites_for(var: VarId) -> Vec<SiteId> {
    if var.is_replicated() {
        SiteId::all().collect()
    } else {
        vec![home_site(var)]
    }
}

/// The single home site of an odd (single-home) variable.
///
/// # Panics
///
/// Panics if `var` is replicated; callers should check
/// [`VarId::is_replicated`] first, or just use [`sites_for`].
pub fn home_site(var: VarId) -> SiteId {
    assert!(!var.is_replicated(), "x{} is replicated, has no single home", var.get());
    let site_number = 1 + (var.get() % 10);
    SiteId::new(site_number).expect("placement formula always yields 1..=10")
}
