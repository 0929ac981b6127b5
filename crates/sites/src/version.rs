//! An immutable committed version of a variable.

use availdb_core::TxnId;

/// One committed version of a variable at a site.
///
/// Versions are append-only and strictly increasing in `commit_time` within
/// a single site's chain for a given variable (spec.md §3 invariants).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableVersion {
    /// The committed value.
    pub value: i64,
    /// Logical time at which this version was committed.
    pub commit_time: u64,
    /// Transaction that wrote this version.
    pub writer: TxnId,
}

impl VariableVersion {
    /// Construct a version.
    pub fn new(value: i64, commit_time: u64, writer: TxnId) -> Self {
        VariableVersion {
            value,
            commit_time,
            writer,
        }
    }

    /// The synthetic initial version installed at time 0.
    pub fn initial(value: i64) -> Self {
        VariableVersion::new(value, 0, TxnId::new("T0"))
    }
}
