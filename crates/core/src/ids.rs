//! Identifier newtypes for sites, variables, and transactions.
//!
//! Keeping these as distinct types (rather than bare `u8`/`String`) means a
//! site id can never be passed where a variable index was expected — the
//! kind of mixup that is easy to make once both are "just numbers 1..20".

use crate::error::AvailError;
use std::fmt;

/// A site in the fixed ten-site cluster, `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SiteId(u8);

impl SiteId {
    /// Total number of sites in the cluster.
    pub const COUNT: u8 = 10;

    /// Construct a `SiteId`, rejecting anything outside `1..=10`.
    pub fn new(n: u8) -> Result<Self, AvailError> {
        if (1..=Self::COUNT).contains(&n) {
            Ok(SiteId(n))
        } else {
            Err(AvailError::UnknownSite(n.to_string()))
        }
    }

    /// The raw site number.
    pub fn get(self) -> u8 {
        self.0
    }

    /// All ten site ids in ascending order.
    pub fn all() -> impl Iterator<Item = SiteId> {
        (1..=Self::COUNT).map(SiteId)
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A logical variable index, `1..=20`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(u8);

impl VarId {
    /// Total number of variables.
    pub const COUNT: u8 = 20;

    /// Construct a `VarId`, rejecting anything outside `1..=20`.
    pub fn new(n: u8) -> Result<Self, AvailError> {
        if (1..=Self::COUNT).contains(&n) {
            Ok(VarId(n))
        } else {
            Err(AvailError::UnknownVariable(format!("x{n}")))
        }
    }

    /// Parse a `x{1..20}` token, e.g. `"x7"`.
    pub fn parse(token: &str) -> Result<Self, AvailError> {
        let digits = token
            .strip_prefix('x')
            .ok_or_else(|| AvailError::UnknownVariable(token.to_string()))?;
        let n: u8 = digits
            .parse()
            .map_err(|_| AvailError::UnknownVariable(token.to_string()))?;
        Self::new(n)
    }

    /// The raw variable index.
    pub fn get(self) -> u8 {
        self.0
    }

    /// All twenty variable ids in ascending order.
    pub fn all() -> impl Iterator<Item = VarId> {
        (1..=Self::COUNT).map(VarId)
    }

    /// `true` for even indices (replicated on every site).
    pub fn is_replicated(self) -> bool {
        self.0 % 2 == 0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// A transaction identifier, e.g. `T3`.
///
/// Kept as opaque text (rather than parsed to an integer) so the id the
/// user typed round-trips exactly into output and log lines.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxnId(String);

impl TxnId {
    /// Wrap an already-tokenized transaction id.
    pub fn new(text: impl Into<String>) -> Self {
        TxnId(text.into())
    }

    /// The transaction id's text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TxnId {
    fn from(s: &str) -> Self {
        TxnId::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_id_rejects_out_of_range() {
        assert!(SiteId::new(0).is_err());
        assert!(SiteId::new(11).is_err());
        assert!(SiteId::new(1).is_ok());
        assert!(SiteId::new(10).is_ok());
    }

    #[test]
    fn var_id_parses_token() {
        assert_eq!(VarId::parse("x7").unwrap().get(), 7);
        assert!(VarId::parse("x21").is_err());
        assert!(VarId::parse("y3").is_err());
        assert!(VarId::parse("x0").is_err());
    }

    #[test]
    fn var_id_replication_parity() {
        assert!(VarId::new(2).unwrap().is_replicated());
        assert!(!VarId::new(1).unwrap().is_replicated());
    }

    #[test]
    fn txn_id_round_trips_text() {
        let id = TxnId::new("T07");
        assert_eq!(id.as_str(), "T07");
        assert_eq!(id.to_string(), "T07");
    }

    #[test]
    fn site_id_all_yields_ten_in_order() {
        let ids: Vec<u8> = SiteId::all().map(SiteId::get).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
    }
}
