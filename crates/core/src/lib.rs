//! Core types shared by the site store and the transaction manager.
//!
//! This crate defines the foundational, allocation-light types used
//! throughout the system:
//! - [`ids`]: `SiteId`, `VarId`, `TxnId` newtypes.
//! - [`variable`]: placement policy (which sites host a variable) and
//!   initial values.
//! - [`clock`]: the logical clock.
//! - [`error`]: the abort-reason and protocol-error taxonomies.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod error;
pub mod ids;
pub mod variable;

pub use clock::LogicalClock;
pub use error::{AbortReason, AvailError, Result};
pub use ids::{SiteId, TxnId, VarId};
