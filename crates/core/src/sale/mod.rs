//! Sale commitments and their liquidation.
//!
//! Mirrors deposit liquidation on the buyer side. Commitments are not stock
//! reservations; physical stock leaves the warehouse at liquidation time and
//! is re-validated then.

pub mod liquidation;
pub mod types;

pub use liquidation::{SaleLiquidationPlan, commitment_position, plan_liquidation};
pub use types::SaleCommitment;
