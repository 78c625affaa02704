//! Producer deposits and their liquidation.
//!
//! A deposit is coffee left in custody. Liquidation converts part or all of
//! a producer's open deposits of one product into a priced settlement.

pub mod liquidation;
pub mod types;

pub use liquidation::{deposit_position, plan_liquidation};
pub use types::{Deposit, LiquidationDetail};
