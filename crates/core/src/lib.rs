//! Allocation engine for Beneficio.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage loads history into the snapshot types defined here, the engine
//! derives pending balances and returns a plan, and storage writes the plan
//! inside one transaction.
//!
//! # Modules
//!
//! - `allocation` - Shared FIFO allocator over ordered buckets
//! - `obligation` - Loan and cash-advance balances, payments and charges
//! - `inventory` - Stock lots, pool withdrawals, transfers and adjustments
//! - `settlement` - Quantity settlement shared by deposit and sale liquidation
//! - `deposit` - Deposit liquidation
//! - `sale` - Sale commitment liquidation
//! - `contract` - Contract fulfillment tracking
//! - `reversal` - Void planning and dependency checks

pub mod allocation;
pub mod contract;
pub mod deposit;
pub mod error;
pub mod inventory;
pub mod obligation;
pub mod reference;
pub mod reversal;
pub mod sale;
pub mod settlement;
pub mod status;

pub use allocation::{Allocation, AllocationError, Bucket, OrderedBuckets};
pub use error::EngineError;
pub use reference::{Reference, ReferenceKind};
pub use reversal::VoidOutcome;
pub use status::DocumentStatus;
