//! Physical stock: lots, the inventory journal and pool withdrawals.

pub mod pool;
pub mod types;

pub use pool::{PlannedStockMovement, StockPool, TransferPlan, plan_adjustment, plan_transfer};
pub use types::{Direction, Lot, StockMovement};
