//! Incoming and outgoing contracts and their fulfillment.

pub mod tracker;
pub mod types;

pub use tracker::{DeliveryPlan, StockEffect, plan_contract_void, plan_delivery};
pub use types::{Contract, ContractDirection, ContractPosition, Delivery};
