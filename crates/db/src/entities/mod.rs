//! `SeaORM` entity definitions for the ledger tables.

#![allow(missing_docs)]

pub mod prelude;

pub mod contract_deliveries;
pub mod contracts;
pub mod deposit_liquidation_details;
pub mod deposit_liquidations;
pub mod deposits;
pub mod inventory_lots;
pub mod inventory_movements;
pub mod obligation_movements;
pub mod obligations;
pub mod purchases;
pub mod sale_commitments;
pub mod sale_liquidation_details;
pub mod sale_liquidations;
pub mod sea_orm_active_enums;
pub mod transfers;
