//! `SeaORM` entity prelude.

pub use super::contract_deliveries::Entity as ContractDeliveries;
pub use super::contracts::Entity as Contracts;
pub use super::deposit_liquidation_details::Entity as DepositLiquidationDetails;
pub use super::deposit_liquidations::Entity as DepositLiquidations;
pub use super::deposits::Entity as Deposits;
pub use super::inventory_lots::Entity as InventoryLots;
pub use super::inventory_movements::Entity as InventoryMovements;
pub use super::obligation_movements::Entity as ObligationMovements;
pub use super::obligations::Entity as Obligations;
pub use super::purchases::Entity as Purchases;
pub use super::sale_commitments::Entity as SaleCommitments;
pub use super::sale_liquidation_details::Entity as SaleLiquidationDetails;
pub use super::sale_liquidations::Entity as SaleLiquidations;
pub use super::transfers::Entity as Transfers;
