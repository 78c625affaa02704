//! `SeaORM` Entity for contracts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{ContractDirection, DocumentStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "contracts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub direction: ContractDirection,
    pub counterparty_id: Uuid,
    pub product_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub unit_price: Decimal,
    pub status: DocumentStatus,
    pub note: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::contract_deliveries::Entity")]
    ContractDeliveries,
}

impl Related<super::contract_deliveries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContractDeliveries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
