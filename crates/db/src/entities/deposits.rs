//! `SeaORM` Entity for deposits table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::DocumentStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "deposits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub producer_id: Uuid,
    pub product_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub quantity: Decimal,
    pub status: DocumentStatus,
    pub note: Option<String>,
    pub deposited_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::deposit_liquidation_details::Entity")]
    DepositLiquidationDetails,
}

impl Related<super::deposit_liquidation_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DepositLiquidationDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
