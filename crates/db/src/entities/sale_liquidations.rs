//! `SeaORM` Entity for sale_liquidations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sale_liquidations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub product_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount: Decimal,
    pub description: Option<String>,
    pub voided: bool,
    pub liquidated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sale_liquidation_details::Entity")]
    SaleLiquidationDetails,
}

impl Related<super::sale_liquidation_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleLiquidationDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
