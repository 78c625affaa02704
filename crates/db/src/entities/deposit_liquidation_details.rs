//! `SeaORM` Entity for deposit_liquidation_details table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "deposit_liquidation_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub liquidation_id: Uuid,
    pub deposit_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub unit_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount: Decimal,
    pub voided: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::deposit_liquidations::Entity",
        from = "Column::LiquidationId",
        to = "super::deposit_liquidations::Column::Id"
    )]
    DepositLiquidations,
    #[sea_orm(
        belongs_to = "super::deposits::Entity",
        from = "Column::DepositId",
        to = "super::deposits::Column::Id"
    )]
    Deposits,
}

impl Related<super::deposit_liquidations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DepositLiquidations.def()
    }
}

impl Related<super::deposits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deposits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
