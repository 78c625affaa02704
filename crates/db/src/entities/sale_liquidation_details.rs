//! `SeaORM` Entity for sale_liquidation_details table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sale_liquidation_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub liquidation_id: Uuid,
    pub commitment_id: Uuid,
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
        belongs_to = "super::sale_liquidations::Entity",
        from = "Column::LiquidationId",
        to = "super::sale_liquidations::Column::Id"
    )]
    SaleLiquidations,
    #[sea_orm(
        belongs_to = "super::sale_commitments::Entity",
        from = "Column::CommitmentId",
        to = "super::sale_commitments::Column::Id"
    )]
    SaleCommitments,
}

impl Related<super::sale_liquidations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleLiquidations.def()
    }
}

impl Related<super::sale_commitments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleCommitments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
