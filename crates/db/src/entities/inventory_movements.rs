//! `SeaORM` Entity for inventory_movements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::StockDirection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub lot_id: Uuid,
    pub product_id: Uuid,
    pub direction: StockDirection,
    /// Signed: positive adds stock.
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub quantity: Decimal,
    pub reference_type: String,
    pub reference_id: Uuid,
    pub note: Option<String>,
    pub voided: bool,
    pub reverses: Option<Uuid>,
    pub occurred_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_lots::Entity",
        from = "Column::LotId",
        to = "super::inventory_lots::Column::Id"
    )]
    InventoryLots,
}

impl Related<super::inventory_lots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryLots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
