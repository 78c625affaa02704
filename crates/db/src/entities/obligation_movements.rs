//! `SeaORM` Entity for obligation_movements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ObligationMovementKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "obligation_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub obligation_id: Uuid,
    pub kind: ObligationMovementKind,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount: Decimal,
    /// Movement cancelled by a `VOID` row.
    pub voids: Option<Uuid>,
    pub note: Option<String>,
    pub occurred_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::obligations::Entity",
        from = "Column::ObligationId",
        to = "super::obligations::Column::Id"
    )]
    Obligations,
}

impl Related<super::obligations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Obligations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
