//! `SeaORM` Entity for obligations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{ObligationKind, ObligationStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "obligations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub producer_id: Uuid,
    pub kind: ObligationKind,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub principal: Decimal,
    pub status: ObligationStatus,
    pub note: Option<String>,
    pub opened_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::obligation_movements::Entity")]
    ObligationMovements,
}

impl Related<super::obligation_movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ObligationMovements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
