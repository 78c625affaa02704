//! Inventory journal writes shared by every posting that moves stock.
//!
//! Each lot change is paired with exactly one `inventory_movements` row
//! tagged with the posting's reference.

use std::collections::HashMap;

use beneficio_core::inventory::{Direction, Lot, PlannedStockMovement, StockMovement};
use beneficio_core::reversal::plan_stock_reversal;
use beneficio_core::Reference;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{inventory_lots, inventory_movements};

use super::convert::{self, stamp};
use super::error::StoreResult;
use super::lock::for_update;

/// Reference, timestamp and note stamped on every journal row of a posting.
#[derive(Debug, Clone)]
pub(crate) struct Posting {
    pub reference: Reference,
    pub at: DateTime<Utc>,
    pub note: Option<String>,
}

impl Posting {
    pub(crate) fn new(reference: Reference, at: DateTime<Utc>, note: Option<String>) -> Self {
        Self {
            reference,
            at,
            note,
        }
    }
}

/// Loads every lot of `product_id`, oldest first.
pub(crate) async fn product_lots(
    txn: &DatabaseTransaction,
    product_id: Uuid,
    row_locking: bool,
) -> Result<Vec<Lot>, DbErr> {
    let select = inventory_lots::Entity::find()
        .filter(inventory_lots::Column::ProductId.eq(product_id))
        .order_by_asc(inventory_lots::Column::OpenedAt)
        .order_by_asc(inventory_lots::Column::Id);
    let rows = for_update(select, txn, row_locking).all(txn).await?;
    Ok(rows.iter().map(convert::lot).collect())
}

/// Opens a new lot holding `quantity` and records the inbound movement.
pub(crate) async fn open_lot(
    txn: &DatabaseTransaction,
    product_id: Uuid,
    owner_id: Option<Uuid>,
    quantity: Decimal,
    posting: &Posting,
) -> Result<inventory_lots::Model, DbErr> {
    let lot = inventory_lots::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        owner_id: Set(owner_id),
        quantity_on_hand: Set(quantity),
        opened_at: Set(stamp(posting.at)),
    }
    .insert(txn)
    .await?;

    insert_movement(txn, &lot, Direction::In, quantity, posting, None).await?;
    Ok(lot)
}

/// Applies planned draws: each lot is set to its planned on-hand and gets one
/// movement row.
pub(crate) async fn apply_draws(
    txn: &DatabaseTransaction,
    draws: &[PlannedStockMovement],
    posting: &Posting,
) -> Result<(), DbErr> {
    for draw in draws {
        let lot = set_on_hand(txn, draw.lot_id, draw.on_hand_after).await?;
        insert_movement(txn, &lot, draw.direction, draw.quantity, posting, None).await?;
    }
    Ok(())
}

/// Voids every live journal row of `posting.reference`.
///
/// Writes one `VOID` row per original, flags the original and restores the
/// lot. Returns the number of rows compensated; zero when the reference was
/// already reversed or never moved stock.
pub(crate) async fn reverse(
    txn: &DatabaseTransaction,
    posting: &Posting,
    row_locking: bool,
) -> StoreResult<usize> {
    let reference = posting.reference;
    let originals = inventory_movements::Entity::find()
        .filter(inventory_movements::Column::ReferenceType.eq(reference.kind.as_str()))
        .filter(inventory_movements::Column::ReferenceId.eq(reference.id))
        .all(txn)
        .await?;
    if originals.iter().all(|m| m.voided || m.reverses.is_some()) {
        return Ok(0);
    }

    let mut lot_ids: Vec<Uuid> = originals.iter().map(|m| m.lot_id).collect();
    lot_ids.sort();
    lot_ids.dedup();

    let lot_select =
        inventory_lots::Entity::find().filter(inventory_lots::Column::Id.is_in(lot_ids.clone()));
    let lots: Vec<Lot> = for_update(lot_select, txn, row_locking)
        .all(txn)
        .await?
        .iter()
        .map(convert::lot)
        .collect();

    let journal = inventory_movements::Entity::find()
        .filter(inventory_movements::Column::LotId.is_in(lot_ids))
        .order_by_asc(inventory_movements::Column::OccurredAt)
        .order_by_asc(inventory_movements::Column::Id)
        .all(txn)
        .await?
        .iter()
        .map(convert::stock_movement)
        .collect::<Result<Vec<StockMovement>, _>>()?;

    let compensations = plan_stock_reversal(reference, &journal, &lots)?;
    let by_id: HashMap<Uuid, &inventory_movements::Model> =
        originals.iter().map(|m| (m.id, m)).collect();

    for compensation in &compensations {
        let lot = set_on_hand(txn, compensation.lot_id, compensation.on_hand_after).await?;
        insert_movement(
            txn,
            &lot,
            Direction::Void,
            compensation.quantity,
            posting,
            Some(compensation.original_id),
        )
        .await?;

        if let Some(original) = by_id.get(&compensation.original_id) {
            let mut active: inventory_movements::ActiveModel = (*original).clone().into();
            active.voided = Set(true);
            active.update(txn).await?;
        }
    }

    Ok(compensations.len())
}

async fn set_on_hand(
    txn: &DatabaseTransaction,
    lot_id: Uuid,
    on_hand: Decimal,
) -> Result<inventory_lots::Model, DbErr> {
    inventory_lots::ActiveModel {
        id: Set(lot_id),
        quantity_on_hand: Set(on_hand),
        ..Default::default()
    }
    .update(txn)
    .await
}

async fn insert_movement(
    txn: &DatabaseTransaction,
    lot: &inventory_lots::Model,
    direction: Direction,
    quantity: Decimal,
    posting: &Posting,
    reverses: Option<Uuid>,
) -> Result<inventory_movements::Model, DbErr> {
    inventory_movements::ActiveModel {
        id: Set(Uuid::new_v4()),
        lot_id: Set(lot.id),
        product_id: Set(lot.product_id),
        direction: Set(direction.into()),
        quantity: Set(quantity),
        reference_type: Set(posting.reference.kind.as_str().to_string()),
        reference_id: Set(posting.reference.id),
        note: Set(posting.note.clone()),
        voided: Set(false),
        reverses: Set(reverses),
        occurred_at: Set(stamp(posting.at)),
    }
    .insert(txn)
    .await
}
