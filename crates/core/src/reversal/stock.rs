//! Inventory compensation for a voided reference.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use beneficio_shared::money;

use crate::error::EngineError;
use crate::inventory::{Lot, StockMovement};
use crate::reference::Reference;

use super::ensure_no_dependents;

/// A compensating journal row and the lot change it implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Compensation {
    /// Movement being voided.
    pub original_id: Uuid,
    /// Lot to restore.
    pub lot_id: Uuid,
    /// Signed quantity, the inverse of the original.
    pub quantity: Decimal,
    /// Lot on-hand after the compensation.
    pub on_hand_after: Decimal,
}

/// Plans the compensating rows for every live movement of `reference`.
///
/// `journal` must contain every movement on the lots those movements touched,
/// and `lots` their current state. An inbound movement whose lot has since
/// been drawn by another reference blocks the void; outflows dated before the
/// inbound row do not. Same-instant outflows count as later.
///
/// Returns an empty list when the reference has no live movements.
///
/// # Errors
///
/// - `HasDependentMovements` naming the references that drew on the stock.
/// - `InsufficientInventory` if a compensation would leave a lot negative.
/// - `Internal` if a movement's lot is missing from `lots`.
pub fn plan_stock_reversal(
    reference: Reference,
    journal: &[StockMovement],
    lots: &[Lot],
) -> Result<Vec<Compensation>, EngineError> {
    let originals: Vec<&StockMovement> = journal
        .iter()
        .filter(|m| m.reference == reference && m.is_live())
        .collect();

    let dependents: Vec<Reference> = originals
        .iter()
        .filter(|m| !m.is_outflow())
        .flat_map(|inbound| {
            journal.iter().filter(move |m| {
                m.lot_id == inbound.lot_id
                    && m.is_live()
                    && m.is_outflow()
                    && m.reference != reference
                    && m.at >= inbound.at
            })
        })
        .map(|m| m.reference)
        .collect();
    ensure_no_dependents(reference, dependents)?;

    let mut on_hand: HashMap<Uuid, (Uuid, Decimal)> = lots
        .iter()
        .map(|lot| (lot.id, (lot.product_id, lot.on_hand)))
        .collect();

    let mut compensations = Vec::with_capacity(originals.len());
    for original in originals {
        let (product_id, current) = on_hand.get_mut(&original.lot_id).ok_or_else(|| {
            EngineError::Internal(format!("lot {} not loaded for reversal", original.lot_id))
        })?;
        let quantity = -original.quantity;
        let after = money::add(*current, quantity);
        if after < Decimal::ZERO {
            return Err(EngineError::InsufficientInventory {
                product_id: *product_id,
                requested: original.quantity,
                available: *current,
            });
        }
        *current = after;
        compensations.push(Compensation {
            original_id: original.id,
            lot_id: original.lot_id,
            quantity,
            on_hand_after: after,
        });
    }

    Ok(compensations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::Direction;
    use crate::reference::ReferenceKind;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn t(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    fn lot(product: Uuid, on_hand: Decimal) -> Lot {
        Lot {
            id: Uuid::new_v4(),
            product_id: product,
            owner_id: None,
            on_hand,
            opened_at: t(0),
        }
    }

    fn movement(lot: &Lot, direction: Direction, quantity: Decimal, reference: Reference, hour: i64) -> StockMovement {
        StockMovement {
            id: Uuid::new_v4(),
            lot_id: lot.id,
            direction,
            quantity,
            reference,
            at: t(hour),
            voided: false,
            reverses: None,
        }
    }

    #[test]
    fn test_purchase_void_restores_pre_purchase_stock() {
        let product = Uuid::new_v4();
        let purchase = Reference::new(ReferenceKind::Purchase, Uuid::new_v4());
        let lot = lot(product, dec!(50.00));
        let journal = vec![movement(&lot, Direction::In, dec!(50.00), purchase, 1)];

        let plan = plan_stock_reversal(purchase, &journal, &[lot.clone()]).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].quantity, dec!(-50.00));
        assert_eq!(plan[0].on_hand_after, dec!(0));
    }

    #[test]
    fn test_consumed_inbound_is_blocked() {
        let product = Uuid::new_v4();
        let purchase = Reference::new(ReferenceKind::Purchase, Uuid::new_v4());
        let sale = Reference::new(ReferenceKind::SaleLiquidation, Uuid::new_v4());
        let lot = lot(product, dec!(30));
        let journal = vec![
            movement(&lot, Direction::In, dec!(50), purchase, 1),
            movement(&lot, Direction::Out, dec!(-20), sale, 2),
        ];

        let err = plan_stock_reversal(purchase, &journal, &[lot.clone()]).unwrap_err();
        assert_eq!(
            err,
            EngineError::HasDependentMovements {
                reference: purchase,
                dependents: vec![sale],
            }
        );
    }

    #[test]
    fn test_earlier_outflow_does_not_block_top_up() {
        let product = Uuid::new_v4();
        let purchase = Reference::new(ReferenceKind::Purchase, Uuid::new_v4());
        let sale = Reference::new(ReferenceKind::SaleLiquidation, Uuid::new_v4());
        let top_up = Reference::new(ReferenceKind::Adjustment, Uuid::new_v4());
        let lot = lot(product, dec!(35));
        let journal = vec![
            movement(&lot, Direction::In, dec!(50), purchase, 1),
            movement(&lot, Direction::Out, dec!(-20), sale, 2),
            movement(&lot, Direction::Adjust, dec!(5), top_up, 3),
        ];

        let plan = plan_stock_reversal(top_up, &journal, &[lot.clone()]).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].quantity, dec!(-5));
        assert_eq!(plan[0].on_hand_after, dec!(30));

        let err = plan_stock_reversal(purchase, &journal, &[lot.clone()]).unwrap_err();
        assert_eq!(
            err,
            EngineError::HasDependentMovements {
                reference: purchase,
                dependents: vec![sale],
            }
        );
    }

    #[test]
    fn test_voided_outflow_no_longer_blocks() {
        let product = Uuid::new_v4();
        let purchase = Reference::new(ReferenceKind::Purchase, Uuid::new_v4());
        let sale = Reference::new(ReferenceKind::SaleLiquidation, Uuid::new_v4());
        let lot = lot(product, dec!(50));
        let mut outflow = movement(&lot, Direction::Out, dec!(-20), sale, 2);
        outflow.voided = true;
        let mut compensation = movement(&lot, Direction::Void, dec!(20), sale, 3);
        compensation.reverses = Some(outflow.id);
        let journal = vec![
            movement(&lot, Direction::In, dec!(50), purchase, 1),
            outflow,
            compensation,
        ];

        let plan = plan_stock_reversal(purchase, &journal, &[lot.clone()]).unwrap();
        assert_eq!(plan[0].on_hand_after, dec!(0));
    }

    #[test]
    fn test_outflow_void_returns_stock_to_each_lot() {
        let product = Uuid::new_v4();
        let sale = Reference::new(ReferenceKind::SaleLiquidation, Uuid::new_v4());
        let a = lot(product, dec!(0));
        let b = lot(product, dec!(5));
        let journal = vec![
            movement(&a, Direction::Out, dec!(-10), sale, 1),
            movement(&b, Direction::Out, dec!(-3), sale, 1),
        ];
        let plan = plan_stock_reversal(sale, &journal, &[a.clone(), b.clone()]).unwrap();
        assert_eq!(plan[0].on_hand_after, dec!(10));
        assert_eq!(plan[1].on_hand_after, dec!(8));
    }

    #[test]
    fn test_second_void_plans_nothing() {
        let product = Uuid::new_v4();
        let purchase = Reference::new(ReferenceKind::Purchase, Uuid::new_v4());
        let lot = lot(product, dec!(0));
        let mut original = movement(&lot, Direction::In, dec!(50), purchase, 1);
        original.voided = true;
        let mut compensation = movement(&lot, Direction::Void, dec!(-50), purchase, 2);
        compensation.reverses = Some(original.id);

        let plan = plan_stock_reversal(purchase, &[original, compensation], &[lot]).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_negative_backstop() {
        let product = Uuid::new_v4();
        let adjustment = Reference::new(ReferenceKind::Adjustment, Uuid::new_v4());
        let lot = lot(product, dec!(2));
        let journal = vec![movement(&lot, Direction::Adjust, dec!(5), adjustment, 1)];
        assert!(matches!(
            plan_stock_reversal(adjustment, &journal, &[lot.clone()]),
            Err(EngineError::InsufficientInventory { .. })
        ));
    }
}
