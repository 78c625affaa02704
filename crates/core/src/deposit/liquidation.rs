//! Deposit liquidation engine.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{EngineError, ensure_positive};
use crate::settlement::{self, Position, Settlement};

use super::types::{Deposit, LiquidationDetail};

/// Position of `deposit` given every detail line that references it.
///
/// Voided lines do not count.
#[must_use]
pub fn deposit_position(
    deposit: &Deposit,
    details: &[LiquidationDetail],
    unit_price: Decimal,
) -> Position {
    Position::new(
        deposit.id,
        deposit.deposited_at,
        deposit.quantity,
        details
            .iter()
            .filter(|d| d.document_id == deposit.id && !d.voided)
            .map(|d| d.quantity),
        unit_price,
        deposit.status,
    )
}

/// Plans liquidating `quantity` of a producer's deposits of one product at
/// `unit_price`.
///
/// Deposits are consumed oldest first. If less is pending than requested,
/// only the pending quantity is liquidated; the settlement totals report
/// what was actually applied.
///
/// # Errors
///
/// - `InvalidAmount` for a non-positive quantity or price.
/// - `NoPendingDeposits` when nothing would be applied.
pub fn plan_liquidation(
    producer_id: Uuid,
    product_id: Uuid,
    quantity: Decimal,
    unit_price: Decimal,
    deposits: &[Deposit],
    details: &[LiquidationDetail],
) -> Result<Settlement, EngineError> {
    let quantity = ensure_positive("quantity", quantity)?;
    let unit_price = ensure_positive("unitPrice", unit_price)?;

    let positions: Vec<Position> = deposits
        .iter()
        .filter(|d| d.producer_id == producer_id && d.product_id == product_id)
        .map(|d| deposit_position(d, details, unit_price))
        .collect();

    let settlement = settlement::settle(quantity, &positions)?.ok_or(
        EngineError::NoPendingDeposits {
            producer_id,
            product_id,
        },
    )?;

    Ok(settlement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::DocumentStatus;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    struct Fixture {
        producer: Uuid,
        product: Uuid,
        deposits: Vec<Deposit>,
        details: Vec<LiquidationDetail>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                producer: Uuid::new_v4(),
                product: Uuid::new_v4(),
                deposits: Vec::new(),
                details: Vec::new(),
            }
        }

        fn deposit(&mut self, quantity: Decimal) -> Uuid {
            let id = Uuid::new_v4();
            let day = i64::try_from(self.deposits.len()).unwrap();
            self.deposits.push(Deposit {
                id,
                producer_id: self.producer,
                product_id: self.product,
                quantity,
                status: DocumentStatus::Pending,
                deposited_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
                    + Duration::days(day),
            });
            id
        }

        fn liquidated(&mut self, deposit: Uuid, quantity: Decimal, voided: bool) {
            self.details.push(LiquidationDetail {
                id: Uuid::new_v4(),
                liquidation_id: Uuid::new_v4(),
                document_id: deposit,
                quantity,
                unit_price: dec!(1),
                amount: quantity,
                voided,
            });
        }

        fn plan(&self, quantity: Decimal, price: Decimal) -> Result<Settlement, EngineError> {
            plan_liquidation(
                self.producer,
                self.product,
                quantity,
                price,
                &self.deposits,
                &self.details,
            )
        }
    }

    #[test]
    fn test_liquidation_consumes_oldest_deposit_first() {
        let mut f = Fixture::new();
        let first = f.deposit(dec!(20));
        let second = f.deposit(dec!(30));

        let settlement = f.plan(dec!(25), dec!(2100)).unwrap();
        assert_eq!(settlement.lines.len(), 2);
        assert_eq!(settlement.lines[0].document_id, first);
        assert_eq!(settlement.lines[0].status_after, DocumentStatus::Liquidated);
        assert_eq!(settlement.lines[1].document_id, second);
        assert_eq!(settlement.lines[1].quantity, dec!(5));
        assert_eq!(settlement.lines[1].status_after, DocumentStatus::Pending);
        assert_eq!(settlement.total_amount, dec!(52500.00));
    }

    #[test]
    fn test_liquidation_is_partial_when_pending_is_short() {
        let mut f = Fixture::new();
        let deposit = f.deposit(dec!(20));
        f.liquidated(deposit, dec!(15), false);

        let settlement = f.plan(dec!(12), dec!(10)).unwrap();
        assert_eq!(settlement.total_quantity, dec!(5));
        assert_eq!(settlement.total_amount, dec!(50));
    }

    #[test]
    fn test_voided_details_restore_remaining() {
        let mut f = Fixture::new();
        let deposit = f.deposit(dec!(20));
        f.liquidated(deposit, dec!(20), true);
        let settlement = f.plan(dec!(20), dec!(1)).unwrap();
        assert_eq!(settlement.total_quantity, dec!(20));
    }

    #[test]
    fn test_no_pending_deposits() {
        let mut f = Fixture::new();
        let deposit = f.deposit(dec!(10));
        f.liquidated(deposit, dec!(10), false);
        f.deposit(dec!(10));
        f.deposits[1].status = DocumentStatus::Voided;

        let err = f.plan(dec!(1), dec!(1)).unwrap_err();
        assert_eq!(
            err,
            EngineError::NoPendingDeposits {
                producer_id: f.producer,
                product_id: f.product,
            }
        );
    }

    #[test]
    fn test_deposits_of_other_products_are_ignored() {
        let mut f = Fixture::new();
        f.deposit(dec!(10));
        f.deposits[0].product_id = Uuid::new_v4();
        assert!(matches!(
            f.plan(dec!(1), dec!(1)),
            Err(EngineError::NoPendingDeposits { .. })
        ));
    }

    #[test]
    fn test_rejects_non_positive_inputs() {
        let mut f = Fixture::new();
        f.deposit(dec!(10));
        assert!(matches!(f.plan(dec!(0), dec!(1)), Err(EngineError::InvalidAmount(_))));
        assert!(matches!(f.plan(dec!(1), dec!(-1)), Err(EngineError::InvalidAmount(_))));
    }
}
