//! Obligation repository tests against an in-memory SQLite ledger.

mod common;

use beneficio_core::obligation::{LedgerOperation, ObligationKind, ObligationStatus};
use beneficio_core::{EngineError, Reference, ReferenceKind, VoidOutcome};
use beneficio_db::repositories::{
    ApplyOperationInput, ObligationRepository, OpenObligationInput, ReversalRepository,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{day, sqlite};

fn open(producer_id: Uuid, principal: Decimal, on: i64) -> OpenObligationInput {
    OpenObligationInput {
        producer_id,
        kind: ObligationKind::Loan,
        principal,
        at: day(on),
        note: None,
    }
}

fn pay(producer_id: Uuid, operation: LedgerOperation, amount: Decimal) -> ApplyOperationInput {
    ApplyOperationInput {
        producer_id,
        kind: ObligationKind::Loan,
        operation,
        amount,
        obligation_id: None,
        at: day(30),
        note: Some("abono".to_string()),
    }
}

#[tokio::test]
async fn test_payment_settles_oldest_loan_first() {
    let db = sqlite().await;
    let repo = ObligationRepository::new(db);
    let producer = Uuid::new_v4();

    let newer = repo.open(open(producer, dec!(500), 3)).await.unwrap();
    let older = repo.open(open(producer, dec!(1000), 1)).await.unwrap();

    let posted = repo
        .apply(pay(producer, LedgerOperation::PaymentPrincipal, dec!(1200)))
        .await
        .unwrap();
    assert_eq!(posted.len(), 2);
    assert_eq!(posted[0].posting.obligation_id, older.id);
    assert_eq!(posted[0].posting.amount, dec!(1000));
    assert_eq!(posted[1].posting.obligation_id, newer.id);
    assert_eq!(posted[1].posting.amount, dec!(200));

    let older = repo.summary(older.id).await.unwrap();
    assert_eq!(older.status, ObligationStatus::Completed);
    assert_eq!(older.obligation.status, ObligationStatus::Completed);
    assert_eq!(older.balance.principal_pending, dec!(0));

    let newer = repo.summary(newer.id).await.unwrap();
    assert_eq!(newer.status, ObligationStatus::Active);
    assert_eq!(newer.balance.principal_pending, dec!(300));
}

#[tokio::test]
async fn test_completes_only_at_exact_balance() {
    let db = sqlite().await;
    let repo = ObligationRepository::new(db);
    let producer = Uuid::new_v4();
    let loan = repo.open(open(producer, dec!(1000), 0)).await.unwrap();

    repo.apply(pay(producer, LedgerOperation::PaymentPrincipal, dec!(999.99)))
        .await
        .unwrap();
    let summary = repo.summary(loan.id).await.unwrap();
    assert_eq!(summary.status, ObligationStatus::Active);
    assert_eq!(summary.balance.principal_pending, dec!(0.01));

    repo.apply(pay(producer, LedgerOperation::PaymentPrincipal, dec!(0.01)))
        .await
        .unwrap();
    let summary = repo.summary(loan.id).await.unwrap();
    assert_eq!(summary.status, ObligationStatus::Completed);
    assert!(summary.balance.is_settled());
}

#[tokio::test]
async fn test_thirds_leave_one_cent() {
    let db = sqlite().await;
    let repo = ObligationRepository::new(db);
    let producer = Uuid::new_v4();
    let loan = repo.open(open(producer, dec!(100), 0)).await.unwrap();

    for _ in 0..3 {
        repo.apply(pay(producer, LedgerOperation::PaymentPrincipal, dec!(33.33)))
            .await
            .unwrap();
    }

    let summary = repo.summary(loan.id).await.unwrap();
    assert_eq!(summary.balance.principal_pending, dec!(0.01));
    assert_eq!(summary.status, ObligationStatus::Active);
}

#[tokio::test]
async fn test_overpayment_is_rejected_without_writes() {
    let db = sqlite().await;
    let repo = ObligationRepository::new(db);
    let producer = Uuid::new_v4();
    let loan = repo.open(open(producer, dec!(400), 0)).await.unwrap();

    let err = repo
        .apply(pay(producer, LedgerOperation::PaymentPrincipal, dec!(400.01)))
        .await
        .unwrap_err();
    assert_eq!(
        err.engine(),
        Some(&EngineError::InsufficientBalance {
            requested: dec!(400.01),
            available: dec!(400),
        })
    );

    let summary = repo.summary(loan.id).await.unwrap();
    assert_eq!(summary.balance.principal_pending, dec!(400));
}

#[tokio::test]
async fn test_interest_charge_lands_on_oldest_open_loan() {
    let db = sqlite().await;
    let repo = ObligationRepository::new(db);
    let producer = Uuid::new_v4();
    let older = repo.open(open(producer, dec!(100), 0)).await.unwrap();
    let newer = repo.open(open(producer, dec!(100), 5)).await.unwrap();

    let posted = repo
        .apply(pay(producer, LedgerOperation::ChargeInterest, dec!(12.50)))
        .await
        .unwrap();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].posting.obligation_id, older.id);

    repo.apply(pay(producer, LedgerOperation::PaymentInterest, dec!(12.50)))
        .await
        .unwrap();

    let older = repo.summary(older.id).await.unwrap();
    assert_eq!(older.balance.interest_pending, dec!(0));
    assert_eq!(older.balance.principal_pending, dec!(100));
    let newer = repo.summary(newer.id).await.unwrap();
    assert_eq!(newer.balance.interest_pending, dec!(0));
}

#[tokio::test]
async fn test_no_pending_obligations() {
    let db = sqlite().await;
    let repo = ObligationRepository::new(db);
    let producer = Uuid::new_v4();

    let err = repo
        .apply(pay(producer, LedgerOperation::PaymentPrincipal, dec!(1)))
        .await
        .unwrap_err();
    assert_eq!(
        err.engine(),
        Some(&EngineError::NoPendingObligations {
            producer_id: producer
        })
    );
}

#[tokio::test]
async fn test_unknown_target_obligation_is_not_found() {
    let db = sqlite().await;
    let repo = ObligationRepository::new(db);
    let producer = Uuid::new_v4();
    repo.open(open(producer, dec!(100), 0)).await.unwrap();

    let missing = Uuid::new_v4();
    let mut input = pay(producer, LedgerOperation::PaymentPrincipal, dec!(10));
    input.obligation_id = Some(missing);
    let err = repo.apply(input).await.unwrap_err();
    assert_eq!(err.into_engine().error_code(), "EntityNotFound");
}

#[tokio::test]
async fn test_voiding_payment_reopens_loan() {
    let db = sqlite().await;
    let repo = ObligationRepository::new(db.clone());
    let reversals = ReversalRepository::new(db);
    let producer = Uuid::new_v4();
    let loan = repo.open(open(producer, dec!(250), 0)).await.unwrap();

    let posted = repo
        .apply(pay(producer, LedgerOperation::PaymentPrincipal, dec!(250)))
        .await
        .unwrap();
    assert_eq!(
        repo.summary(loan.id).await.unwrap().status,
        ObligationStatus::Completed
    );

    let payment = Reference::new(ReferenceKind::ObligationMovement, posted[0].movement_id);
    assert_eq!(reversals.void(payment).await.unwrap(), VoidOutcome::Voided);
    assert_eq!(
        reversals.void(payment).await.unwrap(),
        VoidOutcome::AlreadyVoided
    );

    let summary = repo.summary(loan.id).await.unwrap();
    assert_eq!(summary.status, ObligationStatus::Active);
    assert_eq!(summary.balance.principal_pending, dec!(250));
}

#[tokio::test]
async fn test_loan_with_payments_cannot_be_voided() {
    let db = sqlite().await;
    let repo = ObligationRepository::new(db.clone());
    let reversals = ReversalRepository::new(db);
    let producer = Uuid::new_v4();
    let loan = repo.open(open(producer, dec!(90), 0)).await.unwrap();
    let posted = repo
        .apply(pay(producer, LedgerOperation::PaymentPrincipal, dec!(40)))
        .await
        .unwrap();

    let reference = Reference::new(ReferenceKind::Obligation, loan.id);
    let err = reversals.void(reference).await.unwrap_err();
    assert_eq!(
        err.engine(),
        Some(&EngineError::HasDependentMovements {
            reference,
            dependents: vec![Reference::new(
                ReferenceKind::ObligationMovement,
                posted[0].movement_id
            )],
        })
    );

    let payment = Reference::new(ReferenceKind::ObligationMovement, posted[0].movement_id);
    reversals.void(payment).await.unwrap();
    assert_eq!(reversals.void(reference).await.unwrap(), VoidOutcome::Voided);

    let listed = repo.list_for_producer(producer, None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].obligation.status, ObligationStatus::Voided);
}
