//! Deposit and sale liquidation tests.

mod common;

use beneficio_core::{DocumentStatus, EngineError, Reference, ReferenceKind, VoidOutcome};
use beneficio_db::repositories::{
    CreateCommitmentInput, DepositRepository, InventoryRepository, LiquidateDepositsInput,
    LiquidateSaleInput, RecordDepositInput, RecordPurchaseInput, ReversalRepository,
    SaleRepository,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use common::{day, sqlite};

struct Harvest {
    producer: Uuid,
    product: Uuid,
    deposits: DepositRepository,
    reversals: ReversalRepository,
}

impl Harvest {
    fn new(db: &DatabaseConnection) -> Self {
        Self {
            producer: Uuid::new_v4(),
            product: Uuid::new_v4(),
            deposits: DepositRepository::new(db.clone()),
            reversals: ReversalRepository::new(db.clone()),
        }
    }

    async fn deposit(&self, quantity: Decimal, on: i64) -> Uuid {
        self.deposits
            .record(RecordDepositInput {
                producer_id: self.producer,
                product_id: self.product,
                quantity,
                at: day(on),
                note: None,
            })
            .await
            .unwrap()
            .deposit_id
    }

    fn liquidation(&self, quantity: Decimal) -> LiquidateDepositsInput {
        LiquidateDepositsInput {
            producer_id: self.producer,
            product_id: self.product,
            quantity,
            unit_price: dec!(4.10),
            description: Some("liquidacion".to_string()),
            at: day(20),
        }
    }
}

#[tokio::test]
async fn test_deposit_liquidation_spans_deposits_oldest_first() {
    let db = sqlite().await;
    let harvest = Harvest::new(&db);
    let late = harvest.deposit(dec!(30), 2).await;
    let early = harvest.deposit(dec!(20), 0).await;

    let receipt = harvest
        .deposits
        .liquidate(harvest.liquidation(dec!(35)))
        .await
        .unwrap();
    assert_eq!(receipt.applied_quantity, dec!(35));
    assert_eq!(receipt.applied_amount, dec!(143.50));
    assert_eq!(receipt.lines.len(), 2);
    assert_eq!(receipt.lines[0].document_id, early);
    assert_eq!(receipt.lines[0].status_after, DocumentStatus::Liquidated);
    assert_eq!(receipt.lines[1].document_id, late);
    assert_eq!(receipt.lines[1].remaining_after, dec!(15));

    let early = harvest.deposits.find(early).await.unwrap();
    assert_eq!(early.status, DocumentStatus::Liquidated);
    let late = harvest.deposits.find(late).await.unwrap();
    assert_eq!(late.status, DocumentStatus::Pending);
}

#[tokio::test]
async fn test_deposit_liquidation_caps_at_pending() {
    let db = sqlite().await;
    let harvest = Harvest::new(&db);
    harvest.deposit(dec!(12.5), 0).await;

    let receipt = harvest
        .deposits
        .liquidate(harvest.liquidation(dec!(100)))
        .await
        .unwrap();
    assert_eq!(receipt.applied_quantity, dec!(12.5));

    let err = harvest
        .deposits
        .liquidate(harvest.liquidation(dec!(1)))
        .await
        .unwrap_err();
    assert_eq!(
        err.engine(),
        Some(&EngineError::NoPendingDeposits {
            producer_id: harvest.producer,
            product_id: harvest.product,
        })
    );
}

#[tokio::test]
async fn test_liquidated_deposit_blocks_void_until_liquidation_voided() {
    let db = sqlite().await;
    let harvest = Harvest::new(&db);
    let deposit = harvest.deposit(dec!(10), 0).await;
    let receipt = harvest
        .deposits
        .liquidate(harvest.liquidation(dec!(4)))
        .await
        .unwrap();

    let reference = Reference::new(ReferenceKind::Deposit, deposit);
    let err = harvest.reversals.void(reference).await.unwrap_err();
    assert_eq!(
        err.engine(),
        Some(&EngineError::HasDependentMovements {
            reference,
            dependents: vec![Reference::new(
                ReferenceKind::DepositLiquidation,
                receipt.liquidation_id
            )],
        })
    );

    let liquidation = Reference::new(ReferenceKind::DepositLiquidation, receipt.liquidation_id);
    assert_eq!(
        harvest.reversals.void(liquidation).await.unwrap(),
        VoidOutcome::Voided
    );
    assert_eq!(harvest.reversals.void(reference).await.unwrap(), VoidOutcome::Voided);

    let deposit = harvest.deposits.find(deposit).await.unwrap();
    assert_eq!(deposit.status, DocumentStatus::Voided);
    let stock = InventoryRepository::new(db)
        .stock_level(harvest.product)
        .await
        .unwrap();
    assert_eq!(stock.on_hand, dec!(0));
}

#[tokio::test]
async fn test_voiding_liquidation_reopens_deposit() {
    let db = sqlite().await;
    let harvest = Harvest::new(&db);
    let deposit = harvest.deposit(dec!(8), 0).await;
    let receipt = harvest
        .deposits
        .liquidate(harvest.liquidation(dec!(8)))
        .await
        .unwrap();
    assert_eq!(
        harvest.deposits.find(deposit).await.unwrap().status,
        DocumentStatus::Liquidated
    );

    harvest
        .reversals
        .void(Reference::new(
            ReferenceKind::DepositLiquidation,
            receipt.liquidation_id,
        ))
        .await
        .unwrap();
    assert_eq!(
        harvest.deposits.find(deposit).await.unwrap().status,
        DocumentStatus::Pending
    );

    let again = harvest
        .deposits
        .liquidate(harvest.liquidation(dec!(8)))
        .await
        .unwrap();
    assert_eq!(again.applied_quantity, dec!(8));
}

async fn stock_product(db: &DatabaseConnection, product_id: Uuid, quantity: Decimal) {
    InventoryRepository::new(db.clone())
        .record_purchase(RecordPurchaseInput {
            producer_id: Uuid::new_v4(),
            product_id,
            quantity,
            unit_price: dec!(2),
            at: day(0),
            note: None,
        })
        .await
        .unwrap();
}

fn commitment(buyer_id: Uuid, product_id: Uuid, quantity: Decimal, price: Decimal, on: i64) -> CreateCommitmentInput {
    CreateCommitmentInput {
        buyer_id,
        product_id,
        quantity,
        unit_price: price,
        at: day(on),
        note: None,
    }
}

fn sale(buyer_id: Uuid, product_id: Uuid, quantity: Decimal) -> LiquidateSaleInput {
    LiquidateSaleInput {
        buyer_id,
        product_id,
        quantity,
        description: None,
        at: day(10),
    }
}

#[tokio::test]
async fn test_sale_liquidation_reduces_stock() {
    let db = sqlite().await;
    let sales = SaleRepository::new(db.clone());
    let buyer = Uuid::new_v4();
    let product = Uuid::new_v4();
    stock_product(&db, product, dec!(100)).await;

    let first = sales
        .create_commitment(commitment(buyer, product, dec!(40), dec!(5), 1))
        .await
        .unwrap();
    let second = sales
        .create_commitment(commitment(buyer, product, dec!(40), dec!(6), 2))
        .await
        .unwrap();

    let receipt = sales.liquidate(sale(buyer, product, dec!(50))).await.unwrap();
    assert_eq!(receipt.applied_quantity, dec!(50));
    assert_eq!(receipt.applied_amount, dec!(260));
    assert_eq!(receipt.stock.len(), 1);
    assert_eq!(receipt.stock[0].on_hand_after, dec!(50));

    assert_eq!(
        sales.find_commitment(first.id).await.unwrap().status,
        DocumentStatus::Liquidated
    );
    assert_eq!(
        sales.find_commitment(second.id).await.unwrap().status,
        DocumentStatus::Pending
    );
    let level = InventoryRepository::new(db).stock_level(product).await.unwrap();
    assert_eq!(level.on_hand, dec!(50));
}

#[tokio::test]
async fn test_sale_without_stock_is_rejected() {
    let db = sqlite().await;
    let sales = SaleRepository::new(db.clone());
    let buyer = Uuid::new_v4();
    let product = Uuid::new_v4();
    stock_product(&db, product, dec!(5)).await;
    let promised = sales
        .create_commitment(commitment(buyer, product, dec!(6), dec!(5), 1))
        .await
        .unwrap();

    let err = sales.liquidate(sale(buyer, product, dec!(6))).await.unwrap_err();
    assert_eq!(
        err.engine(),
        Some(&EngineError::InsufficientInventory {
            product_id: product,
            requested: dec!(6),
            available: dec!(5),
        })
    );
    assert_eq!(
        sales.find_commitment(promised.id).await.unwrap().status,
        DocumentStatus::Pending
    );
}

#[tokio::test]
async fn test_sale_void_returns_stock_and_reopens_commitment() {
    let db = sqlite().await;
    let sales = SaleRepository::new(db.clone());
    let reversals = ReversalRepository::new(db.clone());
    let buyer = Uuid::new_v4();
    let product = Uuid::new_v4();
    stock_product(&db, product, dec!(30)).await;
    let promised = sales
        .create_commitment(commitment(buyer, product, dec!(30), dec!(7), 1))
        .await
        .unwrap();
    let receipt = sales.liquidate(sale(buyer, product, dec!(30))).await.unwrap();

    let commitment_ref = Reference::new(ReferenceKind::SaleCommitment, promised.id);
    let err = reversals.void(commitment_ref).await.unwrap_err();
    assert_eq!(err.into_engine().error_code(), "HasDependentMovements");

    reversals
        .void(Reference::new(
            ReferenceKind::SaleLiquidation,
            receipt.liquidation_id,
        ))
        .await
        .unwrap();
    assert_eq!(
        sales.find_commitment(promised.id).await.unwrap().status,
        DocumentStatus::Pending
    );
    let level = InventoryRepository::new(db).stock_level(product).await.unwrap();
    assert_eq!(level.on_hand, dec!(30));

    assert_eq!(reversals.void(commitment_ref).await.unwrap(), VoidOutcome::Voided);
    let err = sales.liquidate(sale(buyer, product, dec!(1))).await.unwrap_err();
    assert_eq!(err.into_engine().error_code(), "NoPendingCommitments");
}
