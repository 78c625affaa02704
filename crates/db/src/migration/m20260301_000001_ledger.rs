//! Ledger schema.
//!
//! Creates obligations, inventory, deposit, sale, contract and transfer
//! tables. No server-side defaults and no enum types: every column is written
//! explicitly by the repositories. On SQLite, fixed-point columns are declared
//! `REAL` and re-rounded on load.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DbBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Column type of every amount and quantity.
const FIXED: &str = "NUMERIC(14, 2)";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // PART 1: OBLIGATIONS
        // ============================================================
        execute(manager, OBLIGATIONS_SQL).await?;
        execute(manager, OBLIGATION_MOVEMENTS_SQL).await?;

        // ============================================================
        // PART 2: INVENTORY
        // ============================================================
        execute(manager, INVENTORY_LOTS_SQL).await?;
        execute(manager, INVENTORY_MOVEMENTS_SQL).await?;
        execute(manager, PURCHASES_SQL).await?;
        execute(manager, TRANSFERS_SQL).await?;

        // ============================================================
        // PART 3: DEPOSITS
        // ============================================================
        execute(manager, DEPOSITS_SQL).await?;
        execute(manager, DEPOSIT_LIQUIDATIONS_SQL).await?;
        execute(manager, DEPOSIT_LIQUIDATION_DETAILS_SQL).await?;

        // ============================================================
        // PART 4: SALES
        // ============================================================
        execute(manager, SALE_COMMITMENTS_SQL).await?;
        execute(manager, SALE_LIQUIDATIONS_SQL).await?;
        execute(manager, SALE_LIQUIDATION_DETAILS_SQL).await?;

        // ============================================================
        // PART 5: CONTRACTS
        // ============================================================
        execute(manager, CONTRACTS_SQL).await?;
        execute(manager, CONTRACT_DELIVERIES_SQL).await?;

        // ============================================================
        // PART 6: INDEXES
        // ============================================================
        for statement in INDEXES_SQL {
            execute(manager, statement).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            "contract_deliveries",
            "contracts",
            "sale_liquidation_details",
            "sale_liquidations",
            "sale_commitments",
            "deposit_liquidation_details",
            "deposit_liquidations",
            "deposits",
            "transfers",
            "purchases",
            "inventory_movements",
            "inventory_lots",
            "obligation_movements",
            "obligations",
        ] {
            execute(manager, &format!("DROP TABLE IF EXISTS {table}")).await?;
        }
        Ok(())
    }
}

/// Runs one statement, adapting fixed-point columns to the backend.
async fn execute(manager: &SchemaManager<'_>, sql: &str) -> Result<(), DbErr> {
    let sql = match manager.get_database_backend() {
        DbBackend::Sqlite => sql.replace(FIXED, "REAL"),
        _ => sql.to_string(),
    };
    manager.get_connection().execute_unprepared(&sql).await?;
    Ok(())
}

const OBLIGATIONS_SQL: &str = r"
CREATE TABLE obligations (
    id UUID PRIMARY KEY,
    producer_id UUID NOT NULL,
    kind VARCHAR(24) NOT NULL CHECK (kind IN ('loan', 'cash_advance')),
    principal NUMERIC(14, 2) NOT NULL CHECK (principal > 0),
    status VARCHAR(24) NOT NULL CHECK (status IN ('ACTIVE', 'COMPLETED', 'VOIDED')),
    note TEXT,
    opened_at TIMESTAMPTZ NOT NULL
)";

const OBLIGATION_MOVEMENTS_SQL: &str = r"
CREATE TABLE obligation_movements (
    id UUID PRIMARY KEY,
    obligation_id UUID NOT NULL REFERENCES obligations(id),
    kind VARCHAR(24) NOT NULL CHECK (kind IN (
        'CHARGE_PRINCIPAL', 'PAYMENT_PRINCIPAL', 'CHARGE_INTEREST', 'PAYMENT_INTEREST', 'VOID'
    )),
    amount NUMERIC(14, 2) NOT NULL CHECK (amount > 0),
    voids UUID REFERENCES obligation_movements(id),
    note TEXT,
    occurred_at TIMESTAMPTZ NOT NULL,
    CHECK ((kind = 'VOID') = (voids IS NOT NULL))
)";

const INVENTORY_LOTS_SQL: &str = r"
CREATE TABLE inventory_lots (
    id UUID PRIMARY KEY,
    product_id UUID NOT NULL,
    owner_id UUID,
    quantity_on_hand NUMERIC(14, 2) NOT NULL CHECK (quantity_on_hand >= 0),
    opened_at TIMESTAMPTZ NOT NULL
)";

const INVENTORY_MOVEMENTS_SQL: &str = r"
CREATE TABLE inventory_movements (
    id UUID PRIMARY KEY,
    lot_id UUID NOT NULL REFERENCES inventory_lots(id),
    product_id UUID NOT NULL,
    direction VARCHAR(16) NOT NULL CHECK (direction IN ('IN', 'OUT', 'TRANSFER', 'VOID', 'ADJUST')),
    quantity NUMERIC(14, 2) NOT NULL CHECK (quantity <> 0),
    reference_type VARCHAR(32) NOT NULL,
    reference_id UUID NOT NULL,
    note TEXT,
    voided BOOLEAN NOT NULL,
    reverses UUID REFERENCES inventory_movements(id),
    occurred_at TIMESTAMPTZ NOT NULL
)";

const PURCHASES_SQL: &str = r"
CREATE TABLE purchases (
    id UUID PRIMARY KEY,
    producer_id UUID NOT NULL,
    product_id UUID NOT NULL,
    quantity NUMERIC(14, 2) NOT NULL CHECK (quantity > 0),
    unit_price NUMERIC(14, 2) NOT NULL CHECK (unit_price > 0),
    amount NUMERIC(14, 2) NOT NULL,
    note TEXT,
    voided BOOLEAN NOT NULL,
    purchased_at TIMESTAMPTZ NOT NULL
)";

const TRANSFERS_SQL: &str = r"
CREATE TABLE transfers (
    id UUID PRIMARY KEY,
    from_product_id UUID NOT NULL,
    to_product_id UUID NOT NULL,
    quantity NUMERIC(14, 2) NOT NULL CHECK (quantity > 0),
    note TEXT,
    voided BOOLEAN NOT NULL,
    transferred_at TIMESTAMPTZ NOT NULL,
    CHECK (from_product_id <> to_product_id)
)";

const DEPOSITS_SQL: &str = r"
CREATE TABLE deposits (
    id UUID PRIMARY KEY,
    producer_id UUID NOT NULL,
    product_id UUID NOT NULL,
    quantity NUMERIC(14, 2) NOT NULL CHECK (quantity > 0),
    status VARCHAR(24) NOT NULL CHECK (status IN ('PENDING', 'LIQUIDATED', 'VOIDED')),
    note TEXT,
    deposited_at TIMESTAMPTZ NOT NULL
)";

const DEPOSIT_LIQUIDATIONS_SQL: &str = r"
CREATE TABLE deposit_liquidations (
    id UUID PRIMARY KEY,
    producer_id UUID NOT NULL,
    product_id UUID NOT NULL,
    quantity NUMERIC(14, 2) NOT NULL CHECK (quantity > 0),
    unit_price NUMERIC(14, 2) NOT NULL,
    amount NUMERIC(14, 2) NOT NULL,
    description TEXT,
    voided BOOLEAN NOT NULL,
    liquidated_at TIMESTAMPTZ NOT NULL
)";

const DEPOSIT_LIQUIDATION_DETAILS_SQL: &str = r"
CREATE TABLE deposit_liquidation_details (
    id UUID PRIMARY KEY,
    liquidation_id UUID NOT NULL REFERENCES deposit_liquidations(id),
    deposit_id UUID NOT NULL REFERENCES deposits(id),
    quantity NUMERIC(14, 2) NOT NULL CHECK (quantity > 0),
    unit_price NUMERIC(14, 2) NOT NULL,
    amount NUMERIC(14, 2) NOT NULL,
    voided BOOLEAN NOT NULL
)";

const SALE_COMMITMENTS_SQL: &str = r"
CREATE TABLE sale_commitments (
    id UUID PRIMARY KEY,
    buyer_id UUID NOT NULL,
    product_id UUID NOT NULL,
    quantity NUMERIC(14, 2) NOT NULL CHECK (quantity > 0),
    unit_price NUMERIC(14, 2) NOT NULL CHECK (unit_price > 0),
    status VARCHAR(24) NOT NULL CHECK (status IN ('PENDING', 'LIQUIDATED', 'VOIDED')),
    note TEXT,
    committed_at TIMESTAMPTZ NOT NULL
)";

const SALE_LIQUIDATIONS_SQL: &str = r"
CREATE TABLE sale_liquidations (
    id UUID PRIMARY KEY,
    buyer_id UUID NOT NULL,
    product_id UUID NOT NULL,
    quantity NUMERIC(14, 2) NOT NULL CHECK (quantity > 0),
    amount NUMERIC(14, 2) NOT NULL,
    description TEXT,
    voided BOOLEAN NOT NULL,
    liquidated_at TIMESTAMPTZ NOT NULL
)";

const SALE_LIQUIDATION_DETAILS_SQL: &str = r"
CREATE TABLE sale_liquidation_details (
    id UUID PRIMARY KEY,
    liquidation_id UUID NOT NULL REFERENCES sale_liquidations(id),
    commitment_id UUID NOT NULL REFERENCES sale_commitments(id),
    quantity NUMERIC(14, 2) NOT NULL CHECK (quantity > 0),
    unit_price NUMERIC(14, 2) NOT NULL,
    amount NUMERIC(14, 2) NOT NULL,
    voided BOOLEAN NOT NULL
)";

const CONTRACTS_SQL: &str = r"
CREATE TABLE contracts (
    id UUID PRIMARY KEY,
    direction VARCHAR(16) NOT NULL CHECK (direction IN ('INCOMING', 'OUTGOING')),
    counterparty_id UUID NOT NULL,
    product_id UUID NOT NULL,
    quantity NUMERIC(14, 2) NOT NULL CHECK (quantity > 0),
    unit_price NUMERIC(14, 2) NOT NULL CHECK (unit_price > 0),
    status VARCHAR(24) NOT NULL CHECK (status IN ('PENDING', 'LIQUIDATED', 'VOIDED')),
    note TEXT,
    created_at TIMESTAMPTZ NOT NULL
)";

const CONTRACT_DELIVERIES_SQL: &str = r"
CREATE TABLE contract_deliveries (
    id UUID PRIMARY KEY,
    contract_id UUID NOT NULL REFERENCES contracts(id),
    quantity NUMERIC(14, 2) NOT NULL CHECK (quantity > 0),
    unit_price NUMERIC(14, 2) NOT NULL,
    amount NUMERIC(14, 2) NOT NULL,
    movement_kind VARCHAR(16) NOT NULL CHECK (movement_kind IN ('IN', 'OUT')),
    voided BOOLEAN NOT NULL,
    delivered_at TIMESTAMPTZ NOT NULL
)";

const INDEXES_SQL: [&str; 9] = [
    "CREATE INDEX idx_obligations_producer ON obligations(producer_id, kind)",
    "CREATE INDEX idx_obligation_movements_obligation ON obligation_movements(obligation_id)",
    "CREATE INDEX idx_inventory_lots_product ON inventory_lots(product_id)",
    "CREATE INDEX idx_inventory_movements_lot ON inventory_movements(lot_id)",
    "CREATE INDEX idx_inventory_movements_reference ON inventory_movements(reference_type, reference_id)",
    "CREATE INDEX idx_deposits_producer_product ON deposits(producer_id, product_id)",
    "CREATE INDEX idx_deposit_details_deposit ON deposit_liquidation_details(deposit_id)",
    "CREATE INDEX idx_sale_commitments_buyer_product ON sale_commitments(buyer_id, product_id)",
    "CREATE INDEX idx_sale_details_commitment ON sale_liquidation_details(commitment_id)",
];
