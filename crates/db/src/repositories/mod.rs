//! Repository abstractions for ledger writes.
//!
//! Every operation loads the rows it needs inside one transaction, asks the
//! allocation engine for a plan and writes that plan before committing.
//! Balance reads lock their rows with `FOR UPDATE` on backends that support it.

pub mod contract;
mod convert;
pub mod deposit;
pub mod error;
pub mod inventory;
mod lock;
pub mod obligation;
pub mod reversal;
pub mod sale;
mod stock;

pub use contract::{
    ContractRepository, ContractSummary, CreateContractInput, DeliverInput, DeliveryReceipt,
};
pub use deposit::{
    DepositLiquidationReceipt, DepositReceipt, DepositRepository, LiquidateDepositsInput,
    RecordDepositInput,
};
pub use error::{LedgerStoreError, StoreResult};
pub use inventory::{
    AdjustLotInput, AdjustmentReceipt, InventoryRepository, PurchaseReceipt, RecordPurchaseInput,
    StockLevel, TransferInput, TransferReceipt,
};
pub use obligation::{
    ApplyOperationInput, ObligationRepository, ObligationSummary, OpenObligationInput,
    PostedMovement,
};
pub use reversal::ReversalRepository;
pub use sale::{CreateCommitmentInput, LiquidateSaleInput, SaleLiquidationReceipt, SaleRepository};
