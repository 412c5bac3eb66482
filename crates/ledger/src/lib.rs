use async_trait::async_trait;
use thiserror::Error;

use dappazon_core::domain::catalog::{CatalogEntry, EntryId};

pub mod abi;
pub mod contract;
pub mod memory;
pub mod snapshot;

pub use contract::ContractCatalog;
pub use memory::{demo_entries, InMemoryCatalog};
pub use snapshot::read_snapshot;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger transport error: {0}")]
    Transport(String),
    #[error("ledger rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("ledger decode error: {0}")]
    Decode(String),
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl From<abi::AbiError> for LedgerError {
    fn from(value: abi::AbiError) -> Self {
        Self::Decode(value.to_string())
    }
}

/// Read handle onto the marketplace contract's item table.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Returns `None` for a slot that was never listed.
    async fn get_entry(&self, id: EntryId) -> Result<Option<CatalogEntry>, LedgerError>;

    /// Cheap reachability probe; returns the latest block number.
    async fn ping(&self) -> Result<u64, LedgerError>;
}
