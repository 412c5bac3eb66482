use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use dappazon_core::domain::catalog::{CatalogEntry, Category, EntryId};

use crate::{CatalogSource, LedgerError};

const ETHER: u128 = 1_000_000_000_000_000_000;
const FINNEY: u128 = ETHER / 1_000;

#[derive(Default)]
pub struct InMemoryCatalog {
    entries: RwLock<HashMap<u64, CatalogEntry>>,
    failure: Option<String>,
}

impl InMemoryCatalog {
    pub fn with_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let entries = entries.into_iter().map(|entry| (entry.id.0, entry)).collect();
        Self { entries: RwLock::new(entries), failure: None }
    }

    /// Every read fails with `LedgerError::Unavailable`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self { entries: RwLock::default(), failure: Some(reason.into()) }
    }

    pub async fn save(&self, entry: CatalogEntry) {
        let mut entries = self.entries.write().await;
        entries.insert(entry.id.0, entry);
    }

    fn check_available(&self) -> Result<(), LedgerError> {
        match &self.failure {
            Some(reason) => Err(LedgerError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn get_entry(&self, id: EntryId) -> Result<Option<CatalogEntry>, LedgerError> {
        self.check_available()?;
        let entries = self.entries.read().await;
        Ok(entries.get(&id.0).filter(|entry| entry.is_listed()).cloned())
    }

    async fn ping(&self) -> Result<u64, LedgerError> {
        self.check_available()?;
        Ok(0)
    }
}

/// The nine-item storefront the local deployment is seeded with.
pub fn demo_entries() -> Vec<CatalogEntry> {
    let entry = |id: u64, name: &str, category: Category, price_wei: u128, rating: u8, stock| {
        CatalogEntry { id: EntryId(id), name: name.to_string(), category, price_wei, rating, stock }
    };

    vec![
        entry(1, "Camera", Category::Electronics, ETHER, 4, 10),
        entry(2, "Drone", Category::Electronics, 2 * ETHER, 5, 6),
        entry(3, "Headset", Category::Electronics, 250 * FINNEY, 2, 24),
        entry(4, "Shoes", Category::Clothing, 250 * FINNEY, 5, 3),
        entry(5, "Sunglasses", Category::Clothing, 100 * FINNEY, 4, 12),
        entry(6, "Watch", Category::Clothing, 1_250 * FINNEY, 4, 0),
        entry(7, "Puzzle Cube", Category::Toys, 50 * FINNEY, 4, 15),
        entry(8, "Train Set", Category::Toys, 200 * FINNEY, 4, 0),
        entry(9, "Robot Set", Category::Toys, 150 * FINNEY, 3, 12),
    ]
}
