use dappazon_core::domain::catalog::{CatalogSnapshot, EntryId};

use crate::{CatalogSource, LedgerError};

/// Reads slots `1..=count` one at a time and buckets the listed ones by
/// category. Any failed read fails the whole snapshot.
pub async fn read_snapshot(
    source: &dyn CatalogSource,
    count: u64,
) -> Result<CatalogSnapshot, LedgerError> {
    let mut snapshot = CatalogSnapshot::default();

    for id in 1..=count {
        if let Some(entry) = source.get_entry(EntryId(id)).await? {
            if entry.is_listed() {
                snapshot.push(entry);
            }
        }
    }

    tracing::debug!(
        event_name = "ledger.snapshot.read",
        slots = count,
        entries = snapshot.len(),
        "catalog snapshot read"
    );

    Ok(snapshot)
}
