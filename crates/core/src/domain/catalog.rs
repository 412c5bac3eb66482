use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const WEI_DECIMALS: u32 = 18;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Electronics,
    Clothing,
    Toys,
    Other(String),
}

impl Category {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "electronics" => Self::Electronics,
            "clothing" => Self::Clothing,
            "toys" => Self::Toys,
            _ => Self::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Electronics => "electronics",
            Self::Clothing => "clothing",
            Self::Toys => "toys",
            Self::Other(name) => name.as_str(),
        }
    }

    /// Section header used when the catalog is rendered for the model.
    pub fn header(&self) -> String {
        match self {
            Self::Electronics => "📱 Electronics & Gadgets".to_string(),
            Self::Clothing => "👔 Clothing & Jewelry".to_string(),
            Self::Toys => "🎮 Toys & Gaming".to_string(),
            Self::Other(name) => format!("🛍️ {}", title_case(name)),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: EntryId,
    pub name: String,
    pub category: Category,
    pub price_wei: u128,
    pub rating: u8,
    pub stock: u64,
}

impl CatalogEntry {
    /// Slot 0 is the ledger's "never listed" marker.
    pub fn is_listed(&self) -> bool {
        self.id.0 != 0
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    pub fn price_ether(&self) -> String {
        format_ether(self.price_wei)
    }

    pub fn stars(&self) -> String {
        "⭐".repeat(usize::from(self.rating.clamp(1, 5)))
    }
}

/// Renders a wei amount in ETH, keeping at least one fractional digit
/// (`1.0`, `0.25`, `2.125`).
pub fn format_ether(wei: u128) -> String {
    let rendered = i128::try_from(wei)
        .ok()
        .and_then(|value| Decimal::try_from_i128_with_scale(value, WEI_DECIMALS).ok())
        .map(|value| value.normalize().to_string());

    match rendered {
        Some(text) if text.contains('.') => text,
        Some(text) => format!("{text}.0"),
        None => format_ether_fallback(wei),
    }
}

fn format_ether_fallback(wei: u128) -> String {
    let unit = 10u128.pow(WEI_DECIMALS);
    let whole = wei / unit;
    let fraction = format!("{:018}", wei % unit);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{fraction}")
    }
}

fn title_case(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Point-in-time view of every listed entry, bucketed by category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CatalogSnapshot {
    buckets: BTreeMap<Category, Vec<CatalogEntry>>,
}

impl CatalogSnapshot {
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut snapshot = Self::default();
        for entry in entries {
            snapshot.push(entry);
        }
        snapshot
    }

    pub fn push(&mut self, entry: CatalogEntry) {
        self.buckets.entry(entry.category.clone()).or_default().push(entry);
    }

    pub fn categories(&self) -> impl Iterator<Item = (&Category, &[CatalogEntry])> {
        self.buckets.iter().map(|(category, entries)| (category, entries.as_slice()))
    }

    pub fn entries_in(&self, category: &Category) -> &[CatalogEntry] {
        self.buckets.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.buckets.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{format_ether, CatalogEntry, CatalogSnapshot, Category, EntryId};

    fn entry(id: u64, name: &str, category: &str) -> CatalogEntry {
        CatalogEntry {
            id: EntryId(id),
            name: name.to_string(),
            category: Category::parse(category),
            price_wei: 1_000_000_000_000_000_000,
            rating: 4,
            stock: 3,
        }
    }

    #[test]
    fn format_ether_keeps_one_fractional_digit() {
        assert_eq!(format_ether(1_000_000_000_000_000_000), "1.0");
        assert_eq!(format_ether(2_000_000_000_000_000_000), "2.0");
        assert_eq!(format_ether(250_000_000_000_000_000), "0.25");
        assert_eq!(format_ether(100_000_000_000_000_000), "0.1");
        assert_eq!(format_ether(0), "0.0");
        assert_eq!(format_ether(1), "0.000000000000000001");
    }

    #[test]
    fn format_ether_handles_amounts_beyond_decimal_range() {
        assert_eq!(format_ether(u128::MAX), "340282366920938463463.374607431768211455");
    }

    #[test]
    fn category_parse_is_case_insensitive_and_extensible() {
        assert_eq!(Category::parse(" Electronics "), Category::Electronics);
        assert_eq!(Category::parse("TOYS"), Category::Toys);
        assert_eq!(Category::parse("Books"), Category::Other("books".to_string()));
        assert_eq!(Category::parse("books").header(), "🛍️ Books");
    }

    #[test]
    fn stars_are_clamped_to_rating_range() {
        let mut sample = entry(1, "Camera", "electronics");
        sample.rating = 0;
        assert_eq!(sample.stars(), "⭐");
        sample.rating = 9;
        assert_eq!(sample.stars().chars().count(), 5);
    }

    #[test]
    fn snapshot_orders_known_categories_first_and_keeps_entry_order() {
        let snapshot = CatalogSnapshot::from_entries(vec![
            entry(1, "Kite", "toys"),
            entry(2, "Novel", "books"),
            entry(3, "Camera", "electronics"),
            entry(4, "Robot Set", "toys"),
        ]);

        let order: Vec<&str> =
            snapshot.categories().map(|(category, _)| category.as_str()).collect();
        assert_eq!(order, vec!["electronics", "toys", "books"]);

        let toys: Vec<&str> =
            snapshot.entries_in(&Category::Toys).iter().map(|e| e.name.as_str()).collect();
        assert_eq!(toys, vec!["Kite", "Robot Set"]);
        assert_eq!(snapshot.len(), 4);
        assert!(snapshot.entries_in(&Category::Clothing).is_empty());
    }

    #[test]
    fn snapshot_serializes_as_category_keyed_map() {
        let snapshot = CatalogSnapshot::from_entries(vec![
            entry(2, "Novel", "books"),
            entry(3, "Camera", "electronics"),
        ]);

        let value = serde_json::to_value(&snapshot).expect("serialize");

        assert_eq!(value["books"][0]["name"], "Novel");
        assert_eq!(value["electronics"][0]["category"], "electronics");
    }
}
