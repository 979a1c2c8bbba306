use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Freight pricing tier of an inventory item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ItemCategory {
    #[default]
    Traditional,
    Specialized,
}

/// Static item status maintained by the back office.
///
/// Informational only: actual availability is derived from the
/// reservation set for a given date, never from this flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ItemStatus {
    #[default]
    Available,
    Unavailable,
}

/// A rentable piece of inventory. Read-only to the booking engine;
/// created and edited elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub category: ItemCategory,
    #[serde(default)]
    pub status: ItemStatus,
}
