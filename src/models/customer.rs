use serde::{Deserialize, Serialize};

/// A customer record. Read-only to the booking engine; the postal code
/// feeds freight distance pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub postal_code: Option<String>,
}
