//! Monetary total computation for a reservation.
//!
//! Money is rounded to two decimal places once, at the point the total
//! is computed, not per-component, to avoid compounding rounding error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::InventoryItem;

/// Where a quote's freight amount came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreightSource {
    /// Derived from the distance lookup.
    Computed,
    /// Entered by the user; always wins over automation.
    ManualOverride,
    /// Automation was unavailable and no override was given; the quote
    /// carries zero freight and the user must fill it in.
    ManualRequired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub items_subtotal: Decimal,
    pub freight: Decimal,
    pub freight_source: FreightSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    pub total: Decimal,
}

/// Sum of the unit prices of a selection.
pub fn items_subtotal<'a>(selected: impl IntoIterator<Item = &'a InventoryItem>) -> Decimal {
    selected.into_iter().map(|item| item.unit_price).sum()
}

/// `max(subtotal + extra_fee + freight − discount, 0)`, rounded to
/// cents. A discount larger than the bill zeroes it out; a reservation
/// never carries a negative total.
pub fn compute_total(
    items_subtotal: Decimal,
    extra_fee: Decimal,
    freight: Decimal,
    discount: Decimal,
) -> Decimal {
    (items_subtotal + extra_fee + freight - discount)
        .max(Decimal::ZERO)
        .round_dp(2)
}
