//! Date-based availability of inventory items.
//!
//! Pure computation over an in-memory snapshot: collect the normalized
//! item names of every reservation on the target day, then report the
//! inventory items whose normalized name is not among them.

use std::collections::HashSet;

use chrono::NaiveDate;

use super::name_normalizer::normalize;
use crate::models::{InventoryItem, Reservation};

#[derive(Debug, Clone)]
pub struct AvailabilityResult {
    /// Items free on the target date.
    pub available: Vec<InventoryItem>,
    /// Normalized names committed to other reservations on that date.
    pub occupied_normalized_names: HashSet<String>,
    /// False when the requested date did not parse; availability is then
    /// reported as full and the caller must surface the parse failure.
    pub date_recognized: bool,
}

/// Lenient calendar-day parser for user-entered dates: ISO `%Y-%m-%d`
/// (an appended time component is discarded) or the legacy `%d/%m/%Y`.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let day = trimmed
        .split(|c: char| c == 'T' || c.is_whitespace())
        .next()
        .unwrap_or("");
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day, "%d/%m/%Y"))
        .ok()
}

/// Resolves availability for `target_date` against a reservation
/// snapshot. `exclude_reservation_id` keeps a reservation being edited
/// from blocking its own items. Blank names never block and are never
/// blocked.
pub fn resolve(
    target_date: Option<NaiveDate>,
    inventory: &[InventoryItem],
    reservations: &[Reservation],
    exclude_reservation_id: Option<i64>,
) -> AvailabilityResult {
    let mut occupied = HashSet::new();
    if let Some(date) = target_date {
        for reservation in reservations {
            if reservation.date != date {
                continue;
            }
            if reservation.id.is_some() && reservation.id == exclude_reservation_id {
                continue;
            }
            for name in &reservation.item_names {
                let key = normalize(name);
                if !key.is_empty() {
                    occupied.insert(key);
                }
            }
        }
    }

    let available = inventory
        .iter()
        .filter(|item| {
            let key = normalize(&item.name);
            key.is_empty() || !occupied.contains(&key)
        })
        .cloned()
        .collect();

    AvailabilityResult {
        available,
        occupied_normalized_names: occupied,
        date_recognized: target_date.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemCategory, ItemStatus, PaymentStatus};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn item(id: i64, name: &str) -> InventoryItem {
        InventoryItem {
            id: Some(id),
            name: name.to_string(),
            unit_price: dec!(300),
            category: ItemCategory::Traditional,
            status: ItemStatus::Available,
        }
    }

    fn reservation(id: i64, date: &str, items: &[&str]) -> Reservation {
        Reservation {
            id: Some(id),
            customer_id: 1,
            item_names: items.iter().map(|s| s.to_string()).collect(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            delivery_time: None,
            pickup_time: None,
            party_start: None,
            party_end: None,
            extra_fee: Decimal::ZERO,
            freight: Decimal::ZERO,
            discount: Decimal::ZERO,
            total: dec!(300),
            amount_paid: Decimal::ZERO,
            balance_due: dec!(300),
            status: PaymentStatus::Pending,
            note: None,
        }
    }

    #[test]
    fn item_booked_on_the_date_is_unavailable() {
        let inventory = vec![item(1, "Trampoline"), item(2, "Ball Pit")];
        let reservations = vec![reservation(10, "2025-06-10", &["Trampoline"])];

        let on_the_day = resolve(parse_day("2025-06-10"), &inventory, &reservations, None);
        let names: Vec<_> = on_the_day.available.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Ball Pit"]);

        let next_day = resolve(parse_day("2025-06-11"), &inventory, &reservations, None);
        assert_eq!(next_day.available.len(), 2);
    }

    #[test]
    fn accents_and_punctuation_do_not_hide_a_conflict() {
        let inventory = vec![item(1, "Cama Elástica 2,44")];
        let reservations = vec![reservation(10, "2025-06-10", &["cama elastica 244"])];

        let result = resolve(parse_day("2025-06-10"), &inventory, &reservations, None);
        assert!(result.available.is_empty());
    }

    #[test]
    fn edited_reservation_does_not_block_itself() {
        let inventory = vec![item(1, "Trampoline")];
        let reservations = vec![
            reservation(10, "2025-06-10", &["Trampoline"]),
            reservation(11, "2025-06-10", &["Ball Pit"]),
        ];

        let excluding_self = resolve(
            parse_day("2025-06-10"),
            &inventory,
            &reservations,
            Some(10),
        );
        assert_eq!(excluding_self.available.len(), 1);

        let excluding_other = resolve(
            parse_day("2025-06-10"),
            &inventory,
            &reservations,
            Some(11),
        );
        assert!(excluding_other.available.is_empty());
    }

    #[test]
    fn blank_names_never_block() {
        let inventory = vec![item(1, "  "), item(2, "Trampoline")];
        let reservations = vec![reservation(10, "2025-06-10", &["  ", "---"])];

        let result = resolve(parse_day("2025-06-10"), &inventory, &reservations, None);
        assert_eq!(result.available.len(), 2);
        assert!(result.occupied_normalized_names.is_empty());
    }

    #[test]
    fn unparseable_date_reports_full_availability_with_flag() {
        let inventory = vec![item(1, "Trampoline")];
        let reservations = vec![reservation(10, "2025-06-10", &["Trampoline"])];

        let result = resolve(parse_day("soonish"), &inventory, &reservations, None);
        assert!(!result.date_recognized);
        assert_eq!(result.available.len(), 1);
    }

    #[test]
    fn parse_day_accepts_legacy_and_timestamped_forms() {
        let expected = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        assert_eq!(parse_day("2025-06-10"), Some(expected));
        assert_eq!(parse_day("2025-06-10 00:00:00"), Some(expected));
        assert_eq!(parse_day("2025-06-10T14:30:00"), Some(expected));
        assert_eq!(parse_day("10/06/2025"), Some(expected));
        assert_eq!(parse_day("June 10th"), None);
        assert_eq!(parse_day(""), None);
    }
}
