pub mod customer;
pub mod inventory_item;
pub mod reservation;

pub use customer::Customer;
pub use inventory_item::{InventoryItem, ItemCategory, ItemStatus};
pub use reservation::{BookingDraft, PaymentStatus, Reservation, ReservationPatch};

pub(crate) mod wire {
    //! Serde helpers for the legacy tabular-store column formats.

    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const TIME_FORMAT: &str = "%H:%M";

    /// `Option<NaiveTime>` as `"HH:MM"`, with the legacy empty string
    /// accepted as absent.
    pub mod time_format {
        use super::*;

        pub fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(t) => serializer.serialize_str(&t.format(TIME_FORMAT).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(s) => NaiveTime::parse_from_str(s, TIME_FORMAT)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
            }
        }
    }

    /// `Vec<String>` as the legacy comma-joined item list column.
    pub mod item_list {
        use super::*;

        pub fn serialize<S>(value: &[String], serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(&value.join(", "))
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = String::deserialize(deserializer)?;
            Ok(raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect())
        }
    }
}
