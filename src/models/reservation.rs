use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

use super::wire::{item_list, time_format};
use crate::errors::ServiceError;
use crate::store::Row;

/// Payment state of a reservation, derived from `total` vs `amount_paid`.
/// There is no cancelled state: cancellation is row deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Concluded,
}

/// A booking of one or more inventory items by a customer for a date.
///
/// `id` is the stable key assigned by the store on first insert; drafts
/// carry `None`. Items are referenced by display name and stored as the
/// legacy comma-joined column, a known weak point kept until the data
/// is migrated to item ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub customer_id: i64,
    #[serde(with = "item_list")]
    pub item_names: Vec<String>,
    pub date: NaiveDate,
    #[serde(default, with = "time_format")]
    pub delivery_time: Option<NaiveTime>,
    #[serde(default, with = "time_format")]
    pub pickup_time: Option<NaiveTime>,
    #[serde(default, with = "time_format")]
    pub party_start: Option<NaiveTime>,
    #[serde(default, with = "time_format")]
    pub party_end: Option<NaiveTime>,
    pub extra_fee: Decimal,
    pub freight: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Reservation {
    /// Wire representation for the tabular store.
    pub fn to_row(&self) -> Result<Row, ServiceError> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(ServiceError::SerializationError(format!(
                "reservation serialized to non-object value: {}",
                other
            ))),
        }
    }

    pub fn from_row(row: &Row) -> Result<Self, ServiceError> {
        Ok(serde_json::from_value(serde_json::Value::Object(
            row.clone(),
        ))?)
    }
}

/// Everything the booking form collects for a new reservation.
///
/// An explicit value object: the engine takes the draft as an argument
/// and never reads ambient session state. The date arrives as the raw
/// user-entered string and is parsed (leniently) by the engine so parse
/// failures surface as input errors.
#[derive(Debug, Clone, Validate)]
pub struct BookingDraft {
    pub customer_id: i64,
    #[validate(length(min = 1, message = "at least one item must be selected"))]
    pub item_names: Vec<String>,
    pub date: String,
    pub delivery_time: Option<NaiveTime>,
    pub pickup_time: Option<NaiveTime>,
    pub party_start: Option<NaiveTime>,
    pub party_end: Option<NaiveTime>,
    pub extra_fee: Decimal,
    pub discount: Decimal,
    /// Manually entered freight; wins over the automatic computation.
    pub freight_override: Option<Decimal>,
    /// Initial deposit, if any was taken at booking time.
    pub amount_paid: Decimal,
    pub note: Option<String>,
}

impl BookingDraft {
    pub fn new(customer_id: i64, item_names: Vec<String>, date: impl Into<String>) -> Self {
        Self {
            customer_id,
            item_names,
            date: date.into(),
            delivery_time: None,
            pickup_time: None,
            party_start: None,
            party_end: None,
            extra_fee: Decimal::ZERO,
            discount: Decimal::ZERO,
            freight_override: None,
            amount_paid: Decimal::ZERO,
            note: None,
        }
    }
}

/// Partial update applied to an existing reservation. `None` fields are
/// left untouched. Setting `amount_paid` replaces the paid amount
/// outright (payment corrections); incremental payments go through
/// `record_payment` instead.
#[derive(Debug, Clone, Default)]
pub struct ReservationPatch {
    pub item_names: Option<Vec<String>>,
    pub date: Option<String>,
    pub delivery_time: Option<NaiveTime>,
    pub pickup_time: Option<NaiveTime>,
    pub party_start: Option<NaiveTime>,
    pub party_end: Option<NaiveTime>,
    pub extra_fee: Option<Decimal>,
    pub freight: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub amount_paid: Option<Decimal>,
    pub note: Option<String>,
}
