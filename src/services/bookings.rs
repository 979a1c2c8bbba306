//! The booking engine's public surface.
//!
//! Orchestrates the pure pieces (availability, pricing, lifecycle) with
//! the I/O boundaries (store, geocoding). Every operation takes explicit
//! values (drafts, patches, ids) and never reads ambient state; the
//! stateless, page-redrawing UI on top re-sends everything each time.

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::availability::{self, AvailabilityResult};
use super::freight::{DistancePricingService, FreightOutcome, GeocodeClient};
use super::lifecycle;
use super::name_normalizer::normalize;
use super::pricing::{self, FreightSource, Quote};
use super::record_sync::{EntityKind, RecordSyncManager};
use crate::config::{FreightConfig, GeocodingConfig};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{BookingDraft, Customer, InventoryItem, Reservation, ReservationPatch};
use crate::store::{Row, TableStore};

/// Inputs for a price quote. The origin defaults to the configured
/// warehouse postal code when not given.
#[derive(Debug, Clone, Validate)]
pub struct QuoteRequest {
    #[validate(length(min = 1, message = "at least one item must be selected"))]
    pub item_names: Vec<String>,
    pub extra_fee: Decimal,
    pub discount: Decimal,
    /// Manually entered freight; wins over the automatic computation.
    pub freight_override: Option<Decimal>,
    pub origin_postal_code: Option<String>,
    pub destination_postal_code: Option<String>,
}

pub struct BookingService {
    sync: RecordSyncManager,
    freight: DistancePricingService,
    origin_postal_code: String,
    event_sender: Option<Arc<EventSender>>,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn TableStore>,
        geocoder: Arc<dyn GeocodeClient>,
        geocoding: &GeocodingConfig,
        freight: &FreightConfig,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            sync: RecordSyncManager::new(store),
            freight: DistancePricingService::new(
                geocoder,
                geocoding.lookup_timeout(),
                freight.clone(),
            ),
            origin_postal_code: freight.origin_postal_code.clone(),
            event_sender,
        }
    }

    /// Which items are free on `date`. The raw user-entered date string
    /// is parsed leniently; when it does not parse the result reports
    /// full availability with `date_recognized == false` so the caller
    /// can surface the problem.
    #[instrument(skip(self))]
    pub async fn check_availability(
        &self,
        date: &str,
        exclude_reservation_id: Option<i64>,
    ) -> Result<AvailabilityResult, ServiceError> {
        let target = availability::parse_day(date);
        if target.is_none() {
            warn!(date, "availability requested for an unrecognized date");
        }
        let inventory: Vec<InventoryItem> =
            rows_into(self.sync.fetch_all(EntityKind::InventoryItems).await?)?;
        let reservations: Vec<Reservation> =
            rows_into(self.sync.fetch_all(EntityKind::Reservations).await?)?;
        Ok(availability::resolve(
            target,
            &inventory,
            &reservations,
            exclude_reservation_id,
        ))
    }

    /// Prices a selection: item prices, extra fee, freight, discount.
    /// Freight automation failing is not an error: the quote comes back
    /// flagged `manual_required` with zero freight.
    #[instrument(skip(self, request))]
    pub async fn compute_quote(&self, request: QuoteRequest) -> Result<Quote, ServiceError> {
        request.validate()?;
        ensure_non_negative("extra fee", request.extra_fee)?;
        ensure_non_negative("discount", request.discount)?;
        if let Some(freight) = request.freight_override {
            ensure_non_negative("freight", freight)?;
        }

        let inventory: Vec<InventoryItem> =
            rows_into(self.sync.fetch_all(EntityKind::InventoryItems).await?)?;
        let selected = select_items(&inventory, &request.item_names)?;
        let subtotal = pricing::items_subtotal(selected.iter().copied());
        let categories: Vec<_> = selected.iter().map(|item| item.category).collect();

        let (freight, freight_source, distance_km) = match request.freight_override {
            Some(amount) => (amount, FreightSource::ManualOverride, None),
            None => {
                let origin = request
                    .origin_postal_code
                    .as_deref()
                    .unwrap_or(&self.origin_postal_code);
                match request.destination_postal_code.as_deref() {
                    Some(destination) if !destination.trim().is_empty() => {
                        match self
                            .freight
                            .compute_freight(origin, destination, &categories)
                            .await
                        {
                            FreightOutcome::Computed {
                                amount,
                                distance_km,
                            } => (amount, FreightSource::Computed, Some(distance_km)),
                            FreightOutcome::Unavailable => {
                                (Decimal::ZERO, FreightSource::ManualRequired, None)
                            }
                        }
                    }
                    _ => (Decimal::ZERO, FreightSource::ManualRequired, None),
                }
            }
        };

        let total = pricing::compute_total(subtotal, request.extra_fee, freight, request.discount);
        Ok(Quote {
            items_subtotal: subtotal,
            freight,
            freight_source,
            distance_km,
            total,
        })
    }

    /// Creates a reservation from a draft: availability check, pricing,
    /// initial settlement, persist. The returned reservation carries the
    /// store-assigned id; subsequent edits must target it.
    #[instrument(skip(self, draft), fields(customer_id = draft.customer_id))]
    pub async fn create_reservation(
        &self,
        draft: BookingDraft,
    ) -> Result<Reservation, ServiceError> {
        draft.validate()?;
        ensure_non_negative("extra fee", draft.extra_fee)?;
        ensure_non_negative("discount", draft.discount)?;
        ensure_non_negative("amount paid", draft.amount_paid)?;
        if let Some(freight) = draft.freight_override {
            ensure_non_negative("freight", freight)?;
        }
        let date = availability::parse_day(&draft.date).ok_or_else(|| {
            ServiceError::InvalidInput(format!("unrecognized date '{}'", draft.date))
        })?;

        let inventory: Vec<InventoryItem> =
            rows_into(self.sync.fetch_all(EntityKind::InventoryItems).await?)?;
        let reservations: Vec<Reservation> =
            rows_into(self.sync.fetch_all(EntityKind::Reservations).await?)?;
        let selected = select_items(&inventory, &draft.item_names)?;

        let snapshot = availability::resolve(Some(date), &inventory, &reservations, None);
        reject_conflicts(&draft.item_names, &snapshot, date)?;

        let customer = self.load_customer(draft.customer_id).await?;

        let subtotal = pricing::items_subtotal(selected.iter().copied());
        let categories: Vec<_> = selected.iter().map(|item| item.category).collect();
        let freight = match draft.freight_override {
            Some(amount) => amount,
            None => match customer.postal_code.as_deref() {
                Some(destination) if !destination.trim().is_empty() => {
                    match self
                        .freight
                        .compute_freight(&self.origin_postal_code, destination, &categories)
                        .await
                    {
                        FreightOutcome::Computed { amount, .. } => amount,
                        FreightOutcome::Unavailable => {
                            warn!(
                                customer_id = draft.customer_id,
                                "freight not auto-computed; booking proceeds with zero freight"
                            );
                            Decimal::ZERO
                        }
                    }
                }
                _ => Decimal::ZERO,
            },
        };

        let mut reservation = Reservation {
            id: None,
            customer_id: draft.customer_id,
            item_names: draft.item_names,
            date,
            delivery_time: draft.delivery_time,
            pickup_time: draft.pickup_time,
            party_start: draft.party_start,
            party_end: draft.party_end,
            extra_fee: draft.extra_fee,
            freight,
            discount: draft.discount,
            total: pricing::compute_total(subtotal, draft.extra_fee, freight, draft.discount),
            amount_paid: draft.amount_paid,
            balance_due: Decimal::ZERO,
            status: Default::default(),
            note: draft.note,
        };
        lifecycle::apply(&mut reservation);

        let stored = self
            .sync
            .save(EntityKind::Reservations, reservation.to_row()?)
            .await?;
        let persisted = Reservation::from_row(&stored)?;

        info!(
            reservation_id = persisted.id,
            customer_id = persisted.customer_id,
            %persisted.total,
            "reservation created"
        );
        if let Some(id) = persisted.id {
            self.emit(Event::ReservationCreated(id)).await;
        }
        Ok(persisted)
    }

    /// Registers a partial payment. Payments only ever increase the paid
    /// amount here; corrections go through `update_reservation`.
    #[instrument(skip(self))]
    pub async fn record_payment(
        &self,
        reservation_id: i64,
        amount: Decimal,
    ) -> Result<Reservation, ServiceError> {
        if amount <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "payment amount must be positive".to_string(),
            ));
        }

        let mut reservation = self.load_reservation(reservation_id).await?;
        reservation.amount_paid += amount;
        lifecycle::apply(&mut reservation);

        let stored = self
            .sync
            .save(EntityKind::Reservations, reservation.to_row()?)
            .await?;
        let persisted = Reservation::from_row(&stored)?;

        info!(
            reservation_id,
            %amount,
            status = %persisted.status,
            "payment recorded"
        );
        self.emit(Event::PaymentRecorded {
            reservation_id,
            amount,
        })
        .await;
        Ok(persisted)
    }

    /// Applies a partial edit to an existing reservation, re-deriving
    /// total, balance and status, and updating the same persisted row.
    #[instrument(skip(self, patch))]
    pub async fn update_reservation(
        &self,
        reservation_id: i64,
        patch: ReservationPatch,
    ) -> Result<Reservation, ServiceError> {
        let mut reservation = self.load_reservation(reservation_id).await?;

        if let Some(items) = patch.item_names {
            if items.is_empty() {
                return Err(ServiceError::InvalidInput(
                    "at least one item must be selected".to_string(),
                ));
            }
            reservation.item_names = items;
        }
        if let Some(raw) = patch.date.as_deref() {
            reservation.date = availability::parse_day(raw).ok_or_else(|| {
                ServiceError::InvalidInput(format!("unrecognized date '{}'", raw))
            })?;
        }
        if let Some(t) = patch.delivery_time {
            reservation.delivery_time = Some(t);
        }
        if let Some(t) = patch.pickup_time {
            reservation.pickup_time = Some(t);
        }
        if let Some(t) = patch.party_start {
            reservation.party_start = Some(t);
        }
        if let Some(t) = patch.party_end {
            reservation.party_end = Some(t);
        }
        if let Some(fee) = patch.extra_fee {
            ensure_non_negative("extra fee", fee)?;
            reservation.extra_fee = fee;
        }
        if let Some(freight) = patch.freight {
            ensure_non_negative("freight", freight)?;
            reservation.freight = freight;
        }
        if let Some(discount) = patch.discount {
            ensure_non_negative("discount", discount)?;
            reservation.discount = discount;
        }
        if let Some(paid) = patch.amount_paid {
            ensure_non_negative("amount paid", paid)?;
            reservation.amount_paid = paid;
        }
        if let Some(note) = patch.note {
            reservation.note = Some(note);
        }

        let inventory: Vec<InventoryItem> =
            rows_into(self.sync.fetch_all(EntityKind::InventoryItems).await?)?;
        let reservations: Vec<Reservation> =
            rows_into(self.sync.fetch_all(EntityKind::Reservations).await?)?;
        let selected = select_items(&inventory, &reservation.item_names)?;

        let snapshot = availability::resolve(
            Some(reservation.date),
            &inventory,
            &reservations,
            Some(reservation_id),
        );
        reject_conflicts(&reservation.item_names, &snapshot, reservation.date)?;

        let subtotal = pricing::items_subtotal(selected.iter().copied());
        reservation.total = pricing::compute_total(
            subtotal,
            reservation.extra_fee,
            reservation.freight,
            reservation.discount,
        );
        lifecycle::apply(&mut reservation);

        let stored = self
            .sync
            .save(EntityKind::Reservations, reservation.to_row()?)
            .await?;
        let persisted = Reservation::from_row(&stored)?;

        info!(reservation_id, status = %persisted.status, "reservation updated");
        self.emit(Event::ReservationUpdated(reservation_id)).await;
        Ok(persisted)
    }

    /// Removes the persisted row entirely (cancellation is deletion).
    #[instrument(skip(self))]
    pub async fn delete_reservation(&self, reservation_id: i64) -> Result<(), ServiceError> {
        self.sync
            .delete(EntityKind::Reservations, Value::from(reservation_id))
            .await?;
        info!(reservation_id, "reservation deleted");
        self.emit(Event::ReservationDeleted(reservation_id)).await;
        Ok(())
    }

    async fn load_reservation(&self, id: i64) -> Result<Reservation, ServiceError> {
        let row = self
            .sync
            .fetch(EntityKind::Reservations, Value::from(id))
            .await?;
        Reservation::from_row(&row)
    }

    async fn load_customer(&self, id: i64) -> Result<Customer, ServiceError> {
        let row = self
            .sync
            .fetch(EntityKind::Customers, Value::from(id))
            .await?;
        Ok(serde_json::from_value(Value::Object(row))?)
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(err) = sender.send(event).await {
                warn!(error = %err, "failed to send event");
            }
        }
    }
}

fn rows_into<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, ServiceError> {
    rows.into_iter()
        .map(|row| Ok(serde_json::from_value(Value::Object(row))?))
        .collect()
}

fn ensure_non_negative(label: &str, value: Decimal) -> Result<(), ServiceError> {
    if value < Decimal::ZERO {
        return Err(ServiceError::InvalidInput(format!(
            "{} must not be negative",
            label
        )));
    }
    Ok(())
}

/// Resolves requested display names against inventory by normalized
/// name. Unknown (or blank) names are input errors: the UI offers only
/// real items, so anything else is stale form state. Entries that
/// normalize to the same key are counted once.
fn select_items<'a>(
    inventory: &'a [InventoryItem],
    requested: &[String],
) -> Result<Vec<&'a InventoryItem>, ServiceError> {
    let mut selected = Vec::with_capacity(requested.len());
    let mut seen = HashSet::new();
    let mut unknown = Vec::new();
    for name in requested {
        let key = normalize(name);
        if key.is_empty() {
            unknown.push(name.clone());
            continue;
        }
        if !seen.insert(key.clone()) {
            continue;
        }
        match inventory.iter().find(|item| normalize(&item.name) == key) {
            Some(item) => selected.push(item),
            None => unknown.push(name.clone()),
        }
    }
    if !unknown.is_empty() {
        return Err(ServiceError::InvalidInput(format!(
            "unknown items: {}",
            unknown.join(", ")
        )));
    }
    Ok(selected)
}

fn reject_conflicts(
    requested: &[String],
    snapshot: &AvailabilityResult,
    date: chrono::NaiveDate,
) -> Result<(), ServiceError> {
    let blocked: Vec<_> = requested
        .iter()
        .filter(|name| {
            snapshot
                .occupied_normalized_names
                .contains(&normalize(name))
        })
        .cloned()
        .collect();
    if !blocked.is_empty() {
        return Err(ServiceError::Conflict(format!(
            "items not available on {}: {}",
            date,
            blocked.join(", ")
        )));
    }
    Ok(())
}
