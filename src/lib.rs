//! Booking engine for an events rental business.
//!
//! The engine answers four questions for the layer above it (forms,
//! reports, whatever drives it): which inventory items are free on a
//! date, what a selection costs including distance-priced freight, where
//! a reservation stands in its payment lifecycle, and how to persist all
//! of it to a remote tabular store without creating duplicates.
//!
//! [`BookingService`] is the front door; the individual services under
//! [`services`] are usable on their own where the caller only needs one
//! of them.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod errors;
pub mod events;
pub mod models;
pub mod services;
pub mod store;

pub use config::{load_config, init_tracing, AppConfig};
pub use errors::ServiceError;
pub use events::{Event, EventSender};
pub use models::{
    BookingDraft, Customer, InventoryItem, ItemCategory, ItemStatus, PaymentStatus, Reservation,
    ReservationPatch,
};
pub use services::availability::AvailabilityResult;
pub use services::bookings::{BookingService, QuoteRequest};
pub use services::freight::{FreightOutcome, GeocodeClient, NominatimClient};
pub use services::pricing::{FreightSource, Quote};
pub use services::record_sync::{EntityKind, RecordSyncManager};
pub use store::{InMemoryTableStore, RestTableStore, TableStore};
