pub mod availability;
pub mod bookings;
pub mod freight;
pub mod lifecycle;
pub mod name_normalizer;
pub mod pricing;
pub mod record_sync;
