#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use booking_engine::config::{FreightConfig, GeocodingConfig};
use booking_engine::services::freight::{Coordinates, GeocodeClient};
use booking_engine::store::{Row, TableStore};
use booking_engine::{BookingService, InMemoryTableStore, ServiceError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

pub const ORIGIN_POSTAL: &str = "09060-390";
pub const NEARBY_POSTAL: &str = "09571-330";

/// Geocoder backed by a fixed postal-code table; no network involved.
pub struct StubGeocoder;

#[async_trait]
impl GeocodeClient for StubGeocoder {
    async fn lookup(&self, postal_code: &str) -> Result<Option<Coordinates>, ServiceError> {
        let digits: String = postal_code.chars().filter(|c| c.is_ascii_digit()).collect();
        Ok(match digits.as_str() {
            // Santo André warehouse and a customer across town.
            "09060390" => Some(Coordinates {
                latitude: -23.6557,
                longitude: -46.5335,
            }),
            "09571330" => Some(Coordinates {
                latitude: -23.6250,
                longitude: -46.5650,
            }),
            _ => None,
        })
    }
}

/// Geocoder whose provider is unreachable.
pub struct DownGeocoder;

#[async_trait]
impl GeocodeClient for DownGeocoder {
    async fn lookup(&self, _postal_code: &str) -> Result<Option<Coordinates>, ServiceError> {
        Err(ServiceError::ExternalServiceError(
            "connection refused".to_string(),
        ))
    }
}

pub fn freight_config() -> FreightConfig {
    FreightConfig {
        origin_postal_code: ORIGIN_POSTAL.to_string(),
        base_rate_per_km: dec!(3),
        specialized_rate_per_km: dec!(5),
    }
}

pub fn engine(store: Arc<InMemoryTableStore>, geocoder: Arc<dyn GeocodeClient>) -> BookingService {
    BookingService::new(
        store,
        geocoder,
        &GeocodingConfig::default(),
        &freight_config(),
        None,
    )
}

fn row(value: Value) -> Row {
    value.as_object().expect("object literal").clone()
}

/// Seeds the catalog and one customer; returns the customer's id.
pub async fn seed_catalog(store: &InMemoryTableStore) -> i64 {
    store
        .insert(
            "inventory_items",
            vec![
                row(json!({
                    "name": "Cama Elástica 2,44",
                    "unit_price": "250.00",
                    "category": "traditional",
                    "status": "available",
                })),
                row(json!({
                    "name": "Piscina de Bolinha",
                    "unit_price": "300.00",
                    "category": "traditional",
                    "status": "available",
                })),
                row(json!({
                    "name": "Kit Montessori",
                    "unit_price": "400.00",
                    "category": "specialized",
                    "status": "available",
                })),
            ],
        )
        .await
        .expect("seed inventory");

    let customers = store
        .insert(
            "customers",
            vec![row(json!({
                "name": "Ana Souza",
                "postal_code": NEARBY_POSTAL,
            }))],
        )
        .await
        .expect("seed customer");
    customers[0]["id"].as_i64().expect("customer id")
}

pub fn money(value: &str) -> Decimal {
    value.parse().expect("decimal literal")
}
