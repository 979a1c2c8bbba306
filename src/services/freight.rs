//! Distance-based freight pricing.
//!
//! Resolves origin and destination postal codes to coordinates through
//! an external geocoding lookup, measures the great-circle distance, and
//! prices it with the configured per-km rate table. Every failure mode
//! of the lookup (bad postal code, provider error, timeout) degrades to
//! [`FreightOutcome::Unavailable`]: freight automation must never block
//! a booking, the user enters the amount manually instead.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::{FreightConfig, GeocodingConfig};
use crate::errors::ServiceError;
use crate::models::ItemCategory;

static NON_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D").expect("valid regex"));

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Result of a freight computation. `Unavailable` is a normal outcome,
/// not an error: the caller falls back to manual entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FreightOutcome {
    Computed { amount: Decimal, distance_km: f64 },
    Unavailable,
}

/// Postal-code to coordinates lookup.
///
/// Implementations must tolerate malformed or unknown postal codes by
/// returning `Ok(None)`; `Err` is reserved for transport-level failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeocodeClient: Send + Sync {
    async fn lookup(&self, postal_code: &str) -> Result<Option<Coordinates>, ServiceError>;
}

/// Nominatim-style geocoding client
/// (`GET {base}/search?postalcode=..&country=..&format=json`).
pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
    country: String,
}

impl NominatimClient {
    pub fn new(config: &GeocodingConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.lookup_timeout())
            .build()
            .map_err(|e| ServiceError::InternalError(format!("http client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            country: config.country.clone(),
        })
    }
}

#[async_trait]
impl GeocodeClient for NominatimClient {
    async fn lookup(&self, postal_code: &str) -> Result<Option<Coordinates>, ServiceError> {
        let digits = NON_DIGIT.replace_all(postal_code.trim(), "").into_owned();
        if digits.is_empty() {
            return Ok(None);
        }

        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("postalcode", digits.as_str()),
                ("country", self.country.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("geocoding: {}", e)))?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "geocoding lookup rejected");
            return Ok(None);
        }

        let results: Vec<Value> = response
            .json()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("geocoding: {}", e)))?;

        // Nominatim returns lat/lon as JSON strings.
        let coords = results.first().and_then(|first| {
            let latitude = first.get("lat")?.as_str()?.parse().ok()?;
            let longitude = first.get("lon")?.as_str()?.parse().ok()?;
            Some(Coordinates {
                latitude,
                longitude,
            })
        });
        Ok(coords)
    }
}

/// Haversine great-circle distance in kilometers.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = (to.latitude - from.latitude).to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

pub struct DistancePricingService {
    geocoder: Arc<dyn GeocodeClient>,
    lookup_budget: Duration,
    rates: FreightConfig,
}

impl DistancePricingService {
    pub fn new(geocoder: Arc<dyn GeocodeClient>, lookup_budget: Duration, rates: FreightConfig) -> Self {
        Self {
            geocoder,
            lookup_budget,
            rates,
        }
    }

    /// Per-km rate for a selection: the specialized rate as soon as one
    /// specialized item is in the mix, the base rate otherwise.
    pub fn rate_for(&self, categories: &[ItemCategory]) -> Decimal {
        if categories.contains(&ItemCategory::Specialized) {
            self.rates.specialized_rate_per_km
        } else {
            self.rates.base_rate_per_km
        }
    }

    /// Computes the freight surcharge between two postal codes.
    ///
    /// Each lookup is bounded by the configured budget; the future is
    /// cancel-safe, so a caller abandoning the form simply drops it.
    #[instrument(skip(self, categories))]
    pub async fn compute_freight(
        &self,
        origin: &str,
        destination: &str,
        categories: &[ItemCategory],
    ) -> FreightOutcome {
        let from = match self.locate(origin).await {
            Some(c) => c,
            None => return FreightOutcome::Unavailable,
        };
        let to = match self.locate(destination).await {
            Some(c) => c,
            None => return FreightOutcome::Unavailable,
        };

        let distance_km = haversine_km(from, to);
        let rate = self.rate_for(categories);
        let amount = match Decimal::from_f64(distance_km) {
            Some(d) => (d * rate).round_dp(2),
            None => {
                warn!(distance_km, "distance did not convert to a money amount");
                return FreightOutcome::Unavailable;
            }
        };
        debug!(distance_km, %amount, "freight computed");
        FreightOutcome::Computed {
            amount,
            distance_km,
        }
    }

    async fn locate(&self, postal_code: &str) -> Option<Coordinates> {
        match tokio::time::timeout(self.lookup_budget, self.geocoder.lookup(postal_code)).await {
            Ok(Ok(Some(coords))) => Some(coords),
            Ok(Ok(None)) => {
                warn!(postal_code, "postal code did not resolve to coordinates");
                None
            }
            Ok(Err(err)) => {
                warn!(postal_code, error = %err, "geocoding lookup failed");
                None
            }
            Err(_) => {
                warn!(postal_code, "geocoding lookup timed out");
                None
            }
        }
    }
}
