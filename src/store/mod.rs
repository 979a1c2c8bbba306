//! Boundary with the remote tabular store.
//!
//! The store is row-set oriented: every operation addresses one table
//! with equality filters, and each call is independently atomic at
//! best; there is no multi-statement transaction guarantee.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ServiceError;

pub use memory::InMemoryTableStore;
pub use rest::RestTableStore;

/// One stored row, as a JSON object.
pub type Row = serde_json::Map<String, Value>;

/// An equality filter on a column (`col = value`).
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Failures at the store boundary, before translation into the
/// engine-level error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("conflicting write: {0}")]
    Conflict(String),

    #[error("store rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            StoreError::Serialization(e) => ServiceError::SerializationError(e.to_string()),
            other => ServiceError::ExternalServiceError(other.to_string()),
        }
    }
}

/// Simple select/insert/update/upsert/delete surface over the remote
/// tabular store. Implemented by the REST client in production and by
/// [`InMemoryTableStore`] in tests.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, StoreError>;

    /// Inserts rows; the returned representation carries store-assigned
    /// keys.
    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError>;

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        values: Row,
    ) -> Result<Vec<Row>, StoreError>;

    /// Update-or-insert keyed on `conflict_key`; repeating the call with
    /// the same key never produces a second row.
    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Row>,
        conflict_key: &str,
    ) -> Result<Vec<Row>, StoreError>;

    /// Deletes matching rows, returning how many were removed.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, StoreError>;
}
