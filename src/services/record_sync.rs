//! Duplicate-free persistence of records to the remote store.
//!
//! The central correctness property of the engine: editing a record must
//! never create a second row. Kinds with a stable key are written with a
//! single keyed upsert (or a plain insert for drafts, letting the store
//! assign the key). Kinds that never got a key fall back to reading the
//! whole set, replacing the one logical record by content match, and
//! rewriting everything, a last resort that is not safe under
//! concurrent writers, and logged as such on every use.

use std::sync::Arc;

use serde_json::Value;
use strum::Display;
use tracing::{error, info, instrument, warn};

use crate::errors::ServiceError;
use crate::store::{Filter, Row, TableStore};

/// The record families the engine persists. Each kind declares its
/// table, its stable key if it has one, and, for keyless kinds, the
/// columns that identify one logical record during a full replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Reservations,
    Customers,
    InventoryItems,
    Costs,
    Vehicles,
    Checklist,
}

impl EntityKind {
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Reservations => "reservations",
            EntityKind::Customers => "customers",
            EntityKind::InventoryItems => "inventory_items",
            EntityKind::Costs => "costs",
            EntityKind::Vehicles => "vehicles",
            EntityKind::Checklist => "checklist",
        }
    }

    /// Stable key column, if the kind has one. New kinds must declare a
    /// key; `None` is reserved for legacy tables that have not been
    /// migrated yet.
    pub fn conflict_key(&self) -> Option<&'static str> {
        match self {
            EntityKind::Vehicles => Some("plate"),
            EntityKind::Checklist => None,
            _ => Some("id"),
        }
    }

    /// Columns that identify one logical record of a keyless kind.
    pub fn identity_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Checklist => &["equipment", "item"],
            _ => &[],
        }
    }
}

pub struct RecordSyncManager {
    store: Arc<dyn TableStore>,
}

impl RecordSyncManager {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Persists one record without ever duplicating it. Returns the
    /// stored representation, key populated, so the caller can target
    /// the same row on subsequent edits.
    #[instrument(skip(self, record), fields(kind = %kind))]
    pub async fn save(&self, kind: EntityKind, record: Row) -> Result<Row, ServiceError> {
        match kind.conflict_key() {
            Some(key) => {
                let keyed = record
                    .get(key)
                    .map(|v| !v.is_null())
                    .unwrap_or(false);
                if keyed {
                    let rows = self
                        .store
                        .upsert(kind.table(), vec![record], key)
                        .await?;
                    self.single_row(kind, rows, "upsert")
                } else {
                    let mut record = record;
                    record.remove(key);
                    let rows = self.store.insert(kind.table(), vec![record]).await?;
                    let stored = self.single_row(kind, rows, "insert")?;
                    if stored.get(key).map(Value::is_null).unwrap_or(true) {
                        return Err(ServiceError::InternalError(format!(
                            "store did not assign '{}' on insert into '{}'",
                            key,
                            kind.table()
                        )));
                    }
                    info!(table = kind.table(), "record inserted with new key");
                    Ok(stored)
                }
            }
            None => self.save_full_replace(kind, record).await,
        }
    }

    /// Full-table replace for keyless kinds: the second writer wins and
    /// silently discards the first writer's change. Kept only until the
    /// remaining legacy tables get a proper key.
    async fn save_full_replace(&self, kind: EntityKind, record: Row) -> Result<Row, ServiceError> {
        warn!(
            table = kind.table(),
            "no stable key; using full-table replace, unsafe under concurrent writers"
        );
        let mut rows = self.store.select(kind.table(), &[]).await?;

        let identity = kind.identity_columns();
        let position = rows.iter().position(|row| {
            !identity.is_empty() && identity.iter().all(|col| row.get(*col) == record.get(*col))
        });
        match position {
            Some(i) => rows[i] = record.clone(),
            None => rows.push(record.clone()),
        }

        self.store.delete(kind.table(), &[]).await?;
        if let Err(err) = self.store.insert(kind.table(), rows).await {
            error!(
                table = kind.table(),
                error = %err,
                "reinsert after full-table delete failed; the table is left empty"
            );
            return Err(err.into());
        }
        Ok(record)
    }

    /// Deletes the row addressed by the kind's stable key. `NotFound`
    /// when no row matched, so callers can prompt a refresh instead of
    /// retrying blindly.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn delete(&self, kind: EntityKind, key_value: Value) -> Result<(), ServiceError> {
        let key = kind.conflict_key().ok_or_else(|| {
            ServiceError::InvalidInput(format!(
                "cannot delete from '{}' by key: the kind has no stable key",
                kind.table()
            ))
        })?;
        let removed = self
            .store
            .delete(kind.table(), &[Filter::eq(key, key_value.clone())])
            .await?;
        if removed == 0 {
            return Err(ServiceError::NotFound(format!(
                "{} with {} = {} not found",
                kind, key, key_value
            )));
        }
        Ok(())
    }

    /// Fetches the single row addressed by the kind's stable key.
    pub async fn fetch(&self, kind: EntityKind, key_value: Value) -> Result<Row, ServiceError> {
        let key = kind.conflict_key().ok_or_else(|| {
            ServiceError::InvalidInput(format!(
                "cannot fetch from '{}' by key: the kind has no stable key",
                kind.table()
            ))
        })?;
        let rows = self
            .store
            .select(kind.table(), &[Filter::eq(key, key_value.clone())])
            .await?;
        rows.into_iter().next().ok_or_else(|| {
            ServiceError::NotFound(format!("{} with {} = {} not found", kind, key, key_value))
        })
    }

    pub async fn fetch_all(&self, kind: EntityKind) -> Result<Vec<Row>, ServiceError> {
        Ok(self.store.select(kind.table(), &[]).await?)
    }

    fn single_row(
        &self,
        kind: EntityKind,
        rows: Vec<Row>,
        op: &str,
    ) -> Result<Row, ServiceError> {
        rows.into_iter().next().ok_or_else(|| {
            ServiceError::InternalError(format!(
                "store returned no representation for {} into '{}'",
                op,
                kind.table()
            ))
        })
    }
}
