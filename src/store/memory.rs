//! In-process [`TableStore`] used by tests and local development.
//!
//! Mimics the remote store's observable behavior: inserted rows without
//! an `id` get a store-assigned one, and upsert merges on the declared
//! conflict key.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::Mutex;

use super::{Filter, Row, StoreError, TableStore};

const KEY_COLUMN: &str = "id";

#[derive(Default)]
struct Table {
    rows: Vec<Row>,
    next_id: i64,
}

impl Table {
    fn assign_key(&mut self, mut row: Row) -> Row {
        let missing = row
            .get(KEY_COLUMN)
            .map(Value::is_null)
            .unwrap_or(true);
        if missing {
            self.next_id += 1;
            row.insert(KEY_COLUMN.to_string(), Value::from(self.next_id));
        } else if let Some(id) = row.get(KEY_COLUMN).and_then(Value::as_i64) {
            self.next_id = self.next_id.max(id);
        }
        row
    }
}

#[derive(Default)]
pub struct InMemoryTableStore {
    tables: Mutex<HashMap<String, Table>>,
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(row: &Row, filters: &[Filter]) -> bool {
    filters
        .iter()
        .all(|f| row.get(&f.column) == Some(&f.value))
}

#[async_trait::async_trait]
impl TableStore for InMemoryTableStore {
    async fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .get(table)
            .map(|t| {
                t.rows
                    .iter()
                    .filter(|r| matches(r, filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.tables.lock().await;
        let t = tables.entry(table.to_string()).or_default();
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let row = t.assign_key(row);
            t.rows.push(row.clone());
            stored.push(row);
        }
        Ok(stored)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        values: Row,
    ) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.tables.lock().await;
        let t = tables.entry(table.to_string()).or_default();
        let mut updated = Vec::new();
        for row in t.rows.iter_mut().filter(|r| matches(r, filters)) {
            for (k, v) in &values {
                row.insert(k.clone(), v.clone());
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Row>,
        conflict_key: &str,
    ) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.tables.lock().await;
        let t = tables.entry(table.to_string()).or_default();
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let key = row.get(conflict_key).filter(|v| !v.is_null()).cloned();
            let existing = key.as_ref().and_then(|key| {
                t.rows
                    .iter()
                    .position(|r| r.get(conflict_key) == Some(key))
            });
            match existing {
                Some(i) => {
                    t.rows[i] = row.clone();
                    stored.push(row);
                }
                None => {
                    let row = t.assign_key(row);
                    t.rows.push(row.clone());
                    stored.push(row);
                }
            }
        }
        Ok(stored)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().await;
        let t = tables.entry(table.to_string()).or_default();
        let before = t.rows.len();
        t.rows.retain(|r| !matches(r, filters));
        Ok((before - t.rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn insert_assigns_sequential_keys() {
        let store = InMemoryTableStore::new();
        let stored = store
            .insert(
                "reservations",
                vec![row(json!({"customer_id": 1})), row(json!({"customer_id": 2}))],
            )
            .await
            .unwrap();
        assert_eq!(stored[0].get("id"), Some(&json!(1)));
        assert_eq!(stored[1].get("id"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn upsert_replaces_the_row_with_a_matching_key() {
        let store = InMemoryTableStore::new();
        store
            .insert("reservations", vec![row(json!({"id": 5, "total": "100"}))])
            .await
            .unwrap();

        store
            .upsert(
                "reservations",
                vec![row(json!({"id": 5, "total": "250"}))],
                "id",
            )
            .await
            .unwrap();

        let rows = store.select("reservations", &[]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("total"), Some(&json!("250")));
    }

    #[tokio::test]
    async fn update_merges_values_into_matching_rows_only() {
        let store = InMemoryTableStore::new();
        store
            .insert(
                "reservations",
                vec![
                    row(json!({"id": 1, "note": "gate code 4711", "total": "100"})),
                    row(json!({"id": 2, "note": "call first"})),
                ],
            )
            .await
            .unwrap();

        let updated = store
            .update(
                "reservations",
                &[Filter::eq("id", 1)],
                row(json!({"note": "use the side entrance"})),
            )
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].get("note"), Some(&json!("use the side entrance")));
        // Columns not named in the patch survive.
        assert_eq!(updated[0].get("total"), Some(&json!("100")));

        let other = store
            .select("reservations", &[Filter::eq("id", 2)])
            .await
            .unwrap();
        assert_eq!(other[0].get("note"), Some(&json!("call first")));
    }

    #[tokio::test]
    async fn delete_reports_removed_count() {
        let store = InMemoryTableStore::new();
        store
            .insert(
                "reservations",
                vec![row(json!({"id": 1})), row(json!({"id": 2}))],
            )
            .await
            .unwrap();
        let removed = store
            .delete("reservations", &[Filter::eq("id", 1)])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.select("reservations", &[]).await.unwrap().len(), 1);
    }
}
