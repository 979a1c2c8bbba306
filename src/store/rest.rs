//! PostgREST-style REST client for the remote tabular store.
//!
//! Filters map to `col=eq.value` query parameters; writes ask for the
//! stored representation back so callers see store-assigned keys.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use super::{Filter, Row, StoreError, TableStore};
use crate::config::StoreConfig;

const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_MERGE: &str = "resolution=merge-duplicates,return=representation";

pub struct RestTableStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestTableStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn headers(&self, prefer: &'static str) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|e| StoreError::Transport(format!("invalid api key header: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| StoreError::Transport(format!("invalid api key header: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("Prefer", HeaderValue::from_static(prefer));
        Ok(headers)
    }

    fn request(
        &self,
        method: Method,
        table: &str,
        prefer: &'static str,
    ) -> Result<RequestBuilder, StoreError> {
        Ok(self
            .http
            .request(method, self.table_url(table))
            .headers(self.headers(prefer)?))
    }

    fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
        filters
            .iter()
            .map(|f| {
                let rendered = match &f.value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (f.column.clone(), format!("eq.{}", rendered))
            })
            .collect()
    }

    async fn read_rows(table: &str, response: Response) -> Result<Vec<Row>, StoreError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(classify(table, status, body));
        }
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&body)?)
    }
}

fn classify(table: &str, status: StatusCode, body: String) -> StoreError {
    if status == StatusCode::CONFLICT {
        warn!(table, %status, "store reported a write conflict");
        return StoreError::Conflict(format!("[{}] {}", table, body));
    }
    StoreError::Rejected {
        status: status.as_u16(),
        body: format!("[{}] {}", table, body),
    }
}

#[async_trait::async_trait]
impl TableStore for RestTableStore {
    async fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, StoreError> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(Self::filter_params(filters));
        let response = self
            .request(Method::GET, table, PREFER_REPRESENTATION)?
            .query(&params)
            .send()
            .await?;
        let rows = Self::read_rows(table, response).await?;
        debug!(table, rows = rows.len(), "select");
        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        let response = self
            .request(Method::POST, table, PREFER_REPRESENTATION)?
            .json(&rows)
            .send()
            .await?;
        Self::read_rows(table, response).await
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        values: Row,
    ) -> Result<Vec<Row>, StoreError> {
        let response = self
            .request(Method::PATCH, table, PREFER_REPRESENTATION)?
            .query(&Self::filter_params(filters))
            .json(&values)
            .send()
            .await?;
        Self::read_rows(table, response).await
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Row>,
        conflict_key: &str,
    ) -> Result<Vec<Row>, StoreError> {
        let response = self
            .request(Method::POST, table, PREFER_MERGE)?
            .query(&[("on_conflict", conflict_key)])
            .json(&rows)
            .send()
            .await?;
        Self::read_rows(table, response).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, StoreError> {
        let response = self
            .request(Method::DELETE, table, PREFER_REPRESENTATION)?
            .query(&Self::filter_params(filters))
            .send()
            .await?;
        let rows = Self::read_rows(table, response).await?;
        Ok(rows.len() as u64)
    }
}
