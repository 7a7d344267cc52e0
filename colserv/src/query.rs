//! The query engine: local reads plus relation fan-out.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::registry::ServiceRegistry;
use crate::resource::Resource;
use crate::store::{CollectionStore, Record, strip_internal};

/// Read-side engine over one collection store.
pub struct QueryEngine {
    store: Arc<CollectionStore>,
    registry: Arc<ServiceRegistry>,
    client: reqwest::Client,
    relation_retry_attempts: u32,
}

impl QueryEngine {
    pub fn new(
        store: Arc<CollectionStore>,
        registry: Arc<ServiceRegistry>,
        client: reqwest::Client,
        relation_retry_attempts: u32,
    ) -> Self {
        Self {
            store,
            registry,
            client,
            relation_retry_attempts,
        }
    }

    /// Every record in the collection, stripped of internal fields.
    pub fn get_all(&self) -> Result<Vec<Record>> {
        let records = self
            .store
            .records()
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        Ok(records.iter().map(strip_internal).collect())
    }

    /// Records matching a comma-separated id list from the request path.
    ///
    /// A bare id yields a single object; the presence of a comma anywhere in
    /// the raw list (including a leading or trailing one) forces an array,
    /// so `,5` is how callers ask for array shape with one id.
    pub fn get_by_ids(&self, raw_ids: &str) -> Result<Value> {
        let ids: Vec<&str> = raw_ids.split(',').collect();
        let matched = self
            .store
            .find_by_ids(&ids)
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

        if matched.is_empty() {
            return Err(Error::NotFound);
        }

        if raw_ids.contains(',') {
            Ok(Value::Array(
                matched
                    .iter()
                    .map(|record| Value::Object(strip_internal(record)))
                    .collect(),
            ))
        } else {
            Ok(Value::Object(strip_internal(&matched[0])))
        }
    }

    /// Records of `related` referenced by the base records in `raw_ids`.
    ///
    /// Collects each base record's internal `_<singular>Ids` array and
    /// delegates the lookup to the service that owns the related collection.
    /// Repeats in the collected ids are preserved, there is no
    /// de-duplication. The remote response is passed through verbatim.
    pub async fn get_related(&self, raw_ids: &str, related: &str) -> Result<Value> {
        let ids: Vec<&str> = raw_ids.split(',').collect();
        let matched = self
            .store
            .find_by_ids(&ids)
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

        let foreign_key = Resource::related_key(related);
        let mut related_ids: Vec<String> = Vec::new();
        for record in &matched {
            if let Some(Value::Array(values)) = record.get(&foreign_key) {
                related_ids.extend(values.iter().filter_map(id_as_string));
            }
        }

        if related_ids.is_empty() {
            return Err(Error::NotFound);
        }

        let base_url = self
            .registry
            .resolve(related)
            .ok_or_else(|| Error::UnknownRelation(related.to_string()))?;

        // The leading comma forces the remote service to answer with array
        // shape even when a single id remains.
        let url = format!("{base_url}/{related}/,{}", related_ids.join(","));
        self.fan_out(&url).await
    }

    async fn fan_out(&self, url: &str) -> Result<Value> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.fetch(url).await {
                Ok(body) => {
                    debug!(%url, attempt, "relation fan-out succeeded");
                    return Ok(body);
                }
                Err(error) if attempt <= self.relation_retry_attempts => {
                    warn!(%url, attempt, %error, "relation fan-out failed, retrying");
                }
                Err(error) => {
                    warn!(%url, attempt, %error, "relation fan-out failed");
                    return Err(Error::Upstream(error));
                }
            }
        }
    }

    async fn fetch(&self, url: &str) -> std::result::Result<Value, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
    }
}

/// Render a foreign-key array element as an id string.
fn id_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
