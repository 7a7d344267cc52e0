//! The in-memory collection store.
//!
//! Exactly one store exists per instance. It is filled wholesale by the
//! bootstrap loader, mutated record-by-record by the event applier, and read
//! by the query engine and health reporter. Every operation takes the lock,
//! completes synchronously and returns; nothing suspends while holding it.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;

use crate::resource::Resource;

/// A record is an arbitrary JSON object.
pub type Record = serde_json::Map<String, Value>;

/// Errors raised by store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The collection cannot serve reads: either the last (re)load failed or
    /// no load has completed yet.
    #[error("{0}")]
    Unavailable(String),

    /// A mutation arrived before the first successful load.
    #[error("collection `{0}` not initialised")]
    NotInitialised(String),

    /// An update event carried no value for the collection's primary key.
    #[error("record is missing primary key `{0}`")]
    MissingPrimaryKey(String),
}

/// Store metadata snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatus {
    pub last_updated: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

struct Inner {
    /// `None` until the first successful wholesale load.
    data: Option<Vec<Record>>,
    last_updated: Option<DateTime<Utc>>,
    error_message: Option<String>,
}

/// The queryable record set for one resource, plus its freshness metadata.
pub struct CollectionStore {
    resource: Resource,
    inner: RwLock<Inner>,
}

impl CollectionStore {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            inner: RwLock::new(Inner {
                data: None,
                last_updated: None,
                error_message: None,
            }),
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Replace the whole record set, stamp the load time and clear any error.
    pub fn replace_all(&self, records: Vec<Record>) {
        let mut inner = self.inner.write();
        inner.data = Some(records);
        inner.last_updated = Some(Utc::now());
        inner.error_message = None;
    }

    /// Record a load failure. Existing data, if any, is left untouched.
    pub fn set_error(&self, message: impl Into<String>) {
        self.inner.write().error_message = Some(message.into());
    }

    pub fn status(&self) -> StoreStatus {
        let inner = self.inner.read();
        StoreStatus {
            last_updated: inner.last_updated,
            error_message: inner.error_message.clone(),
        }
    }

    /// Healthy iff populated at least once, stamped, and free of errors.
    pub fn is_healthy(&self) -> bool {
        let inner = self.inner.read();
        inner.data.is_some() && inner.last_updated.is_some() && inner.error_message.is_none()
    }

    /// Snapshot of every record.
    pub fn records(&self) -> Result<Vec<Record>, StoreError> {
        let inner = self.inner.read();
        Self::readable(&inner, &self.resource).map(|records| records.to_vec())
    }

    /// Snapshot of the records whose primary key is in `ids`.
    pub fn find_by_ids(&self, ids: &[&str]) -> Result<Vec<Record>, StoreError> {
        let key = self.resource.primary_key();
        let inner = self.inner.read();
        let records = Self::readable(&inner, &self.resource)?;
        Ok(records
            .iter()
            .filter(|record| {
                record
                    .get(key)
                    .is_some_and(|value| ids.iter().any(|id| value_matches_id(value, id)))
            })
            .cloned()
            .collect())
    }

    /// Insert a record.
    pub fn insert(&self, record: Record) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let name = self.resource.name().to_string();
        inner
            .data
            .as_mut()
            .ok_or(StoreError::NotInitialised(name))?
            .push(record);
        Ok(())
    }

    /// Merge `data`'s fields into every record sharing its primary key.
    ///
    /// Returns the number of records touched; zero when no record matches,
    /// which is a no-op rather than an error.
    pub fn merge_update(&self, data: &Record) -> Result<usize, StoreError> {
        let key = self.resource.primary_key();
        let id = data
            .get(key)
            .ok_or_else(|| StoreError::MissingPrimaryKey(key.to_string()))?
            .clone();

        let mut inner = self.inner.write();
        let name = self.resource.name().to_string();
        let records = inner
            .data
            .as_mut()
            .ok_or(StoreError::NotInitialised(name))?;

        let mut touched = 0;
        for record in records.iter_mut() {
            if record.get(key) == Some(&id) {
                for (field, value) in data {
                    record.insert(field.clone(), value.clone());
                }
                touched += 1;
            }
        }
        Ok(touched)
    }

    /// Remove every record matching `predicate` on all of its fields.
    ///
    /// Returns the number of records removed. An empty predicate matches
    /// every record.
    pub fn remove_matching(&self, predicate: &Record) -> Result<usize, StoreError> {
        let mut inner = self.inner.write();
        let name = self.resource.name().to_string();
        let records = inner
            .data
            .as_mut()
            .ok_or(StoreError::NotInitialised(name))?;

        let before = records.len();
        records.retain(|record| {
            !predicate
                .iter()
                .all(|(field, value)| record.get(field) == Some(value))
        });
        Ok(before - records.len())
    }

    fn readable<'a>(inner: &'a Inner, resource: &Resource) -> Result<&'a Vec<Record>, StoreError> {
        if let Some(message) = &inner.error_message {
            return Err(StoreError::Unavailable(message.clone()));
        }
        inner.data.as_ref().ok_or_else(|| {
            StoreError::Unavailable(format!("collection `{}` not initialised", resource.name()))
        })
    }
}

/// Remove internal fields (leading underscore) from a record.
pub fn strip_internal(record: &Record) -> Record {
    record
        .iter()
        .filter(|(field, _)| !field.starts_with('_'))
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect()
}

/// Match a primary-key value against an id taken from a request path.
fn value_matches_id(value: &Value, id: &str) -> bool {
    match value {
        Value::String(s) => s == id,
        Value::Number(n) => n.to_string() == id,
        _ => false,
    }
}
