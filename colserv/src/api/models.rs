//! API response models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::CollectionStore;

/// Health/metadata body shared by `/healthz` and mutation acknowledgements.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn healthy(last_updated: Option<DateTime<Utc>>) -> Self {
        Self {
            status: "healthy",
            last_updated,
            error: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: "unhealthy",
            last_updated: None,
            error: Some(error.into()),
        }
    }

    /// Snapshot the store's current metadata.
    pub fn from_store(store: &CollectionStore) -> Self {
        if store.is_healthy() {
            Self::healthy(store.status().last_updated)
        } else {
            let status = store.status();
            Self::unhealthy(
                status
                    .error_message
                    .unwrap_or_else(|| "collection not initialised".to_string()),
            )
        }
    }
}
