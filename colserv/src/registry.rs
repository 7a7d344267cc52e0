//! Service registry with a best-effort DNS health check.
//!
//! Holds the base URL of every collaborating service: the seed-data provider
//! under [`DATA_SERVICE`] plus one entry per related collection. Entries whose
//! host fails to resolve are rewritten to a local fallback address.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{info, warn};
use url::Url;

/// Registry name of the seed-data provider.
pub const DATA_SERVICE: &str = "data";

/// Base URL substituted for entries whose host does not resolve.
pub const LOCAL_FALLBACK_URL: &str = "http://localhost:8080";

/// Name → base URL map for every collaborating service.
pub struct ServiceRegistry {
    entries: DashMap<String, String>,
}

impl ServiceRegistry {
    /// Create a registry seeded with the seed-data provider URL.
    pub fn with_data_service(data_service_url: impl Into<String>) -> Self {
        let registry = Self {
            entries: DashMap::new(),
        };
        registry.register(DATA_SERVICE, data_service_url);
        registry
    }

    /// Register or replace a service entry.
    pub fn register(&self, name: impl Into<String>, base_url: impl Into<String>) {
        self.entries.insert(name.into(), base_url.into());
    }

    /// Resolve a service name to its current base URL.
    pub fn resolve(&self, name: &str) -> Option<String> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    /// Snapshot of all entries.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// DNS-check every registered host once, rewriting entries that fail to
    /// resolve to [`LOCAL_FALLBACK_URL`].
    pub async fn health_check(&self) {
        for (name, base_url) in self.entries() {
            match resolve_host(&base_url).await {
                Ok(address) => {
                    info!(service = %name, %base_url, %address, "service address resolved");
                }
                Err(error) => {
                    warn!(service = %name, %base_url, %error, "unable to resolve service host");
                    self.register(&name, LOCAL_FALLBACK_URL);
                    warn!(service = %name, fallback = LOCAL_FALLBACK_URL, "switched to fallback address");
                }
            }
        }
    }

    /// Run [`Self::health_check`] as a fire-and-forget task.
    ///
    /// Callers do not block on the check, so in-flight requests may still use
    /// an unresolvable URL until the task completes.
    pub fn spawn_health_check(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move { registry.health_check().await })
    }
}

/// Look up the host of `base_url`, returning the first resolved address.
async fn resolve_host(base_url: &str) -> Result<std::net::SocketAddr, String> {
    let url = Url::parse(base_url).map_err(|e| format!("invalid URL: {e}"))?;
    let host = url
        .host_str()
        .ok_or_else(|| "URL has no host".to_string())?;
    let port = url.port_or_known_default().unwrap_or(80);

    let mut addresses = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| e.to_string())?;
    addresses
        .next()
        .ok_or_else(|| "lookup returned no addresses".to_string())
}
