//! Bootstrap loading of the initial dataset.
//!
//! The loader polls the seed-data provider until a load succeeds, with a
//! fixed retry budget. Each attempt awaits BOTH the fetch and a spacing
//! timer, so attempts can never fire closer together than the spacing even
//! when the fetch fails immediately. A fast success still waits the timer
//! out before the loop returns.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::registry::{DATA_SERVICE, ServiceRegistry};
use crate::store::{CollectionStore, Record};

/// Retry budget for the initial load.
#[derive(Debug, Clone)]
pub struct LoadPolicy {
    /// Total attempts before giving up for this startup.
    pub max_attempts: u32,
    /// Minimum spacing between attempts.
    pub attempt_spacing: Duration,
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 12,
            attempt_spacing: Duration::from_secs(1),
        }
    }
}

/// Fetches the initial dataset and fills the collection store.
pub struct BootstrapLoader {
    client: reqwest::Client,
    registry: Arc<ServiceRegistry>,
    store: Arc<CollectionStore>,
    policy: LoadPolicy,
}

impl BootstrapLoader {
    pub fn new(
        client: reqwest::Client,
        registry: Arc<ServiceRegistry>,
        store: Arc<CollectionStore>,
    ) -> Self {
        Self::with_policy(client, registry, store, LoadPolicy::default())
    }

    pub fn with_policy(
        client: reqwest::Client,
        registry: Arc<ServiceRegistry>,
        store: Arc<CollectionStore>,
        policy: LoadPolicy,
    ) -> Self {
        Self {
            client,
            registry,
            store,
            policy,
        }
    }

    /// One load attempt: on success the store is replaced wholesale and the
    /// error state cleared; on failure the error state is set and existing
    /// data is left as it was.
    pub async fn load_once(&self) -> bool {
        let collection = self.store.resource().name().to_string();

        // Resolved per attempt: the DNS health check may rewrite the entry
        // while we are still polling.
        let Some(base_url) = self.registry.resolve(DATA_SERVICE) else {
            self.store
                .set_error(format!("{collection} service not available"));
            return false;
        };

        let url = format!("{base_url}/testdata/{collection}");
        match self.fetch(&url).await {
            Ok(records) => {
                info!(%url, records = records.len(), "seed data loaded");
                self.store.replace_all(records);
                true
            }
            Err(error) => {
                warn!(%url, %error, "seed data load failed");
                self.store
                    .set_error(format!("{collection} service not available"));
                false
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<Record>, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Record>>()
            .await
    }

    /// Poll until a load succeeds or the retry budget is exhausted.
    ///
    /// Exhaustion is fatal for this startup sequence: the instance keeps
    /// running and keeps answering requests from its error state, but no
    /// further loads are attempted.
    pub async fn run(&self) {
        for _attempt in 1..=self.policy.max_attempts {
            let (loaded, _) = tokio::join!(
                self.load_once(),
                tokio::time::sleep(self.policy.attempt_spacing)
            );
            if loaded {
                return;
            }
        }
        error!(
            max_attempts = self.policy.max_attempts,
            "unable to populate seed data, exceeded maximum tries"
        );
    }

    /// Run the polling loop as a fire-and-forget task.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }
}
