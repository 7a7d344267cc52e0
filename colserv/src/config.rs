//! Instance configuration from environment variables.

/// Default seed-data provider URL.
pub const DEFAULT_DATA_SERVICE_URL: &str = "http://testdata-service";

/// Default log broker address.
pub const DEFAULT_BROKER: &str = "localhost:9092";

/// Read an environment variable, falling back to a default when unset or
/// empty.
pub fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

/// Configuration for one collection-service instance.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// The collection this instance owns, e.g. `accounts`.
    pub collection: String,
    /// Base URL of the seed-data provider.
    pub data_service_url: String,
    /// Log broker addresses. The bundled in-process log is process-local;
    /// the addresses identify the cluster and are logged at startup.
    pub brokers: Vec<String>,
    /// Log topic carrying this collection's mutation events.
    pub topic: String,
    /// Instance identity, names the log client and consumer group.
    pub instance_id: String,
    /// Extra attempts for relation fan-out calls. Zero means a single
    /// attempt, the historical behavior.
    pub relation_retry_attempts: u32,
}

impl ServiceConfig {
    /// Defaults for a collection: topic named after the collection, no
    /// fan-out retries.
    pub fn new(collection: impl Into<String>) -> Self {
        let collection = collection.into();
        Self {
            data_service_url: DEFAULT_DATA_SERVICE_URL.to_string(),
            brokers: vec![DEFAULT_BROKER.to_string()],
            topic: collection.clone(),
            instance_id: format!("{collection}-0"),
            relation_retry_attempts: 0,
            collection,
        }
    }

    /// Load configuration from environment variables, falling back to
    /// defaults.
    ///
    /// Supported env vars:
    /// - `TESTDATA_SERVICE_URL`
    /// - `BROKER_URL` (comma-separated)
    /// - `LOG_TOPIC` (defaults to the collection name)
    /// - `HOSTNAME` (instance identity)
    /// - `RELATION_RETRY_ATTEMPTS`
    pub fn from_env_or_default(collection: impl Into<String>) -> Self {
        let mut config = Self::new(collection);

        config.data_service_url = env_or("TESTDATA_SERVICE_URL", &config.data_service_url);

        if let Ok(brokers) = std::env::var("BROKER_URL")
            && !brokers.trim().is_empty()
        {
            config.brokers = brokers
                .split(',')
                .map(|broker| broker.trim().to_string())
                .filter(|broker| !broker.is_empty())
                .collect();
        }

        config.topic = env_or("LOG_TOPIC", &config.topic);
        config.instance_id = env_or("HOSTNAME", &config.instance_id);

        if let Ok(attempts) = std::env::var("RELATION_RETRY_ATTEMPTS")
            && let Ok(parsed) = attempts.parse::<u32>()
        {
            config.relation_retry_attempts = parsed;
        }

        config
    }

    /// Client id the instance produces under.
    pub fn producer_client_id(&self) -> String {
        format!("produce-{}", self.collection)
    }

    /// Consumer group scoped to this instance, so the instance receives
    /// every event rather than load-sharing the topic.
    pub fn consumer_group_id(&self) -> String {
        format!("consumer-{}", self.instance_id)
    }
}
