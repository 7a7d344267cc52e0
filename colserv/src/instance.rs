//! Wires one collection-service instance together.
//!
//! Startup order mirrors the lifecycle in the module docs: registry (with a
//! fire-and-forget DNS check), store, bootstrap polling, event applier, and
//! finally the HTTP server. Neither the DNS check nor the bootstrap loop is
//! awaited: the server comes up immediately and answers from the store's
//! error state until the first load lands.

use std::sync::Arc;

use evlog::MemoryBroker;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{ApiServer, ApiServerConfig, AppState};
use crate::bootstrap::BootstrapLoader;
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::events::{EventApplier, EventPublisher};
use crate::query::QueryEngine;
use crate::registry::ServiceRegistry;
use crate::resource::Resource;
use crate::store::CollectionStore;

/// Run an instance configured from the environment.
///
/// `related_services` maps each related collection name to its base URL, the
/// set of relations this resource's records may carry.
pub async fn run(collection: &str, related_services: Vec<(String, String)>) -> Result<()> {
    let config = ServiceConfig::from_env_or_default(collection);
    let api_config = ApiServerConfig::from_env_or_default();
    serve(config, api_config, related_services, MemoryBroker::new()).await
}

/// Run an instance against an explicit configuration and broker.
pub async fn serve(
    config: ServiceConfig,
    api_config: ApiServerConfig,
    related_services: Vec<(String, String)>,
    broker: MemoryBroker,
) -> Result<()> {
    info!(
        collection = %config.collection,
        brokers = ?config.brokers,
        client_id = %config.producer_client_id(),
        group_id = %config.consumer_group_id(),
        "starting collection service"
    );

    let store = Arc::new(CollectionStore::new(Resource::new(&config.collection)));

    let registry = Arc::new(ServiceRegistry::with_data_service(&config.data_service_url));
    for (name, base_url) in related_services {
        registry.register(name, base_url);
    }

    let client = reqwest::Client::new();

    // Best-effort: in-flight requests may still see a pre-check URL.
    registry.spawn_health_check();

    BootstrapLoader::new(client.clone(), Arc::clone(&registry), Arc::clone(&store)).spawn();

    let cancel = CancellationToken::new();
    EventApplier::new(
        Arc::clone(&store),
        broker.consumer(config.consumer_group_id()),
        &config.topic,
    )
    .spawn(cancel.child_token());

    let publisher = Arc::new(EventPublisher::new(
        broker.producer(config.producer_client_id()),
        &config.topic,
        &config.collection,
    ));
    let query = Arc::new(QueryEngine::new(
        Arc::clone(&store),
        Arc::clone(&registry),
        client,
        config.relation_retry_attempts,
    ));

    let state = AppState {
        store,
        registry,
        query,
        publisher,
    };
    let server = ApiServer::with_state(api_config, state);

    let server_cancel = server.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            cancel.cancel();
            server_cancel.cancel();
        }
    });

    server.run().await
}
