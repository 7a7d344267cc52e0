//! End-to-end tests for one collection-service instance.
//!
//! The instance under test is served on an ephemeral port; small axum apps
//! on other ephemeral ports stand in for the seed-data provider and sibling
//! collection services.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{Json, Router, extract::Path, http::StatusCode, routing::get};
use evlog::MemoryBroker;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use colserv::api::{AppState, routes};
use colserv::bootstrap::{BootstrapLoader, LoadPolicy};
use colserv::events::{EventApplier, EventPublisher};
use colserv::query::QueryEngine;
use colserv::registry::ServiceRegistry;
use colserv::resource::Resource;
use colserv::store::CollectionStore;

/// Serve a router on an ephemeral loopback port.
async fn serve_router(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("no local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server died");
    });
    addr
}

/// A seed-data provider answering `GET /testdata/{collection}`.
fn seed_router(records: Value) -> Router {
    Router::new().route(
        "/testdata/{collection}",
        get(move || {
            let records = records.clone();
            async move { Json(records) }
        }),
    )
}

struct TestInstance {
    base_url: String,
    store: Arc<CollectionStore>,
    cancel: CancellationToken,
}

impl Drop for TestInstance {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Stand up a full instance: store loaded from `data_url` once, applier
/// running, API served on an ephemeral port.
async fn start_instance(
    collection: &str,
    data_url: String,
    related: Vec<(String, String)>,
) -> TestInstance {
    let store = Arc::new(CollectionStore::new(Resource::new(collection)));
    let registry = Arc::new(ServiceRegistry::with_data_service(data_url));
    for (name, base_url) in related {
        registry.register(name, base_url);
    }

    let client = reqwest::Client::new();
    BootstrapLoader::new(client.clone(), Arc::clone(&registry), Arc::clone(&store))
        .load_once()
        .await;

    let broker = MemoryBroker::new();
    let cancel = CancellationToken::new();
    EventApplier::new(
        Arc::clone(&store),
        broker.consumer(format!("consumer-{collection}-test")),
        collection,
    )
    .spawn(cancel.child_token());
    // Let the applier subscribe before any request can publish.
    tokio::task::yield_now().await;

    let state = AppState {
        store: Arc::clone(&store),
        registry: Arc::clone(&registry),
        query: Arc::new(QueryEngine::new(
            Arc::clone(&store),
            registry,
            client,
            0,
        )),
        publisher: Arc::new(EventPublisher::new(
            broker.producer(format!("produce-{collection}")),
            collection,
            collection,
        )),
    };

    let addr = serve_router(routes::create_router(state)).await;
    TestInstance {
        base_url: format!("http://{addr}"),
        store,
        cancel,
    }
}

async fn start_seeded_instance(
    collection: &str,
    records: Value,
    related: Vec<(String, String)>,
) -> TestInstance {
    let seed_addr = serve_router(seed_router(records)).await;
    start_instance(collection, format!("http://{seed_addr}"), related).await
}

mod read_path {
    use super::*;

    #[tokio::test]
    async fn test_get_all_returns_stripped_records_and_is_idempotent() {
        let instance = start_seeded_instance(
            "accounts",
            json!([
                {"accountId": "5", "balance": 100, "_customerIds": ["C1"]},
                {"accountId": "6", "balance": 20}
            ]),
            vec![],
        )
        .await;

        let url = format!("{}/accounts", instance.base_url);
        let first: Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
        let second: Value = reqwest::get(&url).await.unwrap().json().await.unwrap();

        assert_eq!(first, second);
        let records = first.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.get("_customerIds").is_none()));
    }

    #[tokio::test]
    async fn test_comma_forces_array_shape() {
        let instance = start_seeded_instance(
            "accounts",
            json!([{"accountId": "5", "balance": 100}]),
            vec![],
        )
        .await;

        let bare: Value = reqwest::get(format!("{}/accounts/5", instance.base_url))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(bare.is_object());
        assert_eq!(bare["balance"], json!(100));

        for raw in ["5,", ",5"] {
            let listed: Value = reqwest::get(format!("{}/accounts/{raw}", instance.base_url))
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            let items = listed.as_array().expect("expected array shape");
            assert_eq!(items.len(), 1);
            assert_eq!(items[0]["balance"], json!(100));
        }
    }

    #[tokio::test]
    async fn test_unknown_id_is_404_even_with_other_records_present() {
        let instance = start_seeded_instance(
            "accounts",
            json!([{"accountId": "5"}]),
            vec![],
        )
        .await;

        let response = reqwest::get(format!("{}/accounts/999999", instance.base_url))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_healthy_instance_reports_200() {
        let instance =
            start_seeded_instance("accounts", json!([{"accountId": "5"}]), vec![]).await;

        let response = reqwest::get(format!("{}/healthz", instance.base_url))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["status"], json!("healthy"));
        assert!(body.get("lastUpdated").is_some());
    }
}

mod error_state {
    use super::*;

    #[tokio::test]
    async fn test_failed_load_surfaces_500_everywhere() {
        // No seed-data provider listens on port 1.
        let instance = start_instance("accounts", "http://127.0.0.1:1".to_string(), vec![]).await;

        let response = reqwest::get(format!("{}/accounts", instance.base_url))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], json!("accounts service not available"));

        let health = reqwest::get(format!("{}/healthz", instance.base_url))
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = health.json().await.unwrap();
        assert_eq!(body["status"], json!("unhealthy"));
    }

    #[tokio::test]
    async fn test_circuit_breaker_stops_after_twelve_attempts() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_in_handler = Arc::clone(&hits);
        let failing_provider = Router::new().route(
            "/testdata/{collection}",
            get(move || {
                hits_in_handler.fetch_add(1, Ordering::SeqCst);
                async { StatusCode::INTERNAL_SERVER_ERROR }
            }),
        );
        let addr = serve_router(failing_provider).await;

        let store = Arc::new(CollectionStore::new(Resource::new("accounts")));
        let registry = Arc::new(ServiceRegistry::with_data_service(format!("http://{addr}")));
        let loader = BootstrapLoader::with_policy(
            reqwest::Client::new(),
            registry,
            Arc::clone(&store),
            LoadPolicy {
                max_attempts: 12,
                attempt_spacing: Duration::from_millis(2),
            },
        );

        loader.run().await;

        assert_eq!(hits.load(Ordering::SeqCst), 12);
        assert!(!store.is_healthy());
        assert!(store.status().error_message.is_some());
    }
}

mod write_path {
    use super::*;

    #[tokio::test]
    async fn test_mutation_is_eventually_visible_exactly_once() {
        let instance =
            start_seeded_instance("accounts", json!([{"accountId": "5"}]), vec![]).await;
        let client = reqwest::Client::new();

        let ack = client
            .post(format!("{}/accounts/db", instance.base_url))
            .json(&json!({"accountId": "A9", "balance": 1}))
            .send()
            .await
            .unwrap();
        assert_eq!(ack.status(), StatusCode::OK);
        let ack_body: Value = ack.json().await.unwrap();
        assert_eq!(ack_body["status"], json!("healthy"));

        // The ack does not imply visibility; poll until the applier catches
        // up.
        let mut copies = 0;
        for _ in 0..200 {
            let records: Value = reqwest::get(format!("{}/accounts", instance.base_url))
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            copies = records
                .as_array()
                .unwrap()
                .iter()
                .filter(|r| r["accountId"] == json!("A9"))
                .count();
            if copies > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(copies, 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_flow_through_the_log() {
        let instance = start_seeded_instance(
            "accounts",
            json!([{"accountId": "5", "balance": 100}]),
            vec![],
        )
        .await;
        let client = reqwest::Client::new();

        client
            .put(format!("{}/accounts/db", instance.base_url))
            .json(&json!({"accountId": "5", "balance": 999}))
            .send()
            .await
            .unwrap();

        for _ in 0..200 {
            if instance
                .store
                .find_by_ids(&["5"])
                .map(|found| found[0]["balance"] == json!(999))
                .unwrap_or(false)
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(
            instance.store.find_by_ids(&["5"]).unwrap()[0]["balance"],
            json!(999)
        );

        client
            .delete(format!("{}/accounts/db", instance.base_url))
            .json(&json!({"accountId": "5", "balance": 999}))
            .send()
            .await
            .unwrap();

        for _ in 0..200 {
            if instance.store.records().map(|r| r.is_empty()).unwrap_or(false) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(instance.store.records().unwrap().is_empty());
    }
}

mod relation_fan_out {
    use super::*;
    use parking_lot::Mutex;

    /// A sibling accounts service that records the raw id segment it was
    /// asked for.
    fn sibling_router(seen: Arc<Mutex<Option<String>>>, reply: Value) -> Router {
        Router::new().route(
            "/accounts/{ids}",
            get(move |Path(ids): Path<String>| {
                let seen = Arc::clone(&seen);
                let reply = reply.clone();
                async move {
                    *seen.lock() = Some(ids);
                    Json(reply)
                }
            }),
        )
    }

    #[tokio::test]
    async fn test_fan_out_requests_comma_prefixed_ids_and_passes_reply_through() {
        let seen = Arc::new(Mutex::new(None));
        let reply = json!([{"accountId": "A1"}, {"accountId": "A2"}]);
        let sibling = serve_router(sibling_router(Arc::clone(&seen), reply.clone())).await;

        let instance = start_seeded_instance(
            "customers",
            json!([
                {"customerId": "C1", "_accountIds": ["A1", "A2"]},
                {"customerId": "C2", "_accountIds": ["A2", "A3"]}
            ]),
            vec![("accounts".to_string(), format!("http://{sibling}"))],
        )
        .await;

        let body: Value = reqwest::get(format!("{}/customers/C1/accounts", instance.base_url))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, reply);
        assert_eq!(seen.lock().as_deref(), Some(",A1,A2"));

        // Ids from several base records are flattened with repeats preserved.
        reqwest::get(format!("{}/customers/C1,C2/accounts", instance.base_url))
            .await
            .unwrap()
            .error_for_status()
            .unwrap();
        assert_eq!(seen.lock().as_deref(), Some(",A1,A2,A2,A3"));
    }

    #[tokio::test]
    async fn test_record_without_related_ids_is_404() {
        let instance = start_seeded_instance(
            "customers",
            json!([{"customerId": "C1"}]),
            vec![("accounts".to_string(), "http://127.0.0.1:1".to_string())],
        )
        .await;

        let response = reqwest::get(format!("{}/customers/C1/accounts", instance.base_url))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unregistered_relation_is_500() {
        let instance = start_seeded_instance(
            "customers",
            json!([{"customerId": "C1", "_widgetIds": ["W1"]}]),
            vec![],
        )
        .await;

        let response = reqwest::get(format!("{}/customers/C1/widgets", instance.base_url))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_sibling_failure_is_500() {
        let failing_sibling = Router::new().route(
            "/accounts/{ids}",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let sibling = serve_router(failing_sibling).await;

        let instance = start_seeded_instance(
            "customers",
            json!([{"customerId": "C1", "_accountIds": ["A1"]}]),
            vec![("accounts".to_string(), format!("http://{sibling}"))],
        )
        .await;

        let response = reqwest::get(format!("{}/customers/C1/accounts", instance.base_url))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
