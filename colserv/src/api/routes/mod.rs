//! API route modules.

pub mod collection;
pub mod health;

use axum::Router;

use crate::api::server::AppState;

/// Create the instance router: the collection routes mounted under the
/// resource name, plus the health endpoint.
pub fn create_router(state: AppState) -> Router {
    let resource_path = format!("/{}", state.store.resource().name());

    Router::new()
        .nest(&resource_path, collection::router())
        .merge(health::router())
        .with_state(state)
}
