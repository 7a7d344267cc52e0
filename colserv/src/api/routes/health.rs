//! Health check route.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::api::models::StatusResponse;
use crate::api::server::AppState;

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}

/// Healthy iff the store has data, a load timestamp, and no error.
async fn healthz(State(state): State<AppState>) -> Response {
    let body = StatusResponse::from_store(&state.store);
    let status = if state.store.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(body)).into_response()
}
