//! Collection read and mutation routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde_json::Value;

use crate::api::error::ApiResult;
use crate::api::models::StatusResponse;
use crate::api::server::AppState;
use crate::resource::Operation;
use crate::store::Record;

/// Create the collection router.
///
/// `/db` is matched ahead of `/{id}`, so the mutation endpoints never shadow
/// an id lookup.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_all))
        .route("/db", post(create).put(update).delete(remove))
        .route("/{id}", get(get_by_id))
        .route("/{id}/{related}", get(get_related))
}

/// Every record in the collection.
async fn get_all(State(state): State<AppState>) -> ApiResult<Json<Vec<Record>>> {
    Ok(Json(state.query.get_all()?))
}

/// One record, or several for a comma-separated id list. A bare id yields an
/// object; any comma in the list forces an array.
async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(Json(state.query.get_by_ids(&id)?))
}

/// Records related to the matched record(s), fetched from the service that
/// owns the related collection.
async fn get_related(
    State(state): State<AppState>,
    Path((id, related)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    Ok(Json(state.query.get_related(&id, &related).await?))
}

async fn create(
    State(state): State<AppState>,
    Json(data): Json<Record>,
) -> ApiResult<Json<StatusResponse>> {
    publish_ack(&state, Operation::Create, data)
}

async fn update(
    State(state): State<AppState>,
    Json(data): Json<Record>,
) -> ApiResult<Json<StatusResponse>> {
    publish_ack(&state, Operation::Update, data)
}

async fn remove(
    State(state): State<AppState>,
    Json(data): Json<Record>,
) -> ApiResult<Json<StatusResponse>> {
    publish_ack(&state, Operation::Delete, data)
}

/// Publish the mutation and acknowledge with the store's CURRENT metadata.
/// The ack does not imply the store reflects the mutation yet; consistency
/// is eventual.
fn publish_ack(
    state: &AppState,
    operation: Operation,
    data: Record,
) -> ApiResult<Json<StatusResponse>> {
    state.publisher.publish(operation, data)?;
    Ok(Json(StatusResponse::from_store(&state.store)))
}
