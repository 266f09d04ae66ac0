//! Axum router and HTTP handlers for mts-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Tests compose the bare router directly.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use mts_audit::Outcome;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::warn;
use uuid::Uuid;

use crate::{
    api_types::{ActivateRequest, DeactivateRequest, HealthResponse, SyncRequest},
    state::AppState,
    workflow::{self, ServiceError},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the application router, mounted under `daemon.base_path`.
///
/// Middleware layers (CORS, tracing) are **not** applied here.
pub fn build_router(state: Arc<AppState>) -> Router {
    let base = state.config.daemon.base_path.trim_end_matches('/').to_string();

    let api = Router::new()
        .route("/health", get(health))
        .route("/activate", post(activate))
        .route("/deactivate", post(deactivate))
        .route("/stations/sync", post(stations_sync))
        .with_state(state);

    if base.is_empty() {
        api
    } else {
        Router::new().nest(&base, api)
    }
}

// ---------------------------------------------------------------------------
// Shared response plumbing
// ---------------------------------------------------------------------------

/// Record the outcome in the audit trail, notify the operator, and render.
///
/// `context` carries request fields that belong in the audit record whether
/// or not the operation succeeded.
async fn finish<T: Serialize>(
    st: &AppState,
    request_id: Uuid,
    topic: &str,
    context: Map<String, Value>,
    result: Result<T, ServiceError>,
) -> Response {
    match result {
        Ok(body) => {
            let mut payload = match serde_json::to_value(&body) {
                Ok(Value::Object(obj)) => obj,
                _ => Map::new(),
            };
            payload.remove("password");
            payload.extend(context);
            st.record_audit(request_id, topic, Outcome::Succeeded, Value::Object(payload));
            st.notify("info", topic, format!("{topic} succeeded (request {request_id})"))
                .await;
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            warn!(%request_id, topic, kind = err.kind(), error = %err, "request failed");
            let mut payload = Map::new();
            payload.insert("kind".to_string(), json!(err.kind()));
            payload.insert("error".to_string(), json!(err.to_string()));
            payload.extend(context);
            st.record_audit(request_id, topic, Outcome::Failed, Value::Object(payload));
            st.notify("error", topic, format!("{topic} failed: {err}")).await;
            err.into_response()
        }
    }
}

fn rejected(rejection: JsonRejection) -> ServiceError {
    ServiceError::Validation(format!("invalid request body: {}", rejection.body_text()))
}

// ---------------------------------------------------------------------------
// GET {base}/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
            config_hash: st.config_hash.clone(),
        }),
    )
}

// ---------------------------------------------------------------------------
// POST {base}/activate
// ---------------------------------------------------------------------------

pub(crate) async fn activate(
    State(st): State<Arc<AppState>>,
    body: Result<Json<ActivateRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let mut context = Map::new();
    let result = match body {
        Ok(Json(req)) => {
            context.insert("serial".to_string(), json!(req.serial));
            context.insert("tariff".to_string(), json!(req.tariff));
            workflow::activate(&st, req).await
        }
        Err(rej) => Err(rejected(rej)),
    };
    finish(&st, request_id, "activate", context, result).await
}

// ---------------------------------------------------------------------------
// POST {base}/deactivate
// ---------------------------------------------------------------------------

/// `login` and `group` may arrive as query parameters, a JSON body, or both.
pub(crate) async fn deactivate(
    State(st): State<Arc<AppState>>,
    Query(query): Query<DeactivateRequest>,
    body: Bytes,
) -> Response {
    let request_id = Uuid::new_v4();
    let from_body = if body.iter().all(u8::is_ascii_whitespace) {
        Ok(DeactivateRequest::default())
    } else {
        serde_json::from_slice::<DeactivateRequest>(&body)
            .map_err(|e| ServiceError::Validation(format!("invalid request body: {e}")))
    };
    let result = match from_body {
        Ok(b) => workflow::deactivate(&st, query.merged_with(b)).await,
        Err(e) => Err(e),
    };
    finish(&st, request_id, "deactivate", Map::new(), result).await
}

// ---------------------------------------------------------------------------
// POST {base}/stations/sync
// ---------------------------------------------------------------------------

pub(crate) async fn stations_sync(
    State(st): State<Arc<AppState>>,
    body: Result<Json<SyncRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let result = match body {
        Ok(Json(req)) => workflow::sync_stations(&st, req).await,
        Err(rej) => Err(rejected(rej)),
    };
    finish(&st, request_id, "stations_sync", Map::new(), result).await
}
