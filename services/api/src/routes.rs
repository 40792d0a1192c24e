use crate::infra::{AppState, InMemoryRuleSource, OutboxGateway};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use sarvam_setu::workflows::questionnaire::{
    chat_router, EventDispatcher, InMemorySessionStore, OutboundAction, UserId,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

pub(crate) type ServiceDispatcher =
    EventDispatcher<InMemorySessionStore, OutboxGateway, InMemoryRuleSource>;

#[derive(Debug, Serialize)]
pub(crate) struct OutboxResponse {
    pub(crate) user_id: UserId,
    pub(crate) actions: Vec<OutboundAction>,
}

pub(crate) fn with_service_routes(dispatcher: Arc<ServiceDispatcher>) -> axum::Router {
    chat_router(dispatcher)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/chat/outbox/:user_id",
            axum::routing::get(outbox_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn outbox_endpoint(
    Extension(outbox): Extension<Arc<OutboxGateway>>,
    Path(user_id): Path<String>,
) -> Response {
    let user_id = UserId(user_id);
    match outbox.drain(&user_id) {
        Ok(actions) => (StatusCode::OK, Json(OutboxResponse { user_id, actions })).into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}
