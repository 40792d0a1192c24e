use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::dispatcher::EventDispatcher;
use super::domain::{ChatEvent, UserId};
use super::gateway::ChatGateway;
use super::matching::RuleSource;
use super::store::SessionStore;

/// Router builder exposing the inbound chat webhook and session progress.
pub fn chat_router<S, G, R>(dispatcher: Arc<EventDispatcher<S, G, R>>) -> Router
where
    S: SessionStore + 'static,
    G: ChatGateway + 'static,
    R: RuleSource + 'static,
{
    Router::new()
        .route("/api/v1/chat/events", post(event_handler::<S, G, R>))
        .route(
            "/api/v1/chat/sessions/:user_id",
            get(session_handler::<S, G, R>),
        )
        .with_state(dispatcher)
}

pub(crate) async fn event_handler<S, G, R>(
    State(dispatcher): State<Arc<EventDispatcher<S, G, R>>>,
    axum::Json(event): axum::Json<ChatEvent>,
) -> Response
where
    S: SessionStore + 'static,
    G: ChatGateway + 'static,
    R: RuleSource + 'static,
{
    let payload = json!({
        "status": "accepted",
        "user_id": event.user_id(),
        "event": event.label(),
    });
    dispatcher.dispatch(event);
    (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
}

pub(crate) async fn session_handler<S, G, R>(
    State(dispatcher): State<Arc<EventDispatcher<S, G, R>>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    G: ChatGateway + 'static,
    R: RuleSource + 'static,
{
    let user = UserId(user_id);
    match dispatcher.engine().progress(&user) {
        Ok(Some(progress)) => (StatusCode::OK, axum::Json(progress)).into_response(),
        Ok(None) => {
            let payload = json!({
                "user_id": user,
                "error": "no active questionnaire",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(err) => {
            let payload = json!({
                "error": err.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
