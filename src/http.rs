//! Webhook surface for inbound message events.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::engine::ConversationEngine;

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConversationEngine>,
}

/// Query parameters of the inbound message event.
#[derive(Debug, Deserialize)]
pub struct MsgReceivedParams {
    message: Option<String>,
    destination_number: Option<String>,
}

/// GET|POST /msgrcvd
///
/// One inbound (user, message) event. The engine's status string is the
/// response body; engine failures surface as 500 with the error text.
async fn msgrcvd(
    State(state): State<AppState>,
    Query(params): Query<MsgReceivedParams>,
) -> Response {
    let Some(message) = params.message.filter(|m| !m.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Message is required.").into_response();
    };
    let user = params.destination_number.unwrap_or_default();

    match state.engine.handle_message(&user, &message).await {
        Ok(status) => (StatusCode::OK, status).into_response(),
        Err(err) => {
            tracing::error!(%user, "Message handling failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

/// GET /health
async fn health() -> &'static str {
    "ok"
}

/// Build the webhook router.
pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/msgrcvd", get(msgrcvd).post(msgrcvd))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
