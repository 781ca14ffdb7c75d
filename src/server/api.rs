use crate::history::ConversationStore;
use crate::models::event::SubscriptionValidationResponse;
use crate::webhook::{ WebhookDispatcher, WebhookResponse };

use axum::{
    body::Bytes,
    extract::State,
    http::{ HeaderMap, HeaderValue, StatusCode },
    response::{ IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use log::{ info, warn };
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{ Any, CorsLayer };

pub const EVENT_TYPE_HEADER: &str = "aeg-event-type";
const REQUEST_ORIGIN_HEADER: &str = "webhook-request-origin";
const REQUEST_RATE_HEADER: &str = "webhook-request-rate";
const REQUEST_CALLBACK_HEADER: &str = "webhook-request-callback";
const ALLOWED_ORIGIN_HEADER: &str = "webhook-allowed-origin";
const ALLOWED_RATE_HEADER: &str = "webhook-allowed-rate";

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: WebhookDispatcher,
    pub store: Arc<ConversationStore>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let api = Router::new().route("/messages", get(messages_handler)).layer(cors);

    Router::new()
        .route("/webhook", post(webhook_handler).options(webhook_options_handler))
        .nest("/api", api)
        .with_state(state)
}

async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes
) -> Response {
    let event_type = headers.get(EVENT_TYPE_HEADER).and_then(|v| v.to_str().ok());

    match state.dispatcher.dispatch(&body, event_type).await {
        Ok(WebhookResponse::Validation(code)) =>
            (
                StatusCode::OK,
                Json(SubscriptionValidationResponse { validation_response: code }),
            ).into_response(),
        Ok(WebhookResponse::Accepted { processed }) => {
            info!("Webhook batch handled ({} message(s))", processed);
            StatusCode::OK.into_response()
        }
        Ok(WebhookResponse::Rejected) => StatusCode::BAD_REQUEST.into_response(),
        Err(e) => {
            warn!("Webhook payload rejected: {}", e);
            (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e.to_string() })).into_response()
        }
    }
}

/// CloudEvents abuse-protection handshake.
async fn webhook_options_handler(headers: HeaderMap) -> Response {
    let origin = headers
        .get(REQUEST_ORIGIN_HEADER)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));
    info!(
        "Webhook handshake from origin {:?} (rate {:?}, callback {:?})",
        origin,
        headers.get(REQUEST_RATE_HEADER),
        headers.get(REQUEST_CALLBACK_HEADER)
    );

    let mut response = StatusCode::OK.into_response();
    let out = response.headers_mut();
    out.insert(ALLOWED_RATE_HEADER, HeaderValue::from_static("*"));
    out.insert(ALLOWED_ORIGIN_HEADER, origin);
    response
}

async fn messages_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.display_log().await)
}
