//! HTTP router

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use sqsreceiver_core::{request_id::REQUEST_ID_HEADER, RequestId};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::handlers;
use crate::state::AppState;

/// Receive endpoint path
pub const RECEIVE_PATH: &str = "/api/snssqs/receive";

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(RECEIVE_PATH, get(handlers::receive_messages))
        // Controller-style casing, kept for existing callers
        .route("/api/SnsSqs/receive", get(handlers::receive_messages))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        // Outermost, so the ID is in the extensions before the trace span is made
        .layer(middleware::from_fn(assign_request_id))
        .with_state(state)
}

fn request_span(request: &Request) -> Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(RequestId::as_str)
        .unwrap_or_default();

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

async fn assign_request_id(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::new();
    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
