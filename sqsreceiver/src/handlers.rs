//! HTTP handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use sqsreceiver_core::Message;
use sqsreceiver_queue::QueueError;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::error;

use crate::service;
use crate::state::AppState;

/// Query string of the receive endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ReceiveQuery {
    #[serde(rename = "priorityFilter")]
    pub priority_filter: Option<String>,
}

impl ReceiveQuery {
    /// The filter to apply; an empty value means no filter
    pub fn filter(&self) -> Option<&str> {
        self.priority_filter.as_deref().filter(|p| !p.is_empty())
    }
}

/// Errors surfaced to HTTP callers as a bare 500
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("Receive task failed: {0}")]
    Task(#[from] JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self, "Receive request failed");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

/// `GET /api/snssqs/receive?priorityFilter=<string>`
///
/// An unparsable query string is treated as no filter. The receive cycle runs on its
/// own task so a client disconnect cannot abandon a batch between buffering and
/// deletion.
pub async fn receive_messages(
    State(state): State<Arc<AppState>>,
    query: Option<Query<ReceiveQuery>>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let filter = query.filter().map(str::to_string);

    let messages = tokio::spawn(async move {
        service::receive_and_list(&state, filter.as_deref()).await
    })
    .await??;
    Ok(Json(messages))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "running",
        "buffered": state.buffer.len(),
    }))
}
