//! HTTP API handlers.

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::metrics::{self, LatencyTimer};
use crate::stats::{fetch_message_stats, InvalidQuery, StatsQuery, StatsRequest, StatsResponse};
use crate::telegram::SessionManager;

use super::error::{ApiError, ErrorResponse};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// The process-wide Telegram session.
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    /// Create new app state around a session manager.
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }
}

/// Return view and reaction counts of a message.
#[utoipa::path(
    get,
    path = "/api/message",
    params(StatsQuery),
    responses(
        (status = 200, description = "Thông tin lượt xem và phản ứng của tin nhắn", body = StatsResponse),
        (status = 400, description = "Thiếu tham số peer hoặc id", body = ErrorResponse),
        (status = 500, description = "Đã xảy ra lỗi khi xử lý yêu cầu", body = ErrorResponse),
    ),
    tag = "message"
)]
pub async fn get_message_stats(
    State(state): State<AppState>,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Json<StatsResponse>, ApiError> {
    let _timer = LatencyTimer::new("/api/message");
    metrics::inc_stats_requests();

    let result = handle_message_stats(&state, query).await;
    if result.is_err() {
        metrics::inc_stats_requests_failed();
    }

    result.map(Json)
}

async fn handle_message_stats(
    state: &AppState,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<StatsResponse, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        debug!(error = %rejection, "Query string rejected");
        ApiError::Validation(InvalidQuery::Malformed(rejection.body_text()))
    })?;

    let request = StatsRequest::try_from(query)?;

    let api = state.sessions.ensure_session().await?;

    Ok(fetch_message_stats(api.as_ref(), &request).await?)
}

/// Turn a handler panic into the generic 500 response.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "handler panicked".to_string());

    ApiError::Unexpected(detail).into_response()
}
