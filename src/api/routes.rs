//! HTTP API route definitions.

use axum::{routing::get, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::error::ErrorResponse;
use super::handlers::{self, get_message_stats, panic_response, AppState};
use crate::stats::{ReactionStat, StatsResponse};

/// OpenAPI document of the service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Telegram Check View",
        version = "1.0.0",
        description = "API documentation for Telegram Check View"
    ),
    paths(handlers::get_message_stats),
    components(schemas(StatsResponse, ReactionStat, ErrorResponse))
)]
pub struct ApiDoc;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/message", get(get_message_stats))
        .with_state(state)
        .merge(SwaggerUi::new("/api-docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}
