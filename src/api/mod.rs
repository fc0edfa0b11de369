//! HTTP API module for the message stats endpoint and its documentation.

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, ErrorResponse};
pub use handlers::AppState;
pub use routes::{create_router, ApiDoc};
