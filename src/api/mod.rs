//! HTTP API layer

mod auth;
mod error;
mod handlers;
mod routes;

pub use error::{ApiError, ErrorResponse};
pub use routes::{create_router, registered_routes, AppState, RouteTable};
