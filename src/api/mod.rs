/// API routes and handlers
pub mod emergency;
pub mod family;
pub mod middleware;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(family::routes())
        .merge(emergency::routes())
}
