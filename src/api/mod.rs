/// API routes and handlers
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod members;
pub mod middleware;
pub mod payments;
pub mod plans;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(members::routes())
        .merge(plans::routes())
        .merge(payments::routes())
        .merge(dashboard::routes())
}
