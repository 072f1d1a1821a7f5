pub mod health;

use axum::Router;

/// Create the keep-alive router.
pub fn router() -> Router {
    Router::new().merge(health::router())
}
