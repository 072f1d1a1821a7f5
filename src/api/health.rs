use axum::{routing::get, Json, Router};
use serde::Serialize;

pub const KEEP_ALIVE_TEXT: &str = "Bot is running!";

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn keep_alive() -> &'static str {
    KEEP_ALIVE_TEXT
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(keep_alive))
        .route("/api/health", get(health))
}
