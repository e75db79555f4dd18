mod startups;
pub mod middleware;

pub use middleware::TraceIdLayer;
pub use startups::submit_startup;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppContext;

pub fn router(ctx: AppContext) -> Router {
    let body_limit = ctx.max_upload_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/startups/submit", post(submit_startup))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TraceIdLayer)
        .with_state(ctx)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
