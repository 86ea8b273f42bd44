pub mod error;
pub mod routes;
pub mod state;
pub mod ws;

use axum::{extract::DefaultBodyLimit, routing::{get, post}, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::adapters::http::state::HttpState;
use crate::adapters::http::ws::ws_handler;

/// Hasta 10 fotos de móvil por petición.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/model", get(routes::model_info))
        .route("/predict", post(routes::predict))
        .route("/analyze", post(routes::analyze))
        .route("/ws/heatmap", get(ws_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
