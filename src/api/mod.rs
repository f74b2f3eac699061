use crate::engine::Engine;
use axum::Router;
use axum::routing::{get, patch, post};
use std::sync::Arc;

pub mod handlers;
pub mod responses;

pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::get_health))
        .route("/api/junctions", get(handlers::get_junctions))
        .route("/api/alerts", get(handlers::get_alerts))
        .route("/api/recommendations", get(handlers::get_recommendations))
        .route("/api/recommendations/{id}", patch(handlers::patch_recommendation))
        .route("/api/metrics", get(handlers::get_metrics))
        .route("/api/hourly", get(handlers::get_hourly))
        .route("/api/predictions", get(handlers::get_predictions))
        .route("/api/emergencies", post(handlers::post_emergency))
        .with_state(engine)
}
