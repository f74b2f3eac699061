use crate::api::responses::{ErrorResponse, ExplainedRecommendation, HealthResponse};
use crate::audit::recommendation_audit;
use crate::engine::Engine;
use crate::error::AppError;
use crate::explain::{Role, explain_recommendation};
use crate::state::{EmergencyType, Prediction, RecommendationDecision, TrafficState};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: RecommendationDecision,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyRequest {
    #[serde(rename = "type")]
    pub kind: EmergencyType,
    pub origin: String,
    pub destination: String,
}

fn internal_error(err: AppError) -> Response {
    error!(error = %err, "Internal error while handling request");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error")),
    )
        .into_response()
}

fn with_snapshot<F>(engine: &Engine, f: F) -> Response
where
    F: FnOnce(TrafficState) -> Response,
{
    match engine.snapshot() {
        Ok(state) => f(state),
        Err(err) => internal_error(err),
    }
}

pub async fn get_health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

pub async fn get_junctions(State(engine): State<Arc<Engine>>) -> Response {
    with_snapshot(&engine, |state| Json(state.junctions).into_response())
}

pub async fn get_alerts(State(engine): State<Arc<Engine>>) -> Response {
    with_snapshot(&engine, |state| Json(state.alerts).into_response())
}

pub async fn get_metrics(State(engine): State<Arc<Engine>>) -> Response {
    with_snapshot(&engine, |state| Json(state.metrics).into_response())
}

pub async fn get_hourly(State(engine): State<Arc<Engine>>) -> Response {
    with_snapshot(&engine, |state| Json(state.hourly_data).into_response())
}

pub async fn get_predictions(State(engine): State<Arc<Engine>>) -> Response {
    with_snapshot(&engine, |state| Json(state.predictions).into_response())
}

pub async fn get_recommendations(
    State(engine): State<Arc<Engine>>,
    Query(query): Query<RoleQuery>,
) -> Response {
    with_snapshot(&engine, |state| {
        let enriched: Vec<ExplainedRecommendation> = state
            .recommendations
            .iter()
            .map(|rec| {
                let prediction = prediction_for(&state.predictions, &rec.junction_id);
                ExplainedRecommendation {
                    explanation: explain_recommendation(rec, prediction, query.role),
                    recommendation: rec.clone(),
                }
            })
            .collect();
        Json(enriched).into_response()
    })
}

fn prediction_for<'a>(predictions: &'a [Prediction], junction_id: &str) -> Option<&'a Prediction> {
    predictions.iter().find(|p| p.junction_id == junction_id)
}

pub async fn patch_recommendation(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<String>,
    Query(query): Query<RoleQuery>,
    Json(body): Json<UpdateStatusRequest>,
) -> Response {
    let updated = match engine.update_recommendation_status(&id, body.status) {
        Ok(updated) => updated,
        Err(err) => return internal_error(err),
    };

    match updated {
        Some(rec) => {
            let role = query.role.unwrap_or(Role::Ops);
            let explanation = explain_recommendation(&rec, None, Some(role));
            let explanation_text = explanation
                .first()
                .map(|e| e.text.clone())
                .unwrap_or_default();
            engine.store().append_audit(recommendation_audit(
                &id,
                body.status,
                role,
                explanation_text,
            ));
            Json(ExplainedRecommendation {
                recommendation: rec,
                explanation,
            })
            .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Recommendation not found")),
        )
            .into_response(),
    }
}

pub async fn post_emergency(
    State(engine): State<Arc<Engine>>,
    Json(body): Json<EmergencyRequest>,
) -> Response {
    match engine.trigger_emergency(body.kind, &body.origin, &body.destination) {
        Ok(Some(plan)) => (StatusCode::CREATED, Json(plan)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(
                "Could not plan corridor for provided junctions",
            )),
        )
            .into_response(),
        Err(err) => internal_error(err),
    }
}
