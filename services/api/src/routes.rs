use crate::infra::{AppState, ComplianceState};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Serialize;
use serde_json::json;
use supplier_compliance::error::AppError;
use supplier_compliance::workflows::compliance_router;
use supplier_compliance::workflows::ids::QuestionnaireId;
use supplier_compliance::workflows::questionnaire::{Question, Questionnaire};
use supplier_compliance::workflows::reminders::Reminder;
use supplier_compliance::workflows::repository::{Page, PageRequest};

#[derive(Debug, Serialize)]
pub(crate) struct ReminderRunResponse {
    pub(crate) days_before: i64,
    pub(crate) sent: Vec<Reminder>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionnaireDetail {
    pub(crate) questionnaire: Questionnaire,
    pub(crate) questions: Vec<Question>,
}

pub(crate) fn with_compliance_routes(state: ComplianceState) -> Router {
    let local = Router::new()
        .route("/api/v1/questionnaires", get(questionnaires_endpoint))
        .route(
            "/api/v1/questionnaires/:questionnaire_id",
            get(questionnaire_endpoint),
        )
        .route("/api/v1/reminders/dispatch", post(dispatch_reminders_endpoint))
        .with_state(state.clone());

    compliance_router(state.workflow)
        .merge(local)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn questionnaires_endpoint(
    State(state): State<ComplianceState>,
) -> Result<Json<Page<Questionnaire>>, AppError> {
    let page = state
        .workflow
        .questionnaires()
        .list(PageRequest::default())?;
    Ok(Json(page))
}

pub(crate) async fn questionnaire_endpoint(
    State(state): State<ComplianceState>,
    Path(questionnaire_id): Path<String>,
) -> Result<Json<QuestionnaireDetail>, AppError> {
    let id = QuestionnaireId(questionnaire_id);
    let catalogue = state.workflow.questionnaires();
    let questionnaire = catalogue.get(&id)?;
    let questions = catalogue.questions(&id)?;
    Ok(Json(QuestionnaireDetail {
        questionnaire,
        questions,
    }))
}

pub(crate) async fn dispatch_reminders_endpoint(
    State(state): State<ComplianceState>,
) -> Result<Json<ReminderRunResponse>, AppError> {
    let sent = state.workflow.send_reminders(&state.planner)?;
    tracing::info!(count = sent.len(), "reminder run finished");
    Ok(Json(ReminderRunResponse {
        days_before: state.planner.days_before(),
        sent,
    }))
}
