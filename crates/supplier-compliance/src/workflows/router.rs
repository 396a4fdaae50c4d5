use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::error::{ComplianceError, ErrorKind};
use super::facade::ComplianceWorkflow;
use super::ids::{ActorId, CompanyId, RelationshipId, RequirementId, SupplierId};
use super::questionnaire::Answer;
use super::relationship::{Classification, RelationshipFilter, RelationshipStatus};
use super::repository::PageRequest;
use super::requirement::{NewRequirement, RequirementFilter, RequirementKind, RequirementStatus};
use super::submission::GradeEvidence;
use super::verification::VerificationClient;
use super::ComplianceStore;

type Workflow<S, C> = Arc<ComplianceWorkflow<S, C>>;

/// Router exposing the company and supplier sides of the compliance workflow.
pub fn compliance_router<S, C>(workflow: Workflow<S, C>) -> Router
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    Router::new()
        .route(
            "/api/v1/companies/:company_id/relationships",
            post(invite_handler::<S, C>).get(list_relationships_handler::<S, C>),
        )
        .route(
            "/api/v1/companies/:company_id/relationships/:relationship_id/suspend",
            post(suspend_handler::<S, C>),
        )
        .route(
            "/api/v1/companies/:company_id/relationships/:relationship_id/reactivate",
            post(reactivate_handler::<S, C>),
        )
        .route(
            "/api/v1/companies/:company_id/relationships/:relationship_id/terminate",
            post(terminate_handler::<S, C>),
        )
        .route(
            "/api/v1/companies/:company_id/relationships/:relationship_id/requirements",
            post(create_requirement_handler::<S, C>),
        )
        .route(
            "/api/v1/companies/:company_id/requirements",
            get(company_requirements_handler::<S, C>),
        )
        .route(
            "/api/v1/companies/:company_id/requirements/:requirement_id",
            get(company_requirement_handler::<S, C>),
        )
        .route(
            "/api/v1/companies/:company_id/requirements/:requirement_id/config",
            put(configure_requirement_handler::<S, C>),
        )
        .route(
            "/api/v1/companies/:company_id/requirements/:requirement_id/submissions",
            get(submissions_handler::<S, C>),
        )
        .route(
            "/api/v1/companies/:company_id/requirements/:requirement_id/verifications",
            get(verifications_handler::<S, C>),
        )
        .route(
            "/api/v1/companies/:company_id/requirements/:requirement_id/approve",
            post(approve_handler::<S, C>),
        )
        .route(
            "/api/v1/companies/:company_id/requirements/:requirement_id/reject",
            post(reject_handler::<S, C>),
        )
        .route(
            "/api/v1/companies/:company_id/requirements/:requirement_id/request-revision",
            post(request_revision_handler::<S, C>),
        )
        .route(
            "/api/v1/companies/:company_id/requirements/:requirement_id/expire",
            post(expire_handler::<S, C>),
        )
        .route(
            "/api/v1/invitations/:relationship_id/accept",
            post(accept_handler::<S, C>),
        )
        .route(
            "/api/v1/invitations/:relationship_id/decline",
            post(decline_handler::<S, C>),
        )
        .route(
            "/api/v1/suppliers/:supplier_id/requirements",
            get(supplier_requirements_handler::<S, C>),
        )
        .route(
            "/api/v1/suppliers/:supplier_id/requirements/:requirement_id/start",
            post(start_handler::<S, C>),
        )
        .route(
            "/api/v1/suppliers/:supplier_id/requirements/:requirement_id/response",
            get(response_handler::<S, C>),
        )
        .route(
            "/api/v1/suppliers/:supplier_id/requirements/:requirement_id/drafts",
            put(drafts_handler::<S, C>),
        )
        .route(
            "/api/v1/suppliers/:supplier_id/requirements/:requirement_id/submissions",
            post(submit_questionnaire_handler::<S, C>),
        )
        .route(
            "/api/v1/suppliers/:supplier_id/requirements/:requirement_id/verifications",
            post(submit_grade_handler::<S, C>),
        )
        .route(
            "/api/v1/suppliers/:supplier_id/requirements/:requirement_id/retry",
            post(retry_handler::<S, C>),
        )
        .with_state(workflow)
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidTransition | ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::ExternalService => StatusCode::BAD_GATEWAY,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ComplianceError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let payload = json!({
            "error": self.to_string(),
            "kind": kind.label(),
        });
        (kind.status_code(), axum::Json(payload)).into_response()
    }
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, ComplianceError>) -> Response {
    match result {
        Ok(body) => (status, axum::Json(body)).into_response(),
        Err(error) => {
            if matches!(
                error.kind(),
                ErrorKind::ExternalService | ErrorKind::Unavailable
            ) {
                tracing::warn!(error = %error, "compliance request failed");
            }
            error.into_response()
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RelationshipAction {
    Suspend,
    Reactivate,
    Terminate,
}

#[derive(Debug, Clone, Copy)]
enum ReviewAction {
    Approve,
    Reject,
    RequestRevision,
    Expire,
}

#[derive(Debug, Deserialize)]
struct ListParams<F> {
    status: Option<F>,
    offset: Option<usize>,
    limit: Option<usize>,
}

impl<F> ListParams<F> {
    fn page(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.offset.unwrap_or(defaults.offset),
            self.limit.unwrap_or(defaults.limit),
        )
    }
}

#[derive(Debug, Deserialize)]
struct PageParams {
    offset: Option<usize>,
    limit: Option<usize>,
}

impl PageParams {
    fn page(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.offset.unwrap_or(defaults.offset),
            self.limit.unwrap_or(defaults.limit),
        )
    }
}

#[derive(Debug, Deserialize)]
struct InviteRequest {
    invited_email: String,
    #[serde(default)]
    classification: Classification,
    actor_id: ActorId,
}

#[derive(Debug, Deserialize)]
struct AcceptRequest {
    supplier_id: SupplierId,
    actor_id: ActorId,
}

/// Body shared by transitions that only carry an actor and optional note.
#[derive(Debug, Deserialize)]
struct ActorRequest {
    actor_id: ActorId,
    #[serde(default, alias = "notes")]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateRequirementRequest {
    actor_id: ActorId,
    #[serde(flatten)]
    requirement: NewRequirement,
}

#[derive(Debug, Deserialize)]
struct ConfigureRequest {
    actor_id: ActorId,
    kind: RequirementKind,
}

#[derive(Debug, Deserialize)]
struct AnswersRequest {
    actor_id: ActorId,
    #[serde(default)]
    answers: Vec<Answer>,
}

#[derive(Debug, Deserialize)]
struct GradeRequest {
    actor_id: ActorId,
    #[serde(flatten)]
    evidence: GradeEvidence,
}

async fn invite_handler<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path(company_id): Path<String>,
    axum::Json(request): axum::Json<InviteRequest>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let result = workflow.invite_supplier(
        CompanyId(company_id),
        &request.invited_email,
        request.classification,
        &request.actor_id,
    );
    respond(StatusCode::CREATED, result)
}

async fn list_relationships_handler<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path(company_id): Path<String>,
    Query(params): Query<ListParams<RelationshipStatus>>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let filter = RelationshipFilter {
        status: params.status,
        ..RelationshipFilter::for_company(CompanyId(company_id))
    };
    respond(
        StatusCode::OK,
        workflow.relationships().list(&filter, params.page()),
    )
}

async fn suspend_handler<S, C>(
    state: State<Workflow<S, C>>,
    path: Path<(String, String)>,
    body: axum::Json<ActorRequest>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    relationship_action::<S, C>(state, path, body, RelationshipAction::Suspend).await
}

async fn reactivate_handler<S, C>(
    state: State<Workflow<S, C>>,
    path: Path<(String, String)>,
    body: axum::Json<ActorRequest>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    relationship_action::<S, C>(state, path, body, RelationshipAction::Reactivate).await
}

async fn terminate_handler<S, C>(
    state: State<Workflow<S, C>>,
    path: Path<(String, String)>,
    body: axum::Json<ActorRequest>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    relationship_action::<S, C>(state, path, body, RelationshipAction::Terminate).await
}

async fn relationship_action<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path((company_id, relationship_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<ActorRequest>,
    action: RelationshipAction,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let company_id = CompanyId(company_id);
    let id = RelationshipId(relationship_id);
    let actor = &request.actor_id;
    let reason = request.reason;
    let result = match action {
        RelationshipAction::Suspend => {
            workflow.suspend_relationship(&company_id, &id, actor, reason)
        }
        RelationshipAction::Reactivate => {
            workflow.reactivate_relationship(&company_id, &id, actor, reason)
        }
        RelationshipAction::Terminate => {
            workflow.terminate_relationship(&company_id, &id, actor, reason)
        }
    };
    respond(StatusCode::OK, result)
}

async fn create_requirement_handler<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path((company_id, relationship_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<CreateRequirementRequest>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let result = workflow.create_requirement(
        &CompanyId(company_id),
        &RelationshipId(relationship_id),
        request.requirement,
        &request.actor_id,
    );
    respond(StatusCode::CREATED, result)
}

async fn company_requirements_handler<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path(company_id): Path<String>,
    Query(params): Query<ListParams<RequirementStatus>>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let filter = RequirementFilter {
        company_id: Some(CompanyId(company_id)),
        status: params.status,
        ..RequirementFilter::default()
    };
    respond(
        StatusCode::OK,
        workflow.requirements().list(&filter, params.page()),
    )
}

async fn company_requirement_handler<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path((company_id, requirement_id)): Path<(String, String)>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let result = workflow
        .requirements()
        .get_for_company(&CompanyId(company_id), &RequirementId(requirement_id));
    respond(StatusCode::OK, result)
}

async fn configure_requirement_handler<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path((company_id, requirement_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<ConfigureRequest>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let result = workflow.update_requirement_config(
        &CompanyId(company_id),
        &RequirementId(requirement_id),
        request.kind,
        &request.actor_id,
    );
    respond(StatusCode::OK, result)
}

async fn submissions_handler<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path((company_id, requirement_id)): Path<(String, String)>,
    Query(params): Query<PageParams>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let id = RequirementId(requirement_id);
    let result = workflow
        .requirements()
        .get_for_company(&CompanyId(company_id), &id)
        .and_then(|_| workflow.submissions().submissions(&id, params.page()));
    respond(StatusCode::OK, result)
}

async fn verifications_handler<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path((company_id, requirement_id)): Path<(String, String)>,
    Query(params): Query<PageParams>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let id = RequirementId(requirement_id);
    let result = workflow
        .requirements()
        .get_for_company(&CompanyId(company_id), &id)
        .and_then(|_| workflow.submissions().verifications(&id, params.page()));
    respond(StatusCode::OK, result)
}

async fn approve_handler<S, C>(
    state: State<Workflow<S, C>>,
    path: Path<(String, String)>,
    body: axum::Json<ActorRequest>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    review::<S, C>(state, path, body, ReviewAction::Approve).await
}

async fn reject_handler<S, C>(
    state: State<Workflow<S, C>>,
    path: Path<(String, String)>,
    body: axum::Json<ActorRequest>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    review::<S, C>(state, path, body, ReviewAction::Reject).await
}

async fn request_revision_handler<S, C>(
    state: State<Workflow<S, C>>,
    path: Path<(String, String)>,
    body: axum::Json<ActorRequest>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    review::<S, C>(state, path, body, ReviewAction::RequestRevision).await
}

async fn expire_handler<S, C>(
    state: State<Workflow<S, C>>,
    path: Path<(String, String)>,
    body: axum::Json<ActorRequest>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    review::<S, C>(state, path, body, ReviewAction::Expire).await
}

async fn review<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path((company_id, requirement_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<ActorRequest>,
    action: ReviewAction,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let company_id = CompanyId(company_id);
    let id = RequirementId(requirement_id);
    let reviewer = &request.actor_id;
    let notes = request.reason;
    match action {
        ReviewAction::Approve => respond(
            StatusCode::OK,
            workflow.approve(&company_id, &id, reviewer, notes),
        ),
        ReviewAction::Reject => respond(
            StatusCode::OK,
            workflow.reject(&company_id, &id, reviewer, notes),
        ),
        ReviewAction::RequestRevision => respond(
            StatusCode::OK,
            workflow.request_revision(&company_id, &id, reviewer, notes),
        ),
        ReviewAction::Expire => respond(
            StatusCode::OK,
            workflow.expire_requirement(&company_id, &id, reviewer, notes),
        ),
    }
}

async fn accept_handler<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path(relationship_id): Path<String>,
    axum::Json(request): axum::Json<AcceptRequest>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let result = workflow.accept_invitation(
        &RelationshipId(relationship_id),
        request.supplier_id,
        &request.actor_id,
    );
    respond(StatusCode::OK, result)
}

async fn decline_handler<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path(relationship_id): Path<String>,
    axum::Json(request): axum::Json<ActorRequest>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let result = workflow.decline_invitation(
        &RelationshipId(relationship_id),
        &request.actor_id,
        request.reason,
    );
    respond(StatusCode::OK, result)
}

async fn supplier_requirements_handler<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path(supplier_id): Path<String>,
    Query(params): Query<ListParams<RequirementStatus>>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let filter = RequirementFilter {
        status: params.status,
        ..RequirementFilter::for_supplier(SupplierId(supplier_id))
    };
    respond(
        StatusCode::OK,
        workflow.requirements().list(&filter, params.page()),
    )
}

async fn start_handler<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path((supplier_id, requirement_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<ActorRequest>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let result = workflow.start_response(
        &SupplierId(supplier_id),
        &RequirementId(requirement_id),
        &request.actor_id,
    );
    respond(StatusCode::OK, result)
}

async fn response_handler<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path((supplier_id, requirement_id)): Path<(String, String)>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let result = workflow
        .submissions()
        .response(&SupplierId(supplier_id), &RequirementId(requirement_id));
    respond(StatusCode::OK, result)
}

async fn drafts_handler<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path((supplier_id, requirement_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<AnswersRequest>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let result = workflow.save_drafts(
        &SupplierId(supplier_id),
        &RequirementId(requirement_id),
        request.answers,
        &request.actor_id,
    );
    respond(StatusCode::OK, result)
}

async fn submit_questionnaire_handler<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path((supplier_id, requirement_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<AnswersRequest>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let result = workflow.submit_questionnaire(
        &SupplierId(supplier_id),
        &RequirementId(requirement_id),
        request.answers,
        &request.actor_id,
    );
    respond(StatusCode::ACCEPTED, result)
}

async fn submit_grade_handler<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path((supplier_id, requirement_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<GradeRequest>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let result = workflow.submit_grade(
        &SupplierId(supplier_id),
        &RequirementId(requirement_id),
        request.evidence,
        &request.actor_id,
    );
    respond(StatusCode::ACCEPTED, result)
}

async fn retry_handler<S, C>(
    State(workflow): State<Workflow<S, C>>,
    Path((supplier_id, requirement_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<ActorRequest>,
) -> Response
where
    S: ComplianceStore + 'static,
    C: VerificationClient + ?Sized + 'static,
{
    let result = workflow.retry(
        &SupplierId(supplier_id),
        &RequirementId(requirement_id),
        &request.actor_id,
    );
    respond(StatusCode::OK, result)
}
