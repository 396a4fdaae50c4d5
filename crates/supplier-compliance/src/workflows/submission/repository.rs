use serde::Deserialize;

use super::domain::{QuestionnaireSubmission, SupplierResponse};
use crate::workflows::ids::{RequirementId, ResponseId, SubmissionId, SupplierId};
use crate::workflows::repository::{Page, PageRequest, RepositoryError};

/// Storage for responses. A second response for the same requirement yields
/// `Conflict`.
pub trait ResponseRepository: Send + Sync {
    fn insert_response(&self, response: SupplierResponse)
        -> Result<SupplierResponse, RepositoryError>;
    fn update_response(&self, response: SupplierResponse) -> Result<(), RepositoryError>;
    fn fetch_response(&self, id: &ResponseId) -> Result<Option<SupplierResponse>, RepositoryError>;
    fn fetch_response_for_requirement(
        &self,
        requirement_id: &RequirementId,
    ) -> Result<Option<SupplierResponse>, RepositoryError>;
    fn list_responses(
        &self,
        supplier_id: &SupplierId,
        page: PageRequest,
    ) -> Result<Page<SupplierResponse>, RepositoryError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubmissionFilter {
    pub response_id: Option<ResponseId>,
    pub requirement_id: Option<RequirementId>,
    pub supplier_id: Option<SupplierId>,
}

impl SubmissionFilter {
    pub fn matches(&self, submission: &QuestionnaireSubmission) -> bool {
        self.response_id
            .as_ref()
            .map_or(true, |id| &submission.response_id == id)
            && self
                .requirement_id
                .as_ref()
                .map_or(true, |id| &submission.requirement_id == id)
            && self
                .supplier_id
                .as_ref()
                .map_or(true, |id| &submission.supplier_id == id)
    }
}

/// Storage for questionnaire submissions, unique per (response, attempt).
pub trait SubmissionRepository: Send + Sync {
    fn insert_submission(
        &self,
        submission: QuestionnaireSubmission,
    ) -> Result<QuestionnaireSubmission, RepositoryError>;
    fn fetch_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<QuestionnaireSubmission>, RepositoryError>;
    fn fetch_submission_for_attempt(
        &self,
        response_id: &ResponseId,
        attempt: u32,
    ) -> Result<Option<QuestionnaireSubmission>, RepositoryError>;
    fn list_submissions(
        &self,
        filter: &SubmissionFilter,
        page: PageRequest,
    ) -> Result<Page<QuestionnaireSubmission>, RepositoryError>;
}
