use serde::Deserialize;

use super::domain::CheckFixVerification;
use crate::workflows::ids::{RequirementId, ResponseId, SupplierId, VerificationId};
use crate::workflows::repository::{Page, PageRequest, RepositoryError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VerificationFilter {
    pub response_id: Option<ResponseId>,
    pub requirement_id: Option<RequirementId>,
    pub supplier_id: Option<SupplierId>,
}

impl VerificationFilter {
    pub fn matches(&self, verification: &CheckFixVerification) -> bool {
        self.response_id
            .as_ref()
            .map_or(true, |id| &verification.response_id == id)
            && self
                .requirement_id
                .as_ref()
                .map_or(true, |id| &verification.requirement_id == id)
            && self
                .supplier_id
                .as_ref()
                .map_or(true, |id| &verification.supplier_id == id)
    }
}

/// Storage for verifications. At most one verification exists per
/// (response, attempt); a second insert yields `Conflict`.
pub trait VerificationRepository: Send + Sync {
    fn insert_verification(
        &self,
        verification: CheckFixVerification,
    ) -> Result<CheckFixVerification, RepositoryError>;
    fn fetch_verification(
        &self,
        id: &VerificationId,
    ) -> Result<Option<CheckFixVerification>, RepositoryError>;
    fn fetch_verification_for_attempt(
        &self,
        response_id: &ResponseId,
        attempt: u32,
    ) -> Result<Option<CheckFixVerification>, RepositoryError>;
    fn list_verifications(
        &self,
        filter: &VerificationFilter,
        page: PageRequest,
    ) -> Result<Page<CheckFixVerification>, RepositoryError>;
}
