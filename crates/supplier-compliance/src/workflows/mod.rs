pub mod audit;
pub mod clock;
pub mod error;
mod facade;
pub mod ids;
pub mod lifecycle;
pub mod questionnaire;
pub mod relationship;
pub mod reminders;
pub mod repository;
pub mod requirement;
mod router;
pub mod store;
pub mod submission;
pub mod verification;

pub use error::{ComplianceError, ErrorKind, ValidationError};
pub use facade::ComplianceWorkflow;
pub use router::compliance_router;

use questionnaire::{QuestionRepository, QuestionnaireRepository};
use relationship::RelationshipRepository;
use requirement::RequirementRepository;
use submission::{ResponseRepository, SubmissionRepository};
use verification::VerificationRepository;

/// Every repository the workflow touches, satisfied by a single backing store.
pub trait ComplianceStore:
    RelationshipRepository
    + RequirementRepository
    + ResponseRepository
    + SubmissionRepository
    + VerificationRepository
    + QuestionnaireRepository
    + QuestionRepository
{
}

impl<T> ComplianceStore for T where
    T: RelationshipRepository
        + RequirementRepository
        + ResponseRepository
        + SubmissionRepository
        + VerificationRepository
        + QuestionnaireRepository
        + QuestionRepository
{
}
