//! Supplier responses and the orchestrator that scores, verifies and drives
//! requirements through review.

mod domain;
mod orchestrator;
mod repository;

#[cfg(test)]
mod tests;

pub use domain::{
    QuestionnaireSubmission, ResponseOutcome, ReviewAnnotation, ReviewDecision, SupplierResponse,
};
pub use orchestrator::{
    GradeEvidence, QuestionnaireReceipt, ReviewReceipt, SubmissionOrchestrator,
    VerificationReceipt,
};
pub use repository::{ResponseRepository, SubmissionFilter, SubmissionRepository};
