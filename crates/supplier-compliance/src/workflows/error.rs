use serde::Serialize;
use std::fmt;

use super::ids::{RelationshipId, RequirementId, ResponseId, SupplierId};
use super::lifecycle::TransitionError;
use super::questionnaire::AnswerError;
use super::repository::RepositoryError;
use super::verification::ClientError;

/// Coarse error taxonomy callers map onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidTransition,
    Conflict,
    Validation,
    ExternalService,
    Unavailable,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Validation => "validation",
            ErrorKind::ExternalService => "external_service",
            ErrorKind::Unavailable => "unavailable",
        }
    }
}

/// Malformed input rejected before any state changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error("unknown {field} value '{value}'")]
    UnknownVariant { field: &'static str, value: String },
    #[error("{field} {reason}")]
    Field { field: &'static str, reason: String },
    #[error("requirement expects a {expected} response, not {found}")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl ValidationError {
    pub(crate) fn field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Field {
            field,
            reason: reason.into(),
        }
    }
}

/// Error raised by the workflow services.
#[derive(Debug, thiserror::Error)]
pub enum ComplianceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("relationship {0} cannot receive requirements until it is active with a bound supplier")]
    RelationshipNotActive(RelationshipId),
    #[error("requirement {id} is {status}; its configuration is locked")]
    RequirementLocked { id: RequirementId, status: &'static str },
    #[error("supplier {0} already has a relationship with this company")]
    RelationshipExists(SupplierId),
    #[error("a response already exists for requirement {0}")]
    ResponseAlreadyExists(RequirementId),
    #[error("response {0} has already been submitted")]
    ResponseAlreadySubmitted(ResponseId),
    #[error("conflicting write for {0}")]
    Conflict(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    ExternalService(#[from] ClientError),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl ComplianceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ComplianceError::NotFound { .. } => ErrorKind::NotFound,
            ComplianceError::Transition(_)
            | ComplianceError::RelationshipNotActive(_)
            | ComplianceError::RequirementLocked { .. } => ErrorKind::InvalidTransition,
            ComplianceError::RelationshipExists(_)
            | ComplianceError::ResponseAlreadyExists(_)
            | ComplianceError::ResponseAlreadySubmitted(_)
            | ComplianceError::Conflict(_) => ErrorKind::Conflict,
            ComplianceError::Validation(_) => ErrorKind::Validation,
            ComplianceError::ExternalService(_) => ErrorKind::ExternalService,
            ComplianceError::Unavailable(_) => ErrorKind::Unavailable,
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<AnswerError> for ComplianceError {
    fn from(value: AnswerError) -> Self {
        Self::Validation(ValidationError::Answer(value))
    }
}

impl From<RepositoryError> for ComplianceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepositoryError::Conflict => Self::Conflict("record".to_string()),
            RepositoryError::Unavailable(reason) => Self::Unavailable(reason),
        }
    }
}
