use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::error::{ComplianceError, ValidationError};
use crate::workflows::ids::{
    ActorId, CompanyId, QuestionnaireId, RelationshipId, RequirementId, SupplierId,
};
use crate::workflows::lifecycle::{apply_transition, Lifecycle, StatusHistory, TransitionError};
use crate::workflows::relationship::Relationship;
use crate::workflows::verification::{Grade, DEFAULT_MAX_REPORT_AGE_DAYS, DEFAULT_MINIMUM_GRADE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementStatus {
    Pending,
    InProgress,
    Submitted,
    UnderReview,
    Rejected,
    Approved,
    Expired,
}

impl RequirementStatus {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Pending,
            Self::InProgress,
            Self::Submitted,
            Self::UnderReview,
            Self::Rejected,
            Self::Approved,
            Self::Expired,
        ]
    }

    /// States from which a response may be submitted.
    pub fn accepts_submission(self) -> bool {
        matches!(self, Self::InProgress | Self::UnderReview)
    }
}

impl Lifecycle for RequirementStatus {
    const ENTITY: &'static str = "requirement";

    fn allowed_transitions(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::InProgress, Self::Expired],
            Self::InProgress => &[Self::Submitted, Self::Expired],
            Self::Submitted => &[Self::Approved, Self::Rejected, Self::UnderReview],
            Self::UnderReview => &[Self::Submitted],
            Self::Rejected => &[Self::InProgress],
            Self::Approved | Self::Expired => &[],
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Rejected => "rejected",
            Self::Approved => "approved",
            Self::Expired => "expired",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionnaireConfig {
    pub questionnaire_id: QuestionnaireId,
    /// Overrides the questionnaire's default passing score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passing_score: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_grade: Option<Grade>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_report_age_days: Option<i64>,
}

impl GradeConfig {
    pub fn effective_minimum_grade(&self) -> Grade {
        self.minimum_grade.unwrap_or(DEFAULT_MINIMUM_GRADE)
    }

    /// `None` when the age check is disabled by a non-positive setting.
    pub fn effective_max_report_age_days(&self) -> Option<i64> {
        let days = self
            .max_report_age_days
            .unwrap_or(DEFAULT_MAX_REPORT_AGE_DAYS);
        (days > 0).then_some(days)
    }
}

/// How a requirement is satisfied, with the kind-specific configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequirementKind {
    Questionnaire(QuestionnaireConfig),
    #[serde(rename = "checkfix")]
    CheckFix(GradeConfig),
}

impl RequirementKind {
    pub const fn label(&self) -> &'static str {
        match self {
            RequirementKind::Questionnaire(_) => "questionnaire",
            RequirementKind::CheckFix(_) => "checkfix",
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if let RequirementKind::Questionnaire(QuestionnaireConfig {
            passing_score: Some(score),
            ..
        }) = self
        {
            if *score > 100 {
                return Err(ValidationError::field(
                    "passing_score",
                    format!("must be between 0 and 100, got {score}"),
                ));
            }
        }
        Ok(())
    }
}

/// Fields supplied by the company when creating a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequirement {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub kind: RequirementKind,
}

/// A compliance obligation placed on a supplier within one relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: RequirementId,
    pub relationship_id: RelationshipId,
    pub company_id: CompanyId,
    pub supplier_id: SupplierId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    kind: RequirementKind,
    status: RequirementStatus,
    history: StatusHistory<RequirementStatus>,
    pub(super) reminder_sent_at: Option<DateTime<Utc>>,
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Requirement {
    pub fn create_for(
        relationship: &Relationship,
        draft: NewRequirement,
        actor: &ActorId,
        at: DateTime<Utc>,
    ) -> Result<Self, ComplianceError> {
        let supplier_id = relationship
            .supplier_id
            .clone()
            .filter(|_| relationship.can_receive_requirements())
            .ok_or_else(|| ComplianceError::RelationshipNotActive(relationship.id.clone()))?;

        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::field("title", "must not be empty").into());
        }
        draft.kind.validate()?;

        Ok(Self {
            id: RequirementId::generate(),
            relationship_id: relationship.id.clone(),
            company_id: relationship.company_id.clone(),
            supplier_id,
            title,
            description: draft.description,
            priority: draft.priority,
            due_date: draft.due_date,
            kind: draft.kind,
            status: RequirementStatus::Pending,
            history: StatusHistory::default(),
            reminder_sent_at: None,
            created_by: actor.clone(),
            created_at: at,
            updated_at: at,
        })
    }

    pub fn kind(&self) -> &RequirementKind {
        &self.kind
    }

    pub fn status(&self) -> RequirementStatus {
        self.status
    }

    pub fn history(&self) -> &StatusHistory<RequirementStatus> {
        &self.history
    }

    pub fn reminder_sent_at(&self) -> Option<DateTime<Utc>> {
        self.reminder_sent_at
    }

    /// Replace the kind configuration. Only PENDING requirements may change,
    /// and never to a different kind.
    pub fn update_kind(
        &mut self,
        kind: RequirementKind,
        at: DateTime<Utc>,
    ) -> Result<(), ComplianceError> {
        if self.status != RequirementStatus::Pending {
            return Err(ComplianceError::RequirementLocked {
                id: self.id.clone(),
                status: self.status.label(),
            });
        }
        if kind.label() != self.kind.label() {
            return Err(ValidationError::KindMismatch {
                expected: self.kind.label(),
                found: kind.label(),
            }
            .into());
        }
        kind.validate()?;

        self.kind = kind;
        self.updated_at = at;
        Ok(())
    }

    pub fn transition_status(
        &mut self,
        to: RequirementStatus,
        actor: &ActorId,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        apply_transition(&mut self.status, &mut self.history, to, actor, reason, at)?;
        self.updated_at = at;
        Ok(())
    }

    pub fn start(&mut self, actor: &ActorId, at: DateTime<Utc>) -> Result<(), TransitionError> {
        self.expect_status(RequirementStatus::Pending, RequirementStatus::InProgress)?;
        self.transition_status(
            RequirementStatus::InProgress,
            actor,
            Some("supplier started a response".to_string()),
            at,
        )
    }

    /// Record a submission from IN_PROGRESS or a resubmission from UNDER_REVIEW.
    pub fn submit(&mut self, actor: &ActorId, at: DateTime<Utc>) -> Result<(), TransitionError> {
        let reason = match self.status {
            RequirementStatus::UnderReview => "revision resubmitted",
            _ => "response submitted",
        };
        self.transition_status(
            RequirementStatus::Submitted,
            actor,
            Some(reason.to_string()),
            at,
        )
    }

    pub fn approve(
        &mut self,
        actor: &ActorId,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.transition_status(RequirementStatus::Approved, actor, notes, at)
    }

    pub fn reject(
        &mut self,
        actor: &ActorId,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.transition_status(RequirementStatus::Rejected, actor, reason, at)
    }

    pub fn request_revision(
        &mut self,
        actor: &ActorId,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.transition_status(RequirementStatus::UnderReview, actor, notes, at)
    }

    pub fn retry(&mut self, actor: &ActorId, at: DateTime<Utc>) -> Result<(), TransitionError> {
        self.expect_status(RequirementStatus::Rejected, RequirementStatus::InProgress)?;
        self.transition_status(
            RequirementStatus::InProgress,
            actor,
            Some("supplier retrying after rejection".to_string()),
            at,
        )
    }

    pub fn expire(
        &mut self,
        actor: &ActorId,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.transition_status(RequirementStatus::Expired, actor, reason, at)
    }

    // IN_PROGRESS is reachable from both PENDING and REJECTED; each entry point owns one.
    fn expect_status(
        &self,
        expected: RequirementStatus,
        to: RequirementStatus,
    ) -> Result<(), TransitionError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(TransitionError {
                entity: RequirementStatus::ENTITY,
                from: self.status.label(),
                to: to.label(),
            })
        }
    }
}
