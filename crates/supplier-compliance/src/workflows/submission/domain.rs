use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::error::ComplianceError;
use crate::workflows::ids::{
    ActorId, QuestionId, QuestionnaireId, RequirementId, ResponseId, SubmissionId, SupplierId,
    VerificationId,
};
use crate::workflows::questionnaire::{Answer, ScoreCard};
use crate::workflows::verification::Grade;

/// Denormalized result of the latest submitted attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseOutcome {
    Questionnaire {
        submission_id: SubmissionId,
        percentage: f64,
        passed: bool,
    },
    #[serde(rename = "checkfix")]
    CheckFix {
        verification_id: VerificationId,
        grade: Grade,
        passed: bool,
    },
}

impl ResponseOutcome {
    pub fn passed(&self) -> bool {
        match self {
            ResponseOutcome::Questionnaire { passed, .. }
            | ResponseOutcome::CheckFix { passed, .. } => *passed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
    RevisionRequested,
}

impl ReviewDecision {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewDecision::Approved => "approved",
            ReviewDecision::Rejected => "rejected",
            ReviewDecision::RevisionRequested => "revision_requested",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAnnotation {
    pub reviewer_id: ActorId,
    pub reviewed_at: DateTime<Utc>,
    pub decision: ReviewDecision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// The supplier's single live response to a requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierResponse {
    pub id: ResponseId,
    pub requirement_id: RequirementId,
    pub supplier_id: SupplierId,
    attempt: u32,
    submitted_at: Option<DateTime<Utc>>,
    outcome: Option<ResponseOutcome>,
    drafts: BTreeMap<QuestionId, Answer>,
    review: Option<ReviewAnnotation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SupplierResponse {
    pub fn open(
        requirement_id: RequirementId,
        supplier_id: SupplierId,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ResponseId::generate(),
            requirement_id,
            supplier_id,
            attempt: 1,
            submitted_at: None,
            outcome: None,
            drafts: BTreeMap::new(),
            review: None,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }

    /// Outcome of the most recent submission; survives reopening.
    pub fn outcome(&self) -> Option<&ResponseOutcome> {
        self.outcome.as_ref()
    }

    pub fn review(&self) -> Option<&ReviewAnnotation> {
        self.review.as_ref()
    }

    pub fn drafts(&self) -> impl Iterator<Item = &Answer> {
        self.drafts.values()
    }

    pub fn draft_answers(&self) -> Vec<Answer> {
        self.drafts.values().cloned().collect()
    }

    /// Merge draft answers, replacing earlier drafts for the same question.
    pub fn upsert_drafts(
        &mut self,
        answers: Vec<Answer>,
        at: DateTime<Utc>,
    ) -> Result<(), ComplianceError> {
        self.ensure_open()?;
        for answer in answers {
            self.drafts.insert(answer.question_id.clone(), answer);
        }
        self.updated_at = at;
        Ok(())
    }

    pub fn record_outcome(
        &mut self,
        outcome: ResponseOutcome,
        at: DateTime<Utc>,
    ) -> Result<(), ComplianceError> {
        self.ensure_open()?;
        self.outcome = Some(outcome);
        self.drafts.clear();
        self.submitted_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    pub fn annotate_review(
        &mut self,
        reviewer_id: &ActorId,
        decision: ReviewDecision,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) {
        self.review = Some(ReviewAnnotation {
            reviewer_id: reviewer_id.clone(),
            reviewed_at: at,
            decision,
            notes: notes.filter(|text| !text.trim().is_empty()),
        });
        self.updated_at = at;
    }

    /// Open a fresh attempt after a rejection or a revision request.
    pub fn reopen(&mut self, at: DateTime<Utc>) {
        self.attempt += 1;
        self.submitted_at = None;
        self.updated_at = at;
    }

    fn ensure_open(&self) -> Result<(), ComplianceError> {
        if self.is_submitted() {
            Err(ComplianceError::ResponseAlreadySubmitted(self.id.clone()))
        } else {
            Ok(())
        }
    }
}

/// Immutable scored snapshot of one questionnaire attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireSubmission {
    pub id: SubmissionId,
    pub response_id: ResponseId,
    pub requirement_id: RequirementId,
    pub questionnaire_id: QuestionnaireId,
    pub supplier_id: SupplierId,
    pub attempt: u32,
    pub score: ScoreCard,
    pub submitted_at: DateTime<Utc>,
}

impl QuestionnaireSubmission {
    pub fn outcome(&self) -> ResponseOutcome {
        ResponseOutcome::Questionnaire {
            submission_id: self.id.clone(),
            percentage: self.score.percentage,
            passed: self.score.passed,
        }
    }
}
