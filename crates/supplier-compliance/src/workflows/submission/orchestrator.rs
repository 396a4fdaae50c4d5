use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{QuestionnaireSubmission, ResponseOutcome, ReviewDecision, SupplierResponse};
use super::repository::SubmissionFilter;
use crate::workflows::clock::Clock;
use crate::workflows::error::{ComplianceError, ValidationError};
use crate::workflows::ids::{ActorId, CompanyId, RequirementId, SubmissionId, SupplierId};
use crate::workflows::lifecycle::Lifecycle;
use crate::workflows::questionnaire::{Answer, AnswerError, ScoringEngine};
use crate::workflows::repository::{Page, PageRequest, RepositoryError};
use crate::workflows::requirement::{
    GradeConfig, QuestionnaireConfig, Requirement, RequirementKind, RequirementStatus,
};
use crate::workflows::verification::{
    CheckFixVerification, ClientError, VerificationClient, VerificationFilter,
    VerificationPolicy, VerificationTarget,
};
use crate::workflows::ComplianceStore;

/// Evidence a supplier provides for a grade requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeEvidence {
    pub report_hash: String,
    pub account_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionnaireReceipt {
    pub requirement: Requirement,
    pub response: SupplierResponse,
    pub submission: QuestionnaireSubmission,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReceipt {
    pub requirement: Requirement,
    pub response: SupplierResponse,
    pub verification: CheckFixVerification,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewReceipt {
    pub requirement: Requirement,
    pub response: SupplierResponse,
}

/// Coordinates responses, scoring, verification and the requirement lifecycle.
///
/// Writes are not atomic. Each submit persists the scored record first, then
/// the response, then the requirement, keyed by (response id, attempt), so a
/// retried call picks up where an interrupted one stopped.
pub struct SubmissionOrchestrator<S, C: ?Sized> {
    store: Arc<S>,
    client: Arc<C>,
    clock: Arc<dyn Clock>,
}

impl<S, C: ?Sized> Clone for SubmissionOrchestrator<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            client: self.client.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<S, C> SubmissionOrchestrator<S, C>
where
    S: ComplianceStore,
    C: VerificationClient + ?Sized,
{
    pub fn new(store: Arc<S>, client: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            client,
            clock,
        }
    }

    /// Open the supplier's response and move the requirement to IN_PROGRESS.
    ///
    /// Calling again while the response is unsubmitted returns it unchanged.
    pub fn start(
        &self,
        supplier_id: &SupplierId,
        requirement_id: &RequirementId,
        actor: &ActorId,
    ) -> Result<SupplierResponse, ComplianceError> {
        let mut requirement = self.requirement_for_supplier(supplier_id, requirement_id)?;
        let now = self.clock.now();

        if let Some(existing) = self.store.fetch_response_for_requirement(requirement_id)? {
            if existing.is_submitted() {
                return Err(ComplianceError::ResponseAlreadyExists(requirement_id.clone()));
            }
            if requirement.status() == RequirementStatus::Pending {
                tracing::warn!(
                    requirement_id = %requirement_id,
                    response_id = %existing.id,
                    "completing interrupted start"
                );
                requirement.start(actor, now)?;
                self.store.update_requirement(requirement)?;
            }
            return Ok(existing);
        }

        requirement.start(actor, now)?;
        let response = SupplierResponse::open(requirement_id.clone(), supplier_id.clone(), now);
        let response = self
            .store
            .insert_response(response)
            .map_err(|error| match error {
                RepositoryError::Conflict => {
                    ComplianceError::ResponseAlreadyExists(requirement_id.clone())
                }
                other => other.into(),
            })?;
        self.store.update_requirement(requirement)?;

        tracing::info!(
            requirement_id = %requirement_id,
            response_id = %response.id,
            "response started"
        );
        Ok(response)
    }

    /// Merge draft answers into the open response.
    pub fn save_drafts(
        &self,
        supplier_id: &SupplierId,
        requirement_id: &RequirementId,
        answers: Vec<Answer>,
    ) -> Result<SupplierResponse, ComplianceError> {
        let requirement = self.requirement_for_supplier(supplier_id, requirement_id)?;
        let config = questionnaire_config(&requirement)?;
        let mut response = self.response_for(requirement_id)?;

        let questions = self.store.list_questions(&config.questionnaire_id)?;
        if let Some(stray) = answers
            .iter()
            .find(|answer| !questions.iter().any(|q| q.id == answer.question_id))
        {
            return Err(AnswerError::UnknownQuestion(stray.question_id.clone()).into());
        }

        response.upsert_drafts(answers, self.clock.now())?;
        self.store.update_response(response.clone())?;
        Ok(response)
    }

    /// Score and record a questionnaire attempt. Empty `answers` submits the drafts.
    pub fn submit_questionnaire(
        &self,
        supplier_id: &SupplierId,
        requirement_id: &RequirementId,
        answers: Vec<Answer>,
        actor: &ActorId,
    ) -> Result<QuestionnaireReceipt, ComplianceError> {
        let mut requirement = self.requirement_for_supplier(supplier_id, requirement_id)?;
        let config = questionnaire_config(&requirement)?.clone();
        let mut response = self.response_for(requirement_id)?;
        let now = self.clock.now();

        if response.is_submitted() {
            let submission = self
                .store
                .fetch_submission_for_attempt(&response.id, response.attempt())?
                .ok_or_else(|| ComplianceError::ResponseAlreadySubmitted(response.id.clone()))?;
            self.complete_submission(&mut requirement, &response, actor)?;
            return Ok(QuestionnaireReceipt {
                requirement,
                response,
                submission,
            });
        }
        requirement
            .status()
            .check_transition(RequirementStatus::Submitted)?;

        let submission = match self
            .store
            .fetch_submission_for_attempt(&response.id, response.attempt())?
        {
            Some(existing) => {
                tracing::warn!(
                    response_id = %response.id,
                    attempt = response.attempt(),
                    "reusing recorded submission for attempt"
                );
                existing
            }
            None => {
                let answers = if answers.is_empty() {
                    response.draft_answers()
                } else {
                    answers
                };
                let scored = self.score(&config, &requirement, &response, answers, now)?;
                match self.store.insert_submission(scored) {
                    Ok(stored) => stored,
                    Err(RepositoryError::Conflict) => self
                        .store
                        .fetch_submission_for_attempt(&response.id, response.attempt())?
                        .ok_or_else(|| ComplianceError::Conflict(response.id.to_string()))?,
                    Err(other) => return Err(other.into()),
                }
            }
        };

        response.record_outcome(submission.outcome(), now)?;
        self.store.update_response(response.clone())?;
        requirement.submit(actor, now)?;
        self.store.update_requirement(requirement.clone())?;

        tracing::info!(
            requirement_id = %requirement_id,
            submission_id = %submission.id,
            attempt = submission.attempt,
            percentage = submission.score.percentage,
            passed = submission.score.passed,
            "questionnaire submitted"
        );
        Ok(QuestionnaireReceipt {
            requirement,
            response,
            submission,
        })
    }

    /// Verify a grade report through the provider and record the attempt.
    pub fn submit_grade(
        &self,
        supplier_id: &SupplierId,
        requirement_id: &RequirementId,
        evidence: GradeEvidence,
        actor: &ActorId,
    ) -> Result<VerificationReceipt, ComplianceError> {
        let mut requirement = self.requirement_for_supplier(supplier_id, requirement_id)?;
        let config = grade_config(&requirement)?.clone();
        let mut response = self.response_for(requirement_id)?;
        let now = self.clock.now();

        if response.is_submitted() {
            let verification = self
                .store
                .fetch_verification_for_attempt(&response.id, response.attempt())?
                .ok_or_else(|| ComplianceError::ResponseAlreadySubmitted(response.id.clone()))?;
            self.complete_submission(&mut requirement, &response, actor)?;
            return Ok(VerificationReceipt {
                requirement,
                response,
                verification,
            });
        }
        requirement
            .status()
            .check_transition(RequirementStatus::Submitted)?;

        let verification = match self
            .store
            .fetch_verification_for_attempt(&response.id, response.attempt())?
        {
            Some(existing) => {
                tracing::warn!(
                    response_id = %response.id,
                    attempt = response.attempt(),
                    "reusing recorded verification for attempt"
                );
                existing
            }
            None => {
                let verified = self.verify(&config, &requirement, &response, evidence, now)?;
                match self.store.insert_verification(verified) {
                    Ok(stored) => stored,
                    Err(RepositoryError::Conflict) => self
                        .store
                        .fetch_verification_for_attempt(&response.id, response.attempt())?
                        .ok_or_else(|| ComplianceError::Conflict(response.id.to_string()))?,
                    Err(other) => return Err(other.into()),
                }
            }
        };

        let outcome = ResponseOutcome::CheckFix {
            verification_id: verification.id.clone(),
            grade: verification.grade,
            passed: verification.passed,
        };
        response.record_outcome(outcome, now)?;
        self.store.update_response(response.clone())?;
        requirement.submit(actor, now)?;
        self.store.update_requirement(requirement.clone())?;

        tracing::info!(
            requirement_id = %requirement_id,
            verification_id = %verification.id,
            grade = verification.grade.label(),
            passed = verification.passed,
            "grade verification submitted"
        );
        Ok(VerificationReceipt {
            requirement,
            response,
            verification,
        })
    }

    pub fn approve(
        &self,
        company_id: &CompanyId,
        requirement_id: &RequirementId,
        reviewer: &ActorId,
        notes: Option<String>,
    ) -> Result<ReviewReceipt, ComplianceError> {
        self.review(
            company_id,
            requirement_id,
            reviewer,
            ReviewDecision::Approved,
            notes,
        )
    }

    pub fn reject(
        &self,
        company_id: &CompanyId,
        requirement_id: &RequirementId,
        reviewer: &ActorId,
        reason: Option<String>,
    ) -> Result<ReviewReceipt, ComplianceError> {
        self.review(
            company_id,
            requirement_id,
            reviewer,
            ReviewDecision::Rejected,
            reason,
        )
    }

    /// Send the response back for changes; the supplier resubmits without a new start.
    pub fn request_revision(
        &self,
        company_id: &CompanyId,
        requirement_id: &RequirementId,
        reviewer: &ActorId,
        notes: Option<String>,
    ) -> Result<ReviewReceipt, ComplianceError> {
        self.review(
            company_id,
            requirement_id,
            reviewer,
            ReviewDecision::RevisionRequested,
            notes,
        )
    }

    /// Reopen a rejected requirement for a new attempt.
    pub fn retry(
        &self,
        supplier_id: &SupplierId,
        requirement_id: &RequirementId,
        actor: &ActorId,
    ) -> Result<ReviewReceipt, ComplianceError> {
        let mut requirement = self.requirement_for_supplier(supplier_id, requirement_id)?;
        let mut response = self.response_for(requirement_id)?;
        let now = self.clock.now();

        requirement.retry(actor, now)?;
        if response.is_submitted() {
            response.reopen(now);
            self.store.update_response(response.clone())?;
        }
        self.store.update_requirement(requirement.clone())?;

        tracing::info!(
            requirement_id = %requirement_id,
            attempt = response.attempt(),
            "requirement reopened for retry"
        );
        Ok(ReviewReceipt {
            requirement,
            response,
        })
    }

    /// The response for a requirement visible to `supplier_id`.
    pub fn response(
        &self,
        supplier_id: &SupplierId,
        requirement_id: &RequirementId,
    ) -> Result<SupplierResponse, ComplianceError> {
        self.requirement_for_supplier(supplier_id, requirement_id)?;
        self.response_for(requirement_id)
    }

    pub fn submission(
        &self,
        id: &SubmissionId,
    ) -> Result<QuestionnaireSubmission, ComplianceError> {
        self.store
            .fetch_submission(id)?
            .ok_or_else(|| ComplianceError::not_found("submission", id))
    }

    pub fn submissions(
        &self,
        requirement_id: &RequirementId,
        page: PageRequest,
    ) -> Result<Page<QuestionnaireSubmission>, ComplianceError> {
        let filter = SubmissionFilter {
            requirement_id: Some(requirement_id.clone()),
            ..SubmissionFilter::default()
        };
        Ok(self.store.list_submissions(&filter, page)?)
    }

    pub fn verifications(
        &self,
        requirement_id: &RequirementId,
        page: PageRequest,
    ) -> Result<Page<CheckFixVerification>, ComplianceError> {
        let filter = VerificationFilter {
            requirement_id: Some(requirement_id.clone()),
            ..VerificationFilter::default()
        };
        Ok(self.store.list_verifications(&filter, page)?)
    }

    fn review(
        &self,
        company_id: &CompanyId,
        requirement_id: &RequirementId,
        reviewer: &ActorId,
        decision: ReviewDecision,
        notes: Option<String>,
    ) -> Result<ReviewReceipt, ComplianceError> {
        let mut requirement = self.requirement_for_company(company_id, requirement_id)?;
        let mut response = self.response_for(requirement_id)?;
        let now = self.clock.now();

        match decision {
            ReviewDecision::Approved => requirement.approve(reviewer, notes.clone(), now)?,
            ReviewDecision::Rejected => requirement.reject(reviewer, notes.clone(), now)?,
            ReviewDecision::RevisionRequested => {
                requirement.request_revision(reviewer, notes.clone(), now)?
            }
        }

        response.annotate_review(reviewer, decision, notes, now);
        if decision == ReviewDecision::RevisionRequested && response.is_submitted() {
            response.reopen(now);
        }
        self.store.update_response(response.clone())?;
        self.store.update_requirement(requirement.clone())?;

        tracing::info!(
            requirement_id = %requirement_id,
            decision = decision.label(),
            reviewer = %reviewer,
            "response reviewed"
        );
        Ok(ReviewReceipt {
            requirement,
            response,
        })
    }

    /// Advance a requirement whose response was recorded by an interrupted submit.
    fn complete_submission(
        &self,
        requirement: &mut Requirement,
        response: &SupplierResponse,
        actor: &ActorId,
    ) -> Result<(), ComplianceError> {
        if !requirement.status().accepts_submission() {
            return Err(ComplianceError::ResponseAlreadySubmitted(response.id.clone()));
        }
        tracing::warn!(
            requirement_id = %requirement.id,
            response_id = %response.id,
            attempt = response.attempt(),
            "completing interrupted submission"
        );
        let at = response.submitted_at().unwrap_or_else(|| self.clock.now());
        requirement.submit(actor, at)?;
        self.store.update_requirement(requirement.clone())?;
        Ok(())
    }

    fn score(
        &self,
        config: &QuestionnaireConfig,
        requirement: &Requirement,
        response: &SupplierResponse,
        answers: Vec<Answer>,
        now: DateTime<Utc>,
    ) -> Result<QuestionnaireSubmission, ComplianceError> {
        let questionnaire = self
            .store
            .fetch_questionnaire(&config.questionnaire_id)?
            .ok_or_else(|| {
                ComplianceError::not_found("questionnaire", &config.questionnaire_id)
            })?;
        let questions = self.store.list_questions(&config.questionnaire_id)?;

        let passing_score = config
            .passing_score
            .unwrap_or_else(|| questionnaire.passing_score());
        let score = ScoringEngine::new(passing_score).score(&questions, &answers)?;

        Ok(QuestionnaireSubmission {
            id: SubmissionId::generate(),
            response_id: response.id.clone(),
            requirement_id: requirement.id.clone(),
            questionnaire_id: questionnaire.id,
            supplier_id: requirement.supplier_id.clone(),
            attempt: response.attempt(),
            score,
            submitted_at: now,
        })
    }

    fn verify(
        &self,
        config: &GradeConfig,
        requirement: &Requirement,
        response: &SupplierResponse,
        evidence: GradeEvidence,
        now: DateTime<Utc>,
    ) -> Result<CheckFixVerification, ComplianceError> {
        let account_id = evidence.account_id.trim();
        if !self.client.validate_account_access(account_id) {
            return Err(ClientError::AccessDenied(account_id.to_string()).into());
        }
        let registered_domain = self.client.account_domain(account_id)?;
        let report = self.client.verify_report(evidence.report_hash.trim())?;

        let target = VerificationTarget {
            response_id: response.id.clone(),
            requirement_id: requirement.id.clone(),
            supplier_id: requirement.supplier_id.clone(),
            attempt: response.attempt(),
        };
        let policy = VerificationPolicy::from_config(config);
        Ok(CheckFixVerification::from_report(
            target,
            account_id,
            &registered_domain,
            report,
            &policy,
            now,
        )?)
    }

    fn requirement_for_supplier(
        &self,
        supplier_id: &SupplierId,
        id: &RequirementId,
    ) -> Result<Requirement, ComplianceError> {
        self.store
            .fetch_requirement(id)?
            .filter(|requirement| &requirement.supplier_id == supplier_id)
            .ok_or_else(|| ComplianceError::not_found("requirement", id))
    }

    fn requirement_for_company(
        &self,
        company_id: &CompanyId,
        id: &RequirementId,
    ) -> Result<Requirement, ComplianceError> {
        self.store
            .fetch_requirement(id)?
            .filter(|requirement| &requirement.company_id == company_id)
            .ok_or_else(|| ComplianceError::not_found("requirement", id))
    }

    fn response_for(
        &self,
        requirement_id: &RequirementId,
    ) -> Result<SupplierResponse, ComplianceError> {
        self.store
            .fetch_response_for_requirement(requirement_id)?
            .ok_or_else(|| ComplianceError::not_found("response for requirement", requirement_id))
    }
}

fn questionnaire_config(
    requirement: &Requirement,
) -> Result<&QuestionnaireConfig, ValidationError> {
    match requirement.kind() {
        RequirementKind::Questionnaire(config) => Ok(config),
        other => Err(ValidationError::KindMismatch {
            expected: other.label(),
            found: "questionnaire",
        }),
    }
}

fn grade_config(requirement: &Requirement) -> Result<&GradeConfig, ValidationError> {
    match requirement.kind() {
        RequirementKind::CheckFix(config) => Ok(config),
        other => Err(ValidationError::KindMismatch {
            expected: other.label(),
            found: "checkfix",
        }),
    }
}
