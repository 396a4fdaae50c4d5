use std::sync::Arc;

use super::audit::{AuditEntry, AuditSink, TracingAuditSink};
use super::clock::Clock;
use super::error::ComplianceError;
use super::ids::{ActorId, CompanyId, RelationshipId, RequirementId, SupplierId};
use super::questionnaire::{Answer, QuestionnaireService};
use super::relationship::{Classification, Relationship, RelationshipService};
use super::reminders::{
    dispatch_reminders, ComplianceEvent, Notifier, Reminder, ReminderPlanner, TracingNotifier,
};
use super::requirement::{NewRequirement, Requirement, RequirementKind, RequirementService};
use super::submission::{
    GradeEvidence, QuestionnaireReceipt, ReviewReceipt, SubmissionOrchestrator, SupplierResponse,
    VerificationReceipt,
};
use super::verification::VerificationClient;
use super::ComplianceStore;

/// Entry point wiring every workflow service over one store, and recording an
/// audit entry plus any notification for each state-changing call.
pub struct ComplianceWorkflow<S, C: ?Sized> {
    relationships: RelationshipService<S>,
    requirements: RequirementService<S>,
    questionnaires: QuestionnaireService<S>,
    submissions: SubmissionOrchestrator<S, C>,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    audit: Arc<dyn AuditSink>,
}

impl<S, C> ComplianceWorkflow<S, C>
where
    S: ComplianceStore,
    C: VerificationClient + ?Sized,
{
    pub fn new(store: Arc<S>, client: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            relationships: RelationshipService::new(store.clone(), clock.clone()),
            requirements: RequirementService::new(store.clone(), clock.clone()),
            questionnaires: QuestionnaireService::new(store.clone()),
            submissions: SubmissionOrchestrator::new(store.clone(), client, clock.clone()),
            store,
            clock,
            notifier: Arc::new(TracingNotifier),
            audit: Arc::new(TracingAuditSink),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn relationships(&self) -> &RelationshipService<S> {
        &self.relationships
    }

    pub fn requirements(&self) -> &RequirementService<S> {
        &self.requirements
    }

    pub fn questionnaires(&self) -> &QuestionnaireService<S> {
        &self.questionnaires
    }

    pub fn submissions(&self) -> &SubmissionOrchestrator<S, C> {
        &self.submissions
    }

    pub fn invite_supplier(
        &self,
        company_id: CompanyId,
        invited_email: &str,
        classification: Classification,
        actor: &ActorId,
    ) -> Result<Relationship, ComplianceError> {
        let relationship =
            self.relationships
                .invite(company_id, invited_email, classification, actor)?;
        self.record(
            self.entry(actor, "relationship.invite", &relationship.id)
                .with_after(&relationship),
        );
        Ok(relationship)
    }

    pub fn accept_invitation(
        &self,
        id: &RelationshipId,
        supplier_id: SupplierId,
        actor: &ActorId,
    ) -> Result<Relationship, ComplianceError> {
        let before = self.relationships.get(id)?;
        let after = self.relationships.accept(id, supplier_id, actor)?;
        self.record(
            self.entry(actor, "relationship.accept", id)
                .with_before(&before)
                .with_after(&after),
        );
        Ok(after)
    }

    pub fn decline_invitation(
        &self,
        id: &RelationshipId,
        actor: &ActorId,
        reason: Option<String>,
    ) -> Result<Relationship, ComplianceError> {
        let before = self.relationships.get(id)?;
        let after = self.relationships.decline(id, actor, reason)?;
        self.record(
            self.entry(actor, "relationship.decline", id)
                .with_before(&before)
                .with_after(&after),
        );
        Ok(after)
    }

    pub fn suspend_relationship(
        &self,
        company_id: &CompanyId,
        id: &RelationshipId,
        actor: &ActorId,
        reason: Option<String>,
    ) -> Result<Relationship, ComplianceError> {
        let before = self.relationships.get_for_company(company_id, id)?;
        let after = self.relationships.suspend(company_id, id, actor, reason)?;
        self.record(
            self.entry(actor, "relationship.suspend", id)
                .with_before(&before)
                .with_after(&after),
        );
        Ok(after)
    }

    pub fn reactivate_relationship(
        &self,
        company_id: &CompanyId,
        id: &RelationshipId,
        actor: &ActorId,
        reason: Option<String>,
    ) -> Result<Relationship, ComplianceError> {
        let before = self.relationships.get_for_company(company_id, id)?;
        let after = self.relationships.reactivate(company_id, id, actor, reason)?;
        self.record(
            self.entry(actor, "relationship.reactivate", id)
                .with_before(&before)
                .with_after(&after),
        );
        Ok(after)
    }

    pub fn terminate_relationship(
        &self,
        company_id: &CompanyId,
        id: &RelationshipId,
        actor: &ActorId,
        reason: Option<String>,
    ) -> Result<Relationship, ComplianceError> {
        let before = self.relationships.get_for_company(company_id, id)?;
        let after = self.relationships.terminate(company_id, id, actor, reason)?;
        self.record(
            self.entry(actor, "relationship.terminate", id)
                .with_before(&before)
                .with_after(&after),
        );
        Ok(after)
    }

    pub fn create_requirement(
        &self,
        company_id: &CompanyId,
        relationship_id: &RelationshipId,
        draft: NewRequirement,
        actor: &ActorId,
    ) -> Result<Requirement, ComplianceError> {
        let requirement = self
            .requirements
            .create(company_id, relationship_id, draft, actor)?;
        self.record(
            self.entry(actor, "requirement.create", &requirement.id)
                .with_after(&requirement),
        );
        Ok(requirement)
    }

    pub fn update_requirement_config(
        &self,
        company_id: &CompanyId,
        id: &RequirementId,
        kind: RequirementKind,
        actor: &ActorId,
    ) -> Result<Requirement, ComplianceError> {
        let before = self.requirements.get_for_company(company_id, id)?;
        let after = self.requirements.update_config(company_id, id, kind)?;
        self.record(
            self.entry(actor, "requirement.configure", id)
                .with_before(&before)
                .with_after(&after),
        );
        Ok(after)
    }

    pub fn expire_requirement(
        &self,
        company_id: &CompanyId,
        id: &RequirementId,
        actor: &ActorId,
        reason: Option<String>,
    ) -> Result<Requirement, ComplianceError> {
        let before = self.requirements.get_for_company(company_id, id)?;
        let after = self.requirements.expire(company_id, id, actor, reason)?;
        self.record(
            self.entry(actor, "requirement.expire", id)
                .with_before(&before)
                .with_after(&after),
        );
        Ok(after)
    }

    pub fn start_response(
        &self,
        supplier_id: &SupplierId,
        requirement_id: &RequirementId,
        actor: &ActorId,
    ) -> Result<SupplierResponse, ComplianceError> {
        let response = self.submissions.start(supplier_id, requirement_id, actor)?;
        self.record(
            self.entry(actor, "response.start", requirement_id)
                .with_after(&response),
        );
        Ok(response)
    }

    pub fn save_drafts(
        &self,
        supplier_id: &SupplierId,
        requirement_id: &RequirementId,
        answers: Vec<Answer>,
        actor: &ActorId,
    ) -> Result<SupplierResponse, ComplianceError> {
        let response = self
            .submissions
            .save_drafts(supplier_id, requirement_id, answers)?;
        self.record(
            self.entry(actor, "response.draft", requirement_id)
                .with_after(&response),
        );
        Ok(response)
    }

    pub fn submit_questionnaire(
        &self,
        supplier_id: &SupplierId,
        requirement_id: &RequirementId,
        answers: Vec<Answer>,
        actor: &ActorId,
    ) -> Result<QuestionnaireReceipt, ComplianceError> {
        let receipt =
            self.submissions
                .submit_questionnaire(supplier_id, requirement_id, answers, actor)?;
        self.record(
            self.entry(actor, "response.submit_questionnaire", requirement_id)
                .with_after(&receipt.submission),
        );
        self.notify(ComplianceEvent::Submitted {
            requirement_id: requirement_id.clone(),
            company_id: receipt.requirement.company_id.clone(),
            supplier_id: supplier_id.clone(),
            attempt: receipt.submission.attempt,
            passed: receipt.submission.score.passed,
        });
        Ok(receipt)
    }

    pub fn submit_grade(
        &self,
        supplier_id: &SupplierId,
        requirement_id: &RequirementId,
        evidence: GradeEvidence,
        actor: &ActorId,
    ) -> Result<VerificationReceipt, ComplianceError> {
        let receipt = self
            .submissions
            .submit_grade(supplier_id, requirement_id, evidence, actor)?;
        self.record(
            self.entry(actor, "response.submit_grade", requirement_id)
                .with_after(&receipt.verification),
        );
        self.notify(ComplianceEvent::Submitted {
            requirement_id: requirement_id.clone(),
            company_id: receipt.requirement.company_id.clone(),
            supplier_id: supplier_id.clone(),
            attempt: receipt.verification.attempt,
            passed: receipt.verification.passed,
        });
        Ok(receipt)
    }

    pub fn approve(
        &self,
        company_id: &CompanyId,
        requirement_id: &RequirementId,
        reviewer: &ActorId,
        notes: Option<String>,
    ) -> Result<ReviewReceipt, ComplianceError> {
        let before = self.requirements.get_for_company(company_id, requirement_id)?;
        let receipt = self
            .submissions
            .approve(company_id, requirement_id, reviewer, notes)?;
        self.record(
            self.entry(reviewer, "requirement.approve", requirement_id)
                .with_before(&before)
                .with_after(&receipt.requirement),
        );
        self.notify(ComplianceEvent::Approved {
            requirement_id: requirement_id.clone(),
            supplier_id: receipt.requirement.supplier_id.clone(),
            reviewer: reviewer.clone(),
        });
        Ok(receipt)
    }

    pub fn reject(
        &self,
        company_id: &CompanyId,
        requirement_id: &RequirementId,
        reviewer: &ActorId,
        reason: Option<String>,
    ) -> Result<ReviewReceipt, ComplianceError> {
        let before = self.requirements.get_for_company(company_id, requirement_id)?;
        let receipt =
            self.submissions
                .reject(company_id, requirement_id, reviewer, reason.clone())?;
        self.record(
            self.entry(reviewer, "requirement.reject", requirement_id)
                .with_before(&before)
                .with_after(&receipt.requirement),
        );
        self.notify(ComplianceEvent::Rejected {
            requirement_id: requirement_id.clone(),
            supplier_id: receipt.requirement.supplier_id.clone(),
            reviewer: reviewer.clone(),
            reason,
        });
        Ok(receipt)
    }

    pub fn request_revision(
        &self,
        company_id: &CompanyId,
        requirement_id: &RequirementId,
        reviewer: &ActorId,
        notes: Option<String>,
    ) -> Result<ReviewReceipt, ComplianceError> {
        let before = self.requirements.get_for_company(company_id, requirement_id)?;
        let receipt =
            self.submissions
                .request_revision(company_id, requirement_id, reviewer, notes)?;
        self.record(
            self.entry(reviewer, "requirement.request_revision", requirement_id)
                .with_before(&before)
                .with_after(&receipt.requirement),
        );
        Ok(receipt)
    }

    pub fn retry(
        &self,
        supplier_id: &SupplierId,
        requirement_id: &RequirementId,
        actor: &ActorId,
    ) -> Result<ReviewReceipt, ComplianceError> {
        let before = self.requirements.get_for_supplier(supplier_id, requirement_id)?;
        let receipt = self.submissions.retry(supplier_id, requirement_id, actor)?;
        self.record(
            self.entry(actor, "requirement.retry", requirement_id)
                .with_before(&before)
                .with_after(&receipt.requirement),
        );
        Ok(receipt)
    }

    /// Deliver due reminders through the configured notifier.
    pub fn send_reminders(
        &self,
        planner: &ReminderPlanner,
    ) -> Result<Vec<Reminder>, ComplianceError> {
        dispatch_reminders(
            self.store.as_ref(),
            self.notifier.as_ref(),
            planner,
            self.clock.now(),
        )
    }

    fn entry(
        &self,
        actor: &ActorId,
        action: &'static str,
        resource: impl ToString,
    ) -> AuditEntry {
        AuditEntry::new(actor, action, resource.to_string(), self.clock.now())
    }

    fn record(&self, entry: AuditEntry) {
        let action = entry.action;
        if let Err(error) = self.audit.record(entry) {
            tracing::warn!(action, error = %error, "audit entry dropped");
        }
    }

    fn notify(&self, event: ComplianceEvent) {
        if let Err(error) = self.notifier.notify(&event) {
            tracing::warn!(
                event = event.label(),
                requirement_id = %event.requirement_id(),
                error = %error,
                "notification failed"
            );
        }
    }
}
