use std::sync::Arc;

use super::domain::{NewRequirement, Requirement, RequirementKind};
use super::repository::{RequirementFilter, RequirementRepository};
use crate::workflows::clock::Clock;
use crate::workflows::error::ComplianceError;
use crate::workflows::ids::{ActorId, CompanyId, RelationshipId, RequirementId, SupplierId};
use crate::workflows::questionnaire::QuestionnaireRepository;
use crate::workflows::relationship::RelationshipRepository;
use crate::workflows::repository::{Page, PageRequest};

/// Company-side management of requirements attached to relationships.
pub struct RequirementService<S: ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: ?Sized> Clone for RequirementService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<S> RequirementService<S>
where
    S: RequirementRepository + RelationshipRepository + QuestionnaireRepository + ?Sized,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Attach a requirement to an active relationship owned by `company_id`.
    pub fn create(
        &self,
        company_id: &CompanyId,
        relationship_id: &RelationshipId,
        draft: NewRequirement,
        actor: &ActorId,
    ) -> Result<Requirement, ComplianceError> {
        let relationship = self
            .store
            .fetch_relationship(relationship_id)?
            .filter(|relationship| &relationship.company_id == company_id)
            .ok_or_else(|| ComplianceError::not_found("relationship", relationship_id))?;

        self.ensure_questionnaire_exists(&draft.kind)?;

        let requirement = Requirement::create_for(&relationship, draft, actor, self.clock.now())?;
        let stored = self.store.insert_requirement(requirement)?;

        tracing::info!(
            requirement_id = %stored.id,
            relationship_id = %stored.relationship_id,
            kind = stored.kind().label(),
            "requirement created"
        );
        Ok(stored)
    }

    pub fn get(&self, id: &RequirementId) -> Result<Requirement, ComplianceError> {
        self.store
            .fetch_requirement(id)?
            .ok_or_else(|| ComplianceError::not_found("requirement", id))
    }

    /// Requirements owned by another company are reported as missing.
    pub fn get_for_company(
        &self,
        company_id: &CompanyId,
        id: &RequirementId,
    ) -> Result<Requirement, ComplianceError> {
        let requirement = self.get(id)?;
        if &requirement.company_id != company_id {
            return Err(ComplianceError::not_found("requirement", id));
        }
        Ok(requirement)
    }

    pub fn get_for_supplier(
        &self,
        supplier_id: &SupplierId,
        id: &RequirementId,
    ) -> Result<Requirement, ComplianceError> {
        let requirement = self.get(id)?;
        if &requirement.supplier_id != supplier_id {
            return Err(ComplianceError::not_found("requirement", id));
        }
        Ok(requirement)
    }

    pub fn update_config(
        &self,
        company_id: &CompanyId,
        id: &RequirementId,
        kind: RequirementKind,
    ) -> Result<Requirement, ComplianceError> {
        let mut requirement = self.get_for_company(company_id, id)?;
        self.ensure_questionnaire_exists(&kind)?;
        requirement.update_kind(kind, self.clock.now())?;
        self.store.update_requirement(requirement.clone())?;
        Ok(requirement)
    }

    pub fn expire(
        &self,
        company_id: &CompanyId,
        id: &RequirementId,
        actor: &ActorId,
        reason: Option<String>,
    ) -> Result<Requirement, ComplianceError> {
        let mut requirement = self.get_for_company(company_id, id)?;
        requirement.expire(actor, reason, self.clock.now())?;
        self.store.update_requirement(requirement.clone())?;

        tracing::info!(requirement_id = %id, "requirement expired");
        Ok(requirement)
    }

    pub fn list(
        &self,
        filter: &RequirementFilter,
        page: PageRequest,
    ) -> Result<Page<Requirement>, ComplianceError> {
        Ok(self.store.list_requirements(filter, page)?)
    }

    fn ensure_questionnaire_exists(&self, kind: &RequirementKind) -> Result<(), ComplianceError> {
        if let RequirementKind::Questionnaire(config) = kind {
            if self
                .store
                .fetch_questionnaire(&config.questionnaire_id)?
                .is_none()
            {
                return Err(ComplianceError::not_found(
                    "questionnaire",
                    &config.questionnaire_id,
                ));
            }
        }
        Ok(())
    }
}
