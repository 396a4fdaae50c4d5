use std::sync::Arc;

use super::domain::{Classification, Relationship};
use super::repository::{RelationshipFilter, RelationshipRepository};
use crate::workflows::clock::Clock;
use crate::workflows::error::ComplianceError;
use crate::workflows::ids::{ActorId, CompanyId, RelationshipId, SupplierId};
use crate::workflows::repository::{Page, PageRequest, RepositoryError};

/// Drives relationship invitations and lifecycle changes against storage.
pub struct RelationshipService<R: ?Sized> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> Clone for RelationshipService<R>
where
    R: ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<R> RelationshipService<R>
where
    R: RelationshipRepository + ?Sized,
{
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Invite a supplier contact; the relationship starts PENDING.
    pub fn invite(
        &self,
        company_id: CompanyId,
        invited_email: &str,
        classification: Classification,
        actor: &ActorId,
    ) -> Result<Relationship, ComplianceError> {
        let relationship = Relationship::invite(
            company_id,
            invited_email,
            classification,
            actor,
            self.clock.now(),
        )?;
        let stored = self.repository.insert_relationship(relationship)?;

        tracing::info!(
            relationship_id = %stored.id,
            company_id = %stored.company_id,
            classification = stored.classification.label(),
            "supplier invited"
        );
        Ok(stored)
    }

    /// Accept an invitation, binding the supplier to the relationship.
    pub fn accept(
        &self,
        id: &RelationshipId,
        supplier_id: SupplierId,
        actor: &ActorId,
    ) -> Result<Relationship, ComplianceError> {
        let mut relationship = self.fetch(id)?;

        let existing = self.repository.list_relationships(
            &RelationshipFilter {
                company_id: Some(relationship.company_id.clone()),
                supplier_id: Some(supplier_id.clone()),
                status: None,
            },
            PageRequest::new(0, 1),
        )?;
        if existing.items.iter().any(|other| &other.id != id) {
            return Err(ComplianceError::RelationshipExists(supplier_id));
        }

        relationship.accept(supplier_id.clone(), actor, self.clock.now())?;
        self.repository
            .update_relationship(relationship.clone())
            .map_err(|error| match error {
                RepositoryError::Conflict => ComplianceError::RelationshipExists(supplier_id),
                other => other.into(),
            })?;

        tracing::info!(relationship_id = %id, "relationship accepted");
        Ok(relationship)
    }

    pub fn decline(
        &self,
        id: &RelationshipId,
        actor: &ActorId,
        reason: Option<String>,
    ) -> Result<Relationship, ComplianceError> {
        let mut relationship = self.fetch(id)?;
        relationship.decline(actor, reason, self.clock.now())?;
        self.repository.update_relationship(relationship.clone())?;

        tracing::info!(relationship_id = %id, "relationship declined");
        Ok(relationship)
    }

    pub fn suspend(
        &self,
        company_id: &CompanyId,
        id: &RelationshipId,
        actor: &ActorId,
        reason: Option<String>,
    ) -> Result<Relationship, ComplianceError> {
        let mut relationship = self.get_for_company(company_id, id)?;
        relationship.suspend(actor, reason, self.clock.now())?;
        self.repository.update_relationship(relationship.clone())?;
        Ok(relationship)
    }

    pub fn reactivate(
        &self,
        company_id: &CompanyId,
        id: &RelationshipId,
        actor: &ActorId,
        reason: Option<String>,
    ) -> Result<Relationship, ComplianceError> {
        let mut relationship = self.get_for_company(company_id, id)?;
        relationship.reactivate(actor, reason, self.clock.now())?;
        self.repository.update_relationship(relationship.clone())?;
        Ok(relationship)
    }

    pub fn terminate(
        &self,
        company_id: &CompanyId,
        id: &RelationshipId,
        actor: &ActorId,
        reason: Option<String>,
    ) -> Result<Relationship, ComplianceError> {
        let mut relationship = self.get_for_company(company_id, id)?;
        relationship.terminate(actor, reason, self.clock.now())?;
        self.repository.update_relationship(relationship.clone())?;

        tracing::info!(relationship_id = %id, "relationship terminated");
        Ok(relationship)
    }

    pub fn get(&self, id: &RelationshipId) -> Result<Relationship, ComplianceError> {
        self.fetch(id)
    }

    /// Fetch a relationship owned by `company_id`. Foreign relationships are
    /// reported as missing.
    pub fn get_for_company(
        &self,
        company_id: &CompanyId,
        id: &RelationshipId,
    ) -> Result<Relationship, ComplianceError> {
        let relationship = self.fetch(id)?;
        if &relationship.company_id != company_id {
            return Err(ComplianceError::not_found("relationship", id));
        }
        Ok(relationship)
    }

    pub fn list(
        &self,
        filter: &RelationshipFilter,
        page: PageRequest,
    ) -> Result<Page<Relationship>, ComplianceError> {
        Ok(self.repository.list_relationships(filter, page)?)
    }

    fn fetch(&self, id: &RelationshipId) -> Result<Relationship, ComplianceError> {
        self.repository
            .fetch_relationship(id)?
            .ok_or_else(|| ComplianceError::not_found("relationship", id))
    }
}
