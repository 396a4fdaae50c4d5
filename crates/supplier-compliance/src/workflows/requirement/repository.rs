use serde::Deserialize;

use super::domain::{Requirement, RequirementStatus};
use crate::workflows::ids::{CompanyId, RelationshipId, RequirementId, SupplierId};
use crate::workflows::repository::{Page, PageRequest, RepositoryError};

/// Listing filter; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RequirementFilter {
    pub relationship_id: Option<RelationshipId>,
    pub company_id: Option<CompanyId>,
    pub supplier_id: Option<SupplierId>,
    pub status: Option<RequirementStatus>,
}

impl RequirementFilter {
    pub fn for_supplier(supplier_id: SupplierId) -> Self {
        Self {
            supplier_id: Some(supplier_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, requirement: &Requirement) -> bool {
        self.relationship_id
            .as_ref()
            .map_or(true, |id| &requirement.relationship_id == id)
            && self
                .company_id
                .as_ref()
                .map_or(true, |id| &requirement.company_id == id)
            && self
                .supplier_id
                .as_ref()
                .map_or(true, |id| &requirement.supplier_id == id)
            && self
                .status
                .map_or(true, |status| requirement.status() == status)
    }
}

pub trait RequirementRepository: Send + Sync {
    fn insert_requirement(&self, requirement: Requirement)
        -> Result<Requirement, RepositoryError>;
    fn update_requirement(&self, requirement: Requirement) -> Result<(), RepositoryError>;
    fn fetch_requirement(&self, id: &RequirementId)
        -> Result<Option<Requirement>, RepositoryError>;
    fn list_requirements(
        &self,
        filter: &RequirementFilter,
        page: PageRequest,
    ) -> Result<Page<Requirement>, RepositoryError>;
}
