use serde::Deserialize;

use super::domain::{Relationship, RelationshipStatus};
use crate::workflows::ids::{CompanyId, RelationshipId, SupplierId};
use crate::workflows::repository::{Page, PageRequest, RepositoryError};

/// Listing filter; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RelationshipFilter {
    pub company_id: Option<CompanyId>,
    pub supplier_id: Option<SupplierId>,
    pub status: Option<RelationshipStatus>,
}

impl RelationshipFilter {
    pub fn for_company(company_id: CompanyId) -> Self {
        Self {
            company_id: Some(company_id),
            ..Self::default()
        }
    }

    pub fn for_supplier(supplier_id: SupplierId) -> Self {
        Self {
            supplier_id: Some(supplier_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, relationship: &Relationship) -> bool {
        self.company_id
            .as_ref()
            .map_or(true, |id| &relationship.company_id == id)
            && self
                .supplier_id
                .as_ref()
                .map_or(true, |id| relationship.is_bound_to(id))
            && self
                .status
                .map_or(true, |status| relationship.status() == status)
    }
}

/// Storage for relationships. Inserting or updating a relationship whose
/// bound (company, supplier) pair already exists yields `Conflict`.
pub trait RelationshipRepository: Send + Sync {
    fn insert_relationship(&self, relationship: Relationship)
        -> Result<Relationship, RepositoryError>;
    fn update_relationship(&self, relationship: Relationship) -> Result<(), RepositoryError>;
    fn fetch_relationship(
        &self,
        id: &RelationshipId,
    ) -> Result<Option<Relationship>, RepositoryError>;
    fn list_relationships(
        &self,
        filter: &RelationshipFilter,
        page: PageRequest,
    ) -> Result<Page<Relationship>, RepositoryError>;
}
