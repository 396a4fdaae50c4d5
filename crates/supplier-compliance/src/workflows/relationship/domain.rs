use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::error::ValidationError;
use crate::workflows::ids::{ActorId, CompanyId, RelationshipId, SupplierId};
use crate::workflows::lifecycle::{
    apply_transition, Lifecycle, StatusChange, StatusHistory, TransitionError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    Pending,
    Active,
    Suspended,
    Rejected,
    Terminated,
}

impl RelationshipStatus {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Pending,
            Self::Active,
            Self::Suspended,
            Self::Rejected,
            Self::Terminated,
        ]
    }
}

impl Lifecycle for RelationshipStatus {
    const ENTITY: &'static str = "relationship";

    fn allowed_transitions(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Active, Self::Rejected],
            Self::Active => &[Self::Suspended, Self::Terminated],
            Self::Suspended => &[Self::Active, Self::Terminated],
            Self::Rejected | Self::Terminated => &[],
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Rejected => "rejected",
            Self::Terminated => "terminated",
        }
    }
}

/// Supplier risk tier assigned by the company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Critical,
    Important,
    #[default]
    Standard,
}

impl Classification {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Important => "important",
            Self::Standard => "standard",
        }
    }
}

/// Business link between a company and the supplier it assesses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub company_id: CompanyId,
    pub supplier_id: Option<SupplierId>,
    pub invited_email: String,
    pub classification: Classification,
    status: RelationshipStatus,
    history: StatusHistory<RelationshipStatus>,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

impl Relationship {
    /// Open a pending relationship for an invited supplier contact.
    pub fn invite(
        company_id: CompanyId,
        invited_email: &str,
        classification: Classification,
        actor: &ActorId,
        at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let invited_email = normalize_email(invited_email)?;

        let mut history = StatusHistory::default();
        history.append(StatusChange {
            from: None,
            to: RelationshipStatus::Pending,
            actor: actor.clone(),
            reason: Some(format!("invitation sent to {invited_email}")),
            at,
        });

        Ok(Self {
            id: RelationshipId::generate(),
            company_id,
            supplier_id: None,
            invited_email,
            classification,
            status: RelationshipStatus::Pending,
            history,
            created_at: at,
            accepted_at: None,
            rejected_at: None,
        })
    }

    pub fn status(&self) -> RelationshipStatus {
        self.status
    }

    pub fn history(&self) -> &StatusHistory<RelationshipStatus> {
        &self.history
    }

    pub fn transition_status(
        &mut self,
        to: RelationshipStatus,
        actor: &ActorId,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        apply_transition(&mut self.status, &mut self.history, to, actor, reason, at)
    }

    /// Bind the accepting supplier and activate the relationship.
    pub fn accept(
        &mut self,
        supplier_id: SupplierId,
        actor: &ActorId,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.transition_status(
            RelationshipStatus::Active,
            actor,
            Some(format!("invitation accepted by supplier {supplier_id}")),
            at,
        )?;
        self.supplier_id = Some(supplier_id);
        self.accepted_at = Some(at);
        Ok(())
    }

    pub fn decline(
        &mut self,
        actor: &ActorId,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.transition_status(RelationshipStatus::Rejected, actor, reason, at)?;
        self.rejected_at = Some(at);
        Ok(())
    }

    pub fn suspend(
        &mut self,
        actor: &ActorId,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.transition_status(RelationshipStatus::Suspended, actor, reason, at)
    }

    pub fn reactivate(
        &mut self,
        actor: &ActorId,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        // ACTIVE is also reachable from PENDING, which only `accept` may do.
        if self.status != RelationshipStatus::Suspended {
            return Err(TransitionError {
                entity: RelationshipStatus::ENTITY,
                from: self.status.label(),
                to: RelationshipStatus::Active.label(),
            });
        }
        self.transition_status(RelationshipStatus::Active, actor, reason, at)
    }

    pub fn terminate(
        &mut self,
        actor: &ActorId,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.transition_status(RelationshipStatus::Terminated, actor, reason, at)
    }

    /// Requirements may only be attached to active relationships with a bound supplier.
    pub fn can_receive_requirements(&self) -> bool {
        self.status == RelationshipStatus::Active && self.supplier_id.is_some()
    }

    pub fn is_bound_to(&self, supplier_id: &SupplierId) -> bool {
        self.supplier_id.as_ref() == Some(supplier_id)
    }
}

fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_ascii_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };

    if valid {
        Ok(email)
    } else {
        Err(ValidationError::field(
            "invited_email",
            format!("'{}' is not a valid address", raw.trim()),
        ))
    }
}
