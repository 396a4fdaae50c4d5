//! Transition tables and the append-only status log shared by relationships
//! and requirements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::ActorId;

/// A status enum governed by a fixed transition table.
pub trait Lifecycle: Copy + Eq + fmt::Debug + 'static {
    /// Entity name used in transition errors.
    const ENTITY: &'static str;

    fn allowed_transitions(self) -> &'static [Self];

    fn label(self) -> &'static str;

    fn can_transition_to(self, next: Self) -> bool {
        self.allowed_transitions().contains(&next)
    }

    fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    fn check_transition(self, next: Self) -> Result<(), TransitionError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(TransitionError {
                entity: Self::ENTITY,
                from: self.label(),
                to: next.label(),
            })
        }
    }
}

/// Requested status change is not in the transition table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {entity} transition from {from} to {to}")]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: &'static str,
    pub to: &'static str,
}

/// One entry of a status log. `from` is absent only for the creation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange<S> {
    pub from: Option<S>,
    pub to: S,
    pub actor: ActorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}

/// Append-only status log owned by its entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusHistory<S> {
    entries: Vec<StatusChange<S>>,
}

impl<S> Default for StatusHistory<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S> StatusHistory<S> {
    pub fn entries(&self) -> &[StatusChange<S>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&StatusChange<S>> {
        self.entries.last()
    }

    pub(crate) fn append(&mut self, change: StatusChange<S>) {
        self.entries.push(change);
    }
}

/// Apply `to` to `status` when the table allows it, logging the change.
///
/// On error neither `status` nor `history` is touched.
pub(crate) fn apply_transition<S: Lifecycle>(
    status: &mut S,
    history: &mut StatusHistory<S>,
    to: S,
    actor: &ActorId,
    reason: Option<String>,
    at: DateTime<Utc>,
) -> Result<(), TransitionError> {
    status.check_transition(to)?;

    let from = *status;
    history.append(StatusChange {
        from: Some(from),
        to,
        actor: actor.clone(),
        reason: reason.filter(|text| !text.trim().is_empty()),
        at,
    });
    *status = to;

    tracing::debug!(
        entity = S::ENTITY,
        from = from.label(),
        to = to.label(),
        actor = %actor,
        "status transition applied"
    );

    Ok(())
}
