//! Due-date reminders and the outbound notification boundary.
//!
//! The planner only decides which requirements warrant a reminder. Delivery
//! belongs to a [`Notifier`] adapter; [`dispatch_reminders`] ties the two
//! together and stamps `reminder_sent_at` on every reminder that went out.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::ComplianceError;
use super::ids::{ActorId, CompanyId, RequirementId, SupplierId};
use super::repository::PageRequest;
use super::requirement::{Requirement, RequirementFilter, RequirementRepository};
use super::verification::CheckFixVerification;

const SCAN_PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    DueSoon,
    Overdue,
}

impl ReminderKind {
    pub const fn label(self) -> &'static str {
        match self {
            ReminderKind::DueSoon => "due_soon",
            ReminderKind::Overdue => "overdue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reminder {
    pub requirement_id: RequirementId,
    pub company_id: CompanyId,
    pub supplier_id: SupplierId,
    pub title: String,
    pub kind: ReminderKind,
    pub due_date: DateTime<Utc>,
    pub days_until_due: i64,
}

/// Selects requirements whose due date falls inside the reminder window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderPlanner {
    days_before: i64,
}

impl ReminderPlanner {
    pub fn new(days_before: i64) -> Self {
        Self { days_before }
    }

    pub fn days_before(&self) -> i64 {
        self.days_before
    }

    pub fn reminder_for(&self, requirement: &Requirement, now: DateTime<Utc>) -> Option<Reminder> {
        if !requirement.needs_reminder(self.days_before, now) {
            return None;
        }
        let due_date = requirement.due_date?;
        let days_until_due = requirement.days_until_due(now)?;
        let kind = if requirement.is_overdue(now) {
            ReminderKind::Overdue
        } else {
            ReminderKind::DueSoon
        };

        Some(Reminder {
            requirement_id: requirement.id.clone(),
            company_id: requirement.company_id.clone(),
            supplier_id: requirement.supplier_id.clone(),
            title: requirement.title.clone(),
            kind,
            due_date,
            days_until_due,
        })
    }

    /// Reminders for `requirements`, most urgent first.
    pub fn plan<'a, I>(&self, requirements: I, now: DateTime<Utc>) -> Vec<Reminder>
    where
        I: IntoIterator<Item = &'a Requirement>,
    {
        let mut reminders: Vec<Reminder> = requirements
            .into_iter()
            .filter_map(|requirement| self.reminder_for(requirement, now))
            .collect();
        reminders.sort_by(|a, b| {
            a.days_until_due
                .cmp(&b.days_until_due)
                .then_with(|| a.requirement_id.cmp(&b.requirement_id))
        });
        reminders
    }
}

/// Verifications close enough to expiry that the supplier should refresh them.
pub fn stale_verifications<'a, I>(
    verifications: I,
    days_before_expiry: i64,
    now: DateTime<Utc>,
) -> Vec<&'a CheckFixVerification>
where
    I: IntoIterator<Item = &'a CheckFixVerification>,
{
    verifications
        .into_iter()
        .filter(|verification| verification.needs_refresh(days_before_expiry, now))
        .collect()
}

/// Workflow events handed to outbound adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ComplianceEvent {
    Reminder(Reminder),
    Submitted {
        requirement_id: RequirementId,
        company_id: CompanyId,
        supplier_id: SupplierId,
        attempt: u32,
        passed: bool,
    },
    Approved {
        requirement_id: RequirementId,
        supplier_id: SupplierId,
        reviewer: ActorId,
    },
    Rejected {
        requirement_id: RequirementId,
        supplier_id: SupplierId,
        reviewer: ActorId,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl ComplianceEvent {
    pub fn label(&self) -> &'static str {
        match self {
            ComplianceEvent::Reminder(reminder) => reminder.kind.label(),
            ComplianceEvent::Submitted { .. } => "submitted",
            ComplianceEvent::Approved { .. } => "approved",
            ComplianceEvent::Rejected { .. } => "rejected",
        }
    }

    pub fn requirement_id(&self) -> &RequirementId {
        match self {
            ComplianceEvent::Reminder(reminder) => &reminder.requirement_id,
            ComplianceEvent::Submitted { requirement_id, .. }
            | ComplianceEvent::Approved { requirement_id, .. }
            | ComplianceEvent::Rejected { requirement_id, .. } => requirement_id,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Outbound hook for reminders and review events (mail, chat, webhooks).
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &ComplianceEvent) -> Result<(), NotifyError>;
}

/// Writes events to the log; the default when no adapter is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, event: &ComplianceEvent) -> Result<(), NotifyError> {
        tracing::info!(
            event = event.label(),
            requirement_id = %event.requirement_id(),
            "compliance notification"
        );
        Ok(())
    }
}

/// Keeps every event in memory so callers can inspect what was sent.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<ComplianceEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<ComplianceEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: &ComplianceEvent) -> Result<(), NotifyError> {
        self.events
            .lock()
            .map_err(|_| NotifyError::Transport("recording notifier poisoned".to_string()))?
            .push(event.clone());
        Ok(())
    }
}

/// Plan reminders across every stored requirement, deliver them and mark each
/// delivered one as sent. Failed deliveries stay unmarked for the next run.
pub fn dispatch_reminders<S, N>(
    store: &S,
    notifier: &N,
    planner: &ReminderPlanner,
    now: DateTime<Utc>,
) -> Result<Vec<Reminder>, ComplianceError>
where
    S: RequirementRepository + ?Sized,
    N: Notifier + ?Sized,
{
    let mut requirements = Vec::new();
    let mut offset = 0;
    loop {
        let page = store.list_requirements(
            &RequirementFilter::default(),
            PageRequest::new(offset, SCAN_PAGE_SIZE),
        )?;
        offset += page.items.len();
        let exhausted = page.items.is_empty() || offset >= page.total;
        requirements.extend(page.items);
        if exhausted {
            break;
        }
    }

    let mut delivered = Vec::new();
    for reminder in planner.plan(&requirements, now) {
        let event = ComplianceEvent::Reminder(reminder.clone());
        if let Err(error) = notifier.notify(&event) {
            tracing::warn!(
                requirement_id = %reminder.requirement_id,
                error = %error,
                "reminder delivery failed"
            );
            continue;
        }

        if let Some(mut requirement) = requirements
            .iter()
            .find(|requirement| requirement.id == reminder.requirement_id)
            .cloned()
        {
            requirement.mark_reminder_sent(now);
            store.update_requirement(requirement)?;
        }
        delivered.push(reminder);
    }

    tracing::info!(
        planned = requirements.len(),
        delivered = delivered.len(),
        "reminder run finished"
    );
    Ok(delivered)
}
