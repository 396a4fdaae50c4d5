use chrono::{DateTime, Duration, Utc};

use super::domain::{Requirement, RequirementStatus};
use crate::workflows::lifecycle::Lifecycle;

impl Requirement {
    /// Due date passed while the requirement is still open.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) => now > due && !self.status().is_terminal(),
            None => false,
        }
    }

    /// Whole days until the due date, rounded down, so anything overdue is negative.
    pub fn days_until_due(&self, now: DateTime<Utc>) -> Option<i64> {
        let remaining = self.due_date? - now;
        let days = remaining.num_days();
        if remaining < Duration::days(days) {
            Some(days - 1)
        } else {
            Some(days)
        }
    }

    pub fn needs_reminder(&self, days_before: i64, now: DateTime<Utc>) -> bool {
        if self.reminder_sent_at.is_some()
            || self.status().is_terminal()
            || self.status() == RequirementStatus::Submitted
        {
            return false;
        }
        self.days_until_due(now)
            .map_or(false, |days| days <= days_before)
    }

    pub fn mark_reminder_sent(&mut self, now: DateTime<Utc>) {
        self.reminder_sent_at = Some(now);
        self.updated_at = now;
    }
}
