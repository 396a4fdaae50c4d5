use chrono::Duration;

use super::{created_at, requirement};
use crate::workflows::ids::ActorId;
use crate::workflows::requirement::RequirementStatus;

#[test]
fn days_until_due_rounds_down() {
    let due = created_at() + Duration::days(3);
    let requirement = requirement(Some(due));

    assert_eq!(requirement.days_until_due(created_at()), Some(3));
    assert_eq!(
        requirement.days_until_due(created_at() + Duration::hours(12)),
        Some(2)
    );
    assert_eq!(requirement.days_until_due(due + Duration::hours(1)), Some(-1));
    assert_eq!(super::requirement(None).days_until_due(created_at()), None);
}

#[test]
fn overdue_only_while_open() {
    let due = created_at() + Duration::days(1);
    let mut requirement = requirement(Some(due));
    let later = due + Duration::days(2);

    assert!(!requirement.is_overdue(created_at()));
    assert!(requirement.is_overdue(later));

    requirement
        .expire(&ActorId::new("usr-buyer"), None, later)
        .unwrap();
    assert_eq!(requirement.status(), RequirementStatus::Expired);
    assert!(!requirement.is_overdue(later));
}

#[test]
fn reminder_fires_once_inside_window() {
    let due = created_at() + Duration::days(10);
    let mut requirement = requirement(Some(due));

    assert!(!requirement.needs_reminder(7, created_at()));
    let inside = created_at() + Duration::days(4);
    assert!(requirement.needs_reminder(7, inside));

    requirement.mark_reminder_sent(inside);
    assert_eq!(requirement.reminder_sent_at(), Some(inside));
    assert!(!requirement.needs_reminder(7, inside + Duration::days(1)));
}

#[test]
fn submitted_requirements_are_not_reminded() {
    let due = created_at() + Duration::days(2);
    let mut requirement = requirement(Some(due));
    let supplier = ActorId::new("usr-vendor");
    requirement.start(&supplier, created_at()).unwrap();
    requirement.submit(&supplier, created_at()).unwrap();

    assert!(!requirement.needs_reminder(7, created_at()));
    assert!(!super::requirement(None).needs_reminder(7, created_at()));
}
