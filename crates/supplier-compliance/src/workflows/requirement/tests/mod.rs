mod lifecycle;
mod schedule;

use chrono::{DateTime, TimeZone, Utc};

use crate::workflows::ids::{ActorId, CompanyId, SupplierId};
use crate::workflows::relationship::{Classification, Relationship};
use crate::workflows::requirement::{
    GradeConfig, NewRequirement, Priority, Requirement, RequirementKind,
};

fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()
}

fn active_relationship() -> Relationship {
    let actor = ActorId::new("usr-buyer");
    let mut relationship = Relationship::invite(
        CompanyId::new("co-acme"),
        "ops@vendor.io",
        Classification::Important,
        &actor,
        created_at(),
    )
    .unwrap();
    relationship
        .accept(SupplierId::new("sup-vendor"), &actor, created_at())
        .unwrap();
    relationship
}

fn grade_draft(due_date: Option<DateTime<Utc>>) -> NewRequirement {
    NewRequirement {
        title: "External attack surface grade".to_string(),
        description: "Provide a current CheckFix report".to_string(),
        priority: Priority::High,
        due_date,
        kind: RequirementKind::CheckFix(GradeConfig::default()),
    }
}

fn requirement(due_date: Option<DateTime<Utc>>) -> Requirement {
    Requirement::create_for(
        &active_relationship(),
        grade_draft(due_date),
        &ActorId::new("usr-buyer"),
        created_at(),
    )
    .unwrap()
}
