use proptest::prelude::*;

use super::{active_relationship, created_at, grade_draft, requirement};
use crate::workflows::error::{ComplianceError, ErrorKind, ValidationError};
use crate::workflows::ids::{ActorId, QuestionnaireId};
use crate::workflows::lifecycle::Lifecycle;
use crate::workflows::relationship::RelationshipStatus;
use crate::workflows::requirement::{
    GradeConfig, QuestionnaireConfig, Requirement, RequirementKind, RequirementStatus,
};
use crate::workflows::verification::Grade;

fn path_to(status: RequirementStatus) -> &'static [RequirementStatus] {
    use RequirementStatus::*;
    match status {
        Pending => &[],
        InProgress => &[InProgress],
        Submitted => &[InProgress, Submitted],
        UnderReview => &[InProgress, Submitted, UnderReview],
        Rejected => &[InProgress, Submitted, Rejected],
        Approved => &[InProgress, Submitted, Approved],
        Expired => &[Expired],
    }
}

fn in_status(status: RequirementStatus) -> Requirement {
    let mut requirement = requirement(None);
    for step in path_to(status) {
        requirement
            .transition_status(*step, &ActorId::new("usr-walk"), None, created_at())
            .unwrap();
    }
    requirement
}

#[test]
fn requirements_need_an_active_relationship() {
    let mut relationship = active_relationship();
    relationship
        .suspend(&ActorId::new("usr-buyer"), None, created_at())
        .unwrap();
    assert_eq!(relationship.status(), RelationshipStatus::Suspended);

    let err = Requirement::create_for(
        &relationship,
        grade_draft(None),
        &ActorId::new("usr-buyer"),
        created_at(),
    )
    .unwrap_err();
    assert!(matches!(err, ComplianceError::RelationshipNotActive(_)));
}

#[test]
fn creation_denormalizes_parties_without_history() {
    let requirement = requirement(None);
    assert_eq!(requirement.company_id.as_str(), "co-acme");
    assert_eq!(requirement.supplier_id.as_str(), "sup-vendor");
    assert_eq!(requirement.status(), RequirementStatus::Pending);
    assert!(requirement.history().is_empty());
}

#[test]
fn reject_then_retry_keeps_full_history() {
    let supplier = ActorId::new("usr-vendor");
    let reviewer = ActorId::new("usr-buyer");
    let mut requirement = requirement(None);

    requirement.start(&supplier, created_at()).unwrap();
    requirement.submit(&supplier, created_at()).unwrap();
    requirement
        .reject(&reviewer, Some("grade too low".into()), created_at())
        .unwrap();
    requirement.retry(&supplier, created_at()).unwrap();

    use RequirementStatus::*;
    let steps: Vec<_> = requirement
        .history()
        .entries()
        .iter()
        .map(|change| (change.from, change.to))
        .collect();
    assert_eq!(
        steps,
        vec![
            (Some(Pending), InProgress),
            (Some(InProgress), Submitted),
            (Some(Submitted), Rejected),
            (Some(Rejected), InProgress),
        ]
    );
}

#[test]
fn start_and_retry_each_own_their_source_state() {
    let mut rejected = in_status(RequirementStatus::Rejected);
    let err = rejected
        .start(&ActorId::new("usr-vendor"), created_at())
        .unwrap_err();
    assert_eq!(err.from, "rejected");

    let mut pending = in_status(RequirementStatus::Pending);
    assert!(pending.retry(&ActorId::new("usr-vendor"), created_at()).is_err());
    assert!(pending.history().is_empty());
}

#[test]
fn configuration_is_locked_after_start() {
    let mut requirement = requirement(None);
    requirement
        .update_kind(
            RequirementKind::CheckFix(GradeConfig {
                minimum_grade: Some(Grade::B),
                max_report_age_days: Some(30),
            }),
            created_at(),
        )
        .expect("pending requirements accept new config");

    requirement
        .start(&ActorId::new("usr-vendor"), created_at())
        .unwrap();
    let err = requirement
        .update_kind(RequirementKind::CheckFix(GradeConfig::default()), created_at())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    assert!(matches!(err, ComplianceError::RequirementLocked { .. }));
}

#[test]
fn kind_discriminator_never_changes() {
    let mut requirement = requirement(None);
    let err = requirement
        .update_kind(
            RequirementKind::Questionnaire(QuestionnaireConfig {
                questionnaire_id: QuestionnaireId::new("qnr-1"),
                passing_score: None,
            }),
            created_at(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ComplianceError::Validation(ValidationError::KindMismatch {
            expected: "checkfix",
            found: "questionnaire"
        })
    ));
}

#[test]
fn kind_serializes_with_type_tag() {
    let kind = RequirementKind::CheckFix(GradeConfig {
        minimum_grade: Some(Grade::B),
        max_report_age_days: None,
    });
    let json = serde_json::to_value(&kind).unwrap();
    assert_eq!(json, serde_json::json!({ "type": "checkfix", "minimum_grade": "B" }));

    let parsed: RequirementKind = serde_json::from_value(serde_json::json!({
        "type": "questionnaire",
        "questionnaire_id": "qnr-7",
        "passing_score": 80
    }))
    .unwrap();
    assert_eq!(parsed.label(), "questionnaire");
}

#[test]
fn grade_config_defaults() {
    let config = GradeConfig::default();
    assert_eq!(config.effective_minimum_grade(), Grade::C);
    assert_eq!(config.effective_max_report_age_days(), Some(90));

    let disabled = GradeConfig {
        minimum_grade: None,
        max_report_age_days: Some(0),
    };
    assert_eq!(disabled.effective_max_report_age_days(), None);
}

fn any_status() -> impl Strategy<Value = RequirementStatus> {
    prop::sample::select(RequirementStatus::ordered().to_vec())
}

proptest! {
    #[test]
    fn transitions_outside_table_leave_state_untouched(
        from in any_status(),
        to in any_status(),
    ) {
        let mut requirement = in_status(from);
        prop_assert_eq!(requirement.status(), from);
        let before = requirement.clone();
        let result = requirement.transition_status(to, &ActorId::new("usr-prop"), None, created_at());

        if from.can_transition_to(to) {
            prop_assert!(result.is_ok());
            prop_assert_eq!(requirement.history().len(), before.history().len() + 1);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(&requirement, &before);
        }
    }
}
