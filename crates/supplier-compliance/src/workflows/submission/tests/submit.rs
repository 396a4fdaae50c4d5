use super::*;
use crate::workflows::error::{ComplianceError, ErrorKind, ValidationError};
use crate::workflows::ids::{ResponseId, SubmissionId};
use crate::workflows::questionnaire::ScoringEngine;
use crate::workflows::repository::PageRequest;
use crate::workflows::requirement::RequirementStatus;
use crate::workflows::submission::{
    GradeEvidence, QuestionnaireSubmission, ResponseOutcome, ResponseRepository,
    SubmissionRepository, SupplierResponse,
};
use crate::workflows::verification::{ClientError, PolicyFailure};

fn evidence(account: &str) -> GradeEvidence {
    GradeEvidence {
        report_hash: "rpt-7f3a".to_string(),
        account_id: account.to_string(),
    }
}

fn started(fixture: &Fixture, requirement_id: &RequirementId) -> SupplierResponse {
    fixture
        .orchestrator
        .start(&supplier(), requirement_id, &vendor_user())
        .unwrap()
}

/// Score and persist attempt one directly, as an interrupted submit would have.
fn record_submission(
    fixture: &Fixture,
    response_id: &ResponseId,
    yes_count: usize,
) -> QuestionnaireSubmission {
    let questions = fixture
        .store
        .list_questions(&QuestionnaireId::new(QUESTIONNAIRE))
        .unwrap();
    let score = ScoringEngine::new(70)
        .score(&questions, &answers(yes_count))
        .unwrap();
    let submission = QuestionnaireSubmission {
        id: SubmissionId::generate(),
        response_id: response_id.clone(),
        requirement_id: fixture.questionnaire_req.clone(),
        questionnaire_id: QuestionnaireId::new(QUESTIONNAIRE),
        supplier_id: supplier(),
        attempt: 1,
        score,
        submitted_at: now(),
    };
    fixture.store.insert_submission(submission).unwrap()
}

#[test]
fn questionnaire_below_passing_score_is_still_submitted() {
    let fixture = fixture();
    started(&fixture, &fixture.questionnaire_req);

    let receipt = fixture
        .orchestrator
        .submit_questionnaire(&supplier(), &fixture.questionnaire_req, answers(3), &vendor_user())
        .unwrap();

    assert_eq!(receipt.requirement.status(), RequirementStatus::Submitted);
    assert!((receipt.submission.score.percentage - 60.0).abs() < f64::EPSILON);
    assert!(!receipt.submission.score.passed);
    assert_eq!(receipt.submission.attempt, 1);
    assert!(receipt.response.is_submitted());
    assert_eq!(
        receipt.response.outcome().map(ResponseOutcome::passed),
        Some(false)
    );
}

#[test]
fn requirement_override_replaces_questionnaire_passing_score() {
    let fixture = fixture();
    let lowered = RequirementKind::Questionnaire(QuestionnaireConfig {
        questionnaire_id: QuestionnaireId::new(QUESTIONNAIRE),
        passing_score: Some(50),
    });
    fixture
        .requirements
        .update_config(&company(), &fixture.questionnaire_req, lowered)
        .unwrap();
    started(&fixture, &fixture.questionnaire_req);

    let receipt = fixture
        .orchestrator
        .submit_questionnaire(&supplier(), &fixture.questionnaire_req, answers(3), &vendor_user())
        .unwrap();
    assert_eq!(receipt.submission.score.passing_score, 50);
    assert!(receipt.submission.score.passed);
}

#[test]
fn submit_without_start_is_not_found() {
    let fixture = fixture();
    let err = fixture
        .orchestrator
        .submit_questionnaire(&supplier(), &fixture.questionnaire_req, answers(5), &vendor_user())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn second_submit_of_same_attempt_conflicts() {
    let fixture = fixture();
    started(&fixture, &fixture.questionnaire_req);
    fixture
        .orchestrator
        .submit_questionnaire(&supplier(), &fixture.questionnaire_req, answers(5), &vendor_user())
        .unwrap();

    let err = fixture
        .orchestrator
        .submit_questionnaire(&supplier(), &fixture.questionnaire_req, answers(5), &vendor_user())
        .unwrap_err();
    assert!(matches!(err, ComplianceError::ResponseAlreadySubmitted(_)));

    let submissions = fixture
        .orchestrator
        .submissions(&fixture.questionnaire_req, PageRequest::default())
        .unwrap();
    assert_eq!(submissions.total, 1);
}

#[test]
fn interrupted_submit_is_completed_on_retry() {
    let fixture = fixture();
    let mut response = started(&fixture, &fixture.questionnaire_req);
    let recorded = record_submission(&fixture, &response.id, 4);
    response.record_outcome(recorded.outcome(), now()).unwrap();
    fixture.store.update_response(response).unwrap();
    assert_eq!(
        fixture.requirement(&fixture.questionnaire_req).status(),
        RequirementStatus::InProgress
    );

    let receipt = fixture
        .orchestrator
        .submit_questionnaire(&supplier(), &fixture.questionnaire_req, Vec::new(), &vendor_user())
        .unwrap();
    assert_eq!(receipt.submission.id, recorded.id);
    assert_eq!(receipt.requirement.status(), RequirementStatus::Submitted);
    assert_eq!(
        fixture.requirement(&fixture.questionnaire_req).status(),
        RequirementStatus::Submitted
    );
}

#[test]
fn recorded_attempt_is_reused_instead_of_rescored() {
    let fixture = fixture();
    let response = started(&fixture, &fixture.questionnaire_req);
    let recorded = record_submission(&fixture, &response.id, 5);

    let receipt = fixture
        .orchestrator
        .submit_questionnaire(&supplier(), &fixture.questionnaire_req, answers(1), &vendor_user())
        .unwrap();
    assert_eq!(receipt.submission.id, recorded.id);
    assert_eq!(receipt.submission.score.total_points, 5);
    assert!(receipt.response.is_submitted());
}

#[test]
fn grade_report_is_verified_and_recorded() {
    let fixture = fixture();
    started(&fixture, &fixture.grade_req);

    let receipt = fixture
        .orchestrator
        .submit_grade(&supplier(), &fixture.grade_req, evidence("acct-42"), &vendor_user())
        .unwrap();

    assert_eq!(receipt.requirement.status(), RequirementStatus::Submitted);
    assert_eq!(receipt.verification.grade, Grade::B);
    assert!(receipt.verification.passed);
    assert!(receipt.verification.domain_match);
    assert_eq!(receipt.verification.expires_at, now() + Duration::days(30));
    assert!(matches!(
        receipt.response.outcome(),
        Some(ResponseOutcome::CheckFix { grade: Grade::B, passed: true, .. })
    ));
}

#[test]
fn low_grade_fails_policy_but_is_submitted_for_review() {
    let fixture = fixture();
    started(&fixture, &fixture.grade_req);

    let receipt = fixture
        .with_grade(Grade::D)
        .submit_grade(&supplier(), &fixture.grade_req, evidence("acct-42"), &vendor_user())
        .unwrap();
    assert!(!receipt.verification.passed);
    assert!(receipt
        .verification
        .failures
        .contains(&PolicyFailure::GradeBelowMinimum {
            grade: Grade::D,
            minimum: Grade::C,
        }));
    assert_eq!(receipt.requirement.status(), RequirementStatus::Submitted);
}

#[test]
fn inaccessible_account_leaves_requirement_in_progress() {
    let fixture = fixture();
    started(&fixture, &fixture.grade_req);

    let err = fixture
        .orchestrator
        .submit_grade(&supplier(), &fixture.grade_req, evidence("  "), &vendor_user())
        .unwrap_err();
    assert!(matches!(
        err,
        ComplianceError::ExternalService(ClientError::AccessDenied(_))
    ));
    assert_eq!(err.kind(), ErrorKind::ExternalService);
    assert_eq!(
        fixture.requirement(&fixture.grade_req).status(),
        RequirementStatus::InProgress
    );
    let verifications = fixture
        .orchestrator
        .verifications(&fixture.grade_req, PageRequest::default())
        .unwrap();
    assert_eq!(verifications.total, 0);
}

#[test]
fn response_kind_must_match_requirement_kind() {
    let fixture = fixture();
    started(&fixture, &fixture.questionnaire_req);
    started(&fixture, &fixture.grade_req);

    let err = fixture
        .orchestrator
        .submit_grade(
            &supplier(),
            &fixture.questionnaire_req,
            evidence("acct-42"),
            &vendor_user(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ComplianceError::Validation(ValidationError::KindMismatch {
            expected: "questionnaire",
            found: "checkfix",
        })
    ));

    let err = fixture
        .orchestrator
        .submit_questionnaire(&supplier(), &fixture.grade_req, answers(5), &vendor_user())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
