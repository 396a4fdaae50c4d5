use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use supplier_compliance::workflows::audit::MemoryAuditSink;
use supplier_compliance::workflows::clock::{Clock, FixedClock};
use supplier_compliance::workflows::ids::{
    ActorId, CompanyId, OptionId, QuestionnaireId, SupplierId, TopicId,
};
use supplier_compliance::workflows::lifecycle::Lifecycle;
use supplier_compliance::workflows::questionnaire::{
    Answer, Question, QuestionDefinition, QuestionOption, QuestionType, Questionnaire, Topic,
};
use supplier_compliance::workflows::relationship::{Classification, Relationship};
use supplier_compliance::workflows::reminders::{
    stale_verifications, ComplianceEvent, RecordingNotifier, ReminderKind, ReminderPlanner,
};
use supplier_compliance::workflows::repository::PageRequest;
use supplier_compliance::workflows::requirement::{
    GradeConfig, NewRequirement, Priority, QuestionnaireConfig, Requirement, RequirementKind,
    RequirementStatus,
};
use supplier_compliance::workflows::store::InMemoryComplianceStore;
use supplier_compliance::workflows::submission::GradeEvidence;
use supplier_compliance::workflows::verification::{Grade, PolicyFailure, StaticVerificationClient};
use supplier_compliance::workflows::{ComplianceWorkflow, ErrorKind};

type Workflow = ComplianceWorkflow<InMemoryComplianceStore, StaticVerificationClient>;

struct Harness {
    workflow: Workflow,
    clock: Arc<FixedClock>,
    notifier: Arc<RecordingNotifier>,
    audit: Arc<MemoryAuditSink>,
    questions: Vec<Question>,
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()
}

fn company() -> CompanyId {
    CompanyId::new("co-globex")
}

fn supplier() -> SupplierId {
    SupplierId::new("sup-initech")
}

fn buyer() -> ActorId {
    ActorId::new("usr-buyer")
}

fn vendor() -> ActorId {
    ActorId::new("usr-vendor")
}

fn harness(grade: Grade) -> Harness {
    let clock = Arc::new(FixedClock::new(start()));
    let notifier = Arc::new(RecordingNotifier::default());
    let audit = Arc::new(MemoryAuditSink::default());
    let client = StaticVerificationClient::new("initech.example", grade, clock.clone())
        .with_report_age(Duration::days(10));
    let workflow = ComplianceWorkflow::new(
        Arc::new(InMemoryComplianceStore::new()),
        Arc::new(client),
        clock.clone(),
    )
    .with_notifier(notifier.clone())
    .with_audit_sink(audit.clone());

    let catalogue = workflow.questionnaires();
    let questionnaire = catalogue
        .create(
            Questionnaire::new(
                QuestionnaireId::new("qnr-vendor"),
                "Vendor security",
                "",
                70,
                vec![Topic {
                    id: TopicId::new("governance"),
                    title: "Governance".to_string(),
                }],
            )
            .expect("valid questionnaire"),
        )
        .expect("questionnaire stored");
    let questions = ["Security policy published?", "Incident plan tested?"]
        .iter()
        .enumerate()
        .map(|(index, text)| {
            catalogue
                .add_question(
                    &questionnaire.id,
                    QuestionDefinition {
                        topic_id: TopicId::new("governance"),
                        text: text.to_string(),
                        question_type: QuestionType::YesNo,
                        options: vec![
                            QuestionOption {
                                id: OptionId::new("yes"),
                                label: "Yes".to_string(),
                                points: 1,
                                is_correct: true,
                            },
                            QuestionOption {
                                id: OptionId::new("no"),
                                label: "No".to_string(),
                                points: 0,
                                is_correct: false,
                            },
                        ],
                        weight: 1.0,
                        must_pass: false,
                        required: true,
                        text_points: None,
                        order: index as u32 + 1,
                    },
                )
                .expect("question stored")
        })
        .collect();

    Harness {
        workflow,
        clock,
        notifier,
        audit,
        questions,
    }
}

impl Harness {
    fn active_relationship(&self) -> Relationship {
        let invited = self
            .workflow
            .invite_supplier(
                company(),
                "Security@Initech.example",
                Classification::Important,
                &buyer(),
            )
            .expect("invite");
        self.workflow
            .accept_invitation(&invited.id, supplier(), &vendor())
            .expect("accept")
    }

    fn requirement(
        &self,
        relationship: &Relationship,
        kind: RequirementKind,
        due_in: i64,
    ) -> Requirement {
        self.workflow
            .create_requirement(
                &company(),
                &relationship.id,
                NewRequirement {
                    title: format!("{} requirement", kind.label()),
                    description: String::new(),
                    priority: Priority::High,
                    due_date: Some(self.clock.now() + Duration::days(due_in)),
                    kind,
                },
                &buyer(),
            )
            .expect("requirement")
    }

    fn answers(&self, yes: usize) -> Vec<Answer> {
        self.questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let choice = if index < yes { "yes" } else { "no" };
                Answer::choice(question.id.clone(), &[choice])
            })
            .collect()
    }
}

fn questionnaire_kind() -> RequirementKind {
    RequirementKind::Questionnaire(QuestionnaireConfig {
        questionnaire_id: QuestionnaireId::new("qnr-vendor"),
        passing_score: None,
    })
}

#[test]
fn questionnaire_requirement_runs_from_invitation_to_approval() {
    let harness = harness(Grade::A);
    let relationship = harness.active_relationship();
    assert_eq!(relationship.invited_email, "security@initech.example");
    assert_eq!(relationship.history().len(), 2);

    let requirement = harness.requirement(&relationship, questionnaire_kind(), 14);
    let workflow = &harness.workflow;

    workflow
        .start_response(&supplier(), &requirement.id, &vendor())
        .expect("start");
    let failed = workflow
        .submit_questionnaire(&supplier(), &requirement.id, harness.answers(1), &vendor())
        .expect("submit");
    assert!(!failed.submission.score.passed);
    assert_eq!(failed.submission.score.percentage, 50.0);

    workflow
        .reject(&company(), &requirement.id, &buyer(), Some("incident plan missing".into()))
        .expect("reject");
    workflow
        .retry(&supplier(), &requirement.id, &vendor())
        .expect("retry");
    let passed = workflow
        .submit_questionnaire(&supplier(), &requirement.id, harness.answers(2), &vendor())
        .expect("resubmit");
    assert_eq!(passed.submission.attempt, 2);
    assert!(passed.submission.score.passed);

    let approved = workflow
        .approve(&company(), &requirement.id, &buyer(), None)
        .expect("approve");
    assert_eq!(approved.requirement.status(), RequirementStatus::Approved);
    assert!(approved.requirement.status().is_terminal());

    let submissions = workflow
        .submissions()
        .submissions(&requirement.id, PageRequest::default())
        .expect("submissions");
    assert_eq!(submissions.total, 2);

    let labels: Vec<&str> = harness
        .notifier
        .events()
        .iter()
        .map(ComplianceEvent::label)
        .collect();
    assert_eq!(labels, vec!["submitted", "rejected", "submitted", "approved"]);

    let actions: Vec<&str> = harness
        .audit
        .entries()
        .iter()
        .map(|entry| entry.action)
        .collect();
    assert_eq!(actions.first(), Some(&"relationship.invite"));
    assert_eq!(actions.last(), Some(&"requirement.approve"));
    assert!(actions.contains(&"requirement.retry"));
}

#[test]
fn grade_verification_below_minimum_is_recorded_but_fails() {
    let harness = harness(Grade::D);
    let relationship = harness.active_relationship();
    let requirement = harness.requirement(
        &relationship,
        RequirementKind::CheckFix(GradeConfig {
            minimum_grade: Some(Grade::B),
            max_report_age_days: Some(30),
        }),
        21,
    );
    let workflow = &harness.workflow;

    workflow
        .start_response(&supplier(), &requirement.id, &vendor())
        .expect("start");
    let receipt = workflow
        .submit_grade(
            &supplier(),
            &requirement.id,
            GradeEvidence {
                report_hash: "rpt-42".to_string(),
                account_id: "acct-initech".to_string(),
            },
            &vendor(),
        )
        .expect("submit grade");

    assert_eq!(receipt.requirement.status(), RequirementStatus::Submitted);
    assert!(!receipt.verification.passed);
    assert!(receipt.verification.domain_match);
    assert_eq!(
        receipt.verification.failures,
        vec![PolicyFailure::GradeBelowMinimum {
            grade: Grade::D,
            minimum: Grade::B,
        }]
    );

    let err = workflow
        .submit_grade(
            &supplier(),
            &requirement.id,
            GradeEvidence {
                report_hash: "rpt-43".to_string(),
                account_id: "acct-initech".to_string(),
            },
            &vendor(),
        )
        .expect_err("second submit");
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn verifications_become_stale_before_they_expire() {
    let harness = harness(Grade::B);
    let relationship = harness.active_relationship();
    let requirement = harness.requirement(
        &relationship,
        RequirementKind::CheckFix(GradeConfig::default()),
        21,
    );
    let workflow = &harness.workflow;
    workflow
        .start_response(&supplier(), &requirement.id, &vendor())
        .expect("start");
    workflow
        .submit_grade(
            &supplier(),
            &requirement.id,
            GradeEvidence {
                report_hash: "rpt-1".to_string(),
                account_id: "acct-initech".to_string(),
            },
            &vendor(),
        )
        .expect("submit grade");

    let page = workflow
        .submissions()
        .verifications(&requirement.id, PageRequest::default())
        .expect("verifications");
    assert!(stale_verifications(&page.items, 7, harness.clock.now()).is_empty());

    harness.clock.advance(Duration::days(24));
    assert_eq!(stale_verifications(&page.items, 7, harness.clock.now()).len(), 1);
}

#[test]
fn reminders_go_out_once_and_escalate_when_overdue() {
    let harness = harness(Grade::A);
    let relationship = harness.active_relationship();
    let soon = harness.requirement(&relationship, questionnaire_kind(), 3);
    let later = harness.requirement(&relationship, questionnaire_kind(), 30);
    let planner = ReminderPlanner::new(7);

    let sent = harness.workflow.send_reminders(&planner).expect("dispatch");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].requirement_id, soon.id);
    assert_eq!(sent[0].kind, ReminderKind::DueSoon);
    assert!(harness
        .workflow
        .send_reminders(&planner)
        .expect("dispatch")
        .is_empty());

    harness.clock.advance(Duration::days(31));
    let sent = harness.workflow.send_reminders(&planner).expect("dispatch");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].requirement_id, later.id);
    assert_eq!(sent[0].kind, ReminderKind::Overdue);
    assert_eq!(sent[0].days_until_due, -1);
    assert_eq!(harness.notifier.events().len(), 2);
}

#[test]
fn ownership_mismatches_surface_as_not_found() {
    let harness = harness(Grade::A);
    let relationship = harness.active_relationship();
    let requirement = harness.requirement(&relationship, questionnaire_kind(), 10);

    let err = harness
        .workflow
        .start_response(&SupplierId::new("sup-other"), &requirement.id, &vendor())
        .expect_err("foreign supplier");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = harness
        .workflow
        .approve(&CompanyId::new("co-other"), &requirement.id, &buyer(), None)
        .expect_err("foreign company");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn suspended_relationships_stop_new_requirements() {
    let harness = harness(Grade::A);
    let relationship = harness.active_relationship();
    harness
        .workflow
        .suspend_relationship(
            &company(),
            &relationship.id,
            &buyer(),
            Some("contract review".into()),
        )
        .expect("suspend");

    let err = harness
        .workflow
        .create_requirement(
            &company(),
            &relationship.id,
            NewRequirement {
                title: "Blocked".to_string(),
                description: String::new(),
                priority: Priority::Low,
                due_date: None,
                kind: questionnaire_kind(),
            },
            &buyer(),
        )
        .expect_err("suspended");
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);

    let reactivated = harness
        .workflow
        .reactivate_relationship(&company(), &relationship.id, &buyer(), None)
        .expect("reactivate");
    assert!(reactivated.can_receive_requirements());
}
