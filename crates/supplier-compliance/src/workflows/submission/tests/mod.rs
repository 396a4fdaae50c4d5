mod submit;

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::SubmissionOrchestrator;
use crate::workflows::clock::FixedClock;
use crate::workflows::ids::{
    ActorId, CompanyId, OptionId, QuestionId, QuestionnaireId, RequirementId, SupplierId, TopicId,
};
use crate::workflows::questionnaire::{
    Answer, Question, QuestionDefinition, QuestionOption, QuestionRepository, QuestionType,
    Questionnaire, QuestionnaireRepository, Topic,
};
use crate::workflows::relationship::{Classification, RelationshipService};
use crate::workflows::requirement::{
    GradeConfig, NewRequirement, Priority, QuestionnaireConfig, Requirement, RequirementKind,
    RequirementService,
};
use crate::workflows::store::InMemoryComplianceStore;
use crate::workflows::verification::{Grade, StaticVerificationClient};

const COMPANY: &str = "co-acme";
const SUPPLIER: &str = "sup-vendor";
const QUESTIONNAIRE: &str = "qnr-sec";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap()
}

fn company() -> CompanyId {
    CompanyId::new(COMPANY)
}

fn supplier() -> SupplierId {
    SupplierId::new(SUPPLIER)
}

fn buyer() -> ActorId {
    ActorId::new("usr-buyer")
}

fn vendor_user() -> ActorId {
    ActorId::new("usr-vendor")
}

type Orchestrator = SubmissionOrchestrator<InMemoryComplianceStore, StaticVerificationClient>;

struct Fixture {
    store: Arc<InMemoryComplianceStore>,
    clock: Arc<FixedClock>,
    requirements: RequirementService<InMemoryComplianceStore>,
    orchestrator: Orchestrator,
    questionnaire_req: RequirementId,
    grade_req: RequirementId,
}

impl Fixture {
    fn requirement(&self, id: &RequirementId) -> Requirement {
        self.requirements.get(id).unwrap()
    }

    /// Build a fresh orchestrator over the same store with a different provider grade.
    fn with_grade(&self, grade: Grade) -> Orchestrator {
        let client = StaticVerificationClient::new("vendor.io", grade, self.clock.clone())
            .with_report_age(Duration::days(5));
        SubmissionOrchestrator::new(self.store.clone(), Arc::new(client), self.clock.clone())
    }
}

fn yes_no(id: &str, order: u32) -> Question {
    let definition = QuestionDefinition {
        topic_id: TopicId::new("access"),
        text: format!("Control {id} in place?"),
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
        order,
    };
    Question::new(
        QuestionId::new(id),
        QuestionnaireId::new(QUESTIONNAIRE),
        definition,
    )
    .unwrap()
}

/// Answer the five fixture questions, `yes_count` of them with "yes".
fn answers(yes_count: usize) -> Vec<Answer> {
    (1..=5)
        .map(|n| {
            let choice = if n <= yes_count { "yes" } else { "no" };
            Answer::choice(format!("q-{n}").as_str(), &[choice])
        })
        .collect()
}

fn fixture() -> Fixture {
    let store = Arc::new(InMemoryComplianceStore::default());
    let clock = Arc::new(FixedClock::new(now()));

    let questionnaire = Questionnaire::new(
        QuestionnaireId::new(QUESTIONNAIRE),
        "Security baseline",
        "Core controls",
        70,
        vec![Topic {
            id: TopicId::new("access"),
            title: "Access control".to_string(),
        }],
    )
    .unwrap();
    store.insert_questionnaire(questionnaire).unwrap();
    for n in 1..=5 {
        store.insert_question(yes_no(&format!("q-{n}"), n)).unwrap();
    }

    let relationships = RelationshipService::new(store.clone(), clock.clone());
    let invited = relationships
        .invite(company(), "security@vendor.io", Classification::Critical, &buyer())
        .unwrap();
    let relationship = relationships
        .accept(&invited.id, supplier(), &vendor_user())
        .unwrap();

    let requirements = RequirementService::new(store.clone(), clock.clone());
    let questionnaire_req = requirements
        .create(
            &company(),
            &relationship.id,
            NewRequirement {
                title: "Security baseline".to_string(),
                description: String::new(),
                priority: Priority::High,
                due_date: Some(now() + Duration::days(30)),
                kind: RequirementKind::Questionnaire(QuestionnaireConfig {
                    questionnaire_id: QuestionnaireId::new(QUESTIONNAIRE),
                    passing_score: None,
                }),
            },
            &buyer(),
        )
        .unwrap()
        .id;
    let grade_req = requirements
        .create(
            &company(),
            &relationship.id,
            NewRequirement {
                title: "External grade".to_string(),
                description: String::new(),
                priority: Priority::Medium,
                due_date: None,
                kind: RequirementKind::CheckFix(GradeConfig::default()),
            },
            &buyer(),
        )
        .unwrap()
        .id;

    let client = StaticVerificationClient::new("vendor.io", Grade::B, clock.clone())
        .with_report_age(Duration::days(5));
    let orchestrator =
        SubmissionOrchestrator::new(store.clone(), Arc::new(client), clock.clone());

    Fixture {
        store,
        clock,
        requirements,
        orchestrator,
        questionnaire_req,
        grade_req,
    }
}
