use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use supplier_compliance::workflows::ids::{OptionId, QuestionnaireId, TopicId};
use supplier_compliance::workflows::questionnaire::{
    Question, QuestionDefinition, QuestionOption, QuestionType, Questionnaire, Topic,
};
use supplier_compliance::workflows::reminders::ReminderPlanner;
use supplier_compliance::workflows::store::InMemoryComplianceStore;
use supplier_compliance::workflows::verification::{Grade, StaticVerificationClient};
use supplier_compliance::workflows::{ComplianceError, ComplianceWorkflow};

/// Workflow wired over the in-memory store and the deterministic grading client.
pub(crate) type LocalWorkflow =
    ComplianceWorkflow<InMemoryComplianceStore, StaticVerificationClient>;

pub(crate) const BASELINE_QUESTIONNAIRE: &str = "qnr-security-baseline";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Shared by the reminder and catalogue endpoints that sit beside the core router.
#[derive(Clone)]
pub(crate) struct ComplianceState {
    pub(crate) workflow: Arc<LocalWorkflow>,
    pub(crate) planner: ReminderPlanner,
}

/// Register the security baseline questionnaire every local run starts with.
pub(crate) fn seed_baseline_questionnaire(
    workflow: &LocalWorkflow,
) -> Result<(Questionnaire, Vec<Question>), ComplianceError> {
    let catalogue = workflow.questionnaires();
    let questionnaire = catalogue.create(Questionnaire::new(
        QuestionnaireId::new(BASELINE_QUESTIONNAIRE),
        "Security baseline",
        "Minimum controls expected from every supplier with data access",
        70,
        vec![
            Topic {
                id: TopicId::new("access"),
                title: "Access control".to_string(),
            },
            Topic {
                id: TopicId::new("operations"),
                title: "Operational resilience".to_string(),
            },
        ],
    )?)?;

    let questions = baseline_questions()
        .into_iter()
        .map(|definition| catalogue.add_question(&questionnaire.id, definition))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((questionnaire, questions))
}

fn baseline_questions() -> Vec<QuestionDefinition> {
    vec![
        QuestionDefinition {
            must_pass: true,
            ..yes_no("access", "Is MFA enforced for every administrative account?", 1)
        },
        yes_no("access", "Are access rights reviewed at least quarterly?", 2),
        yes_no("operations", "Are backup restores tested at least yearly?", 3),
        QuestionDefinition {
            topic_id: TopicId::new("operations"),
            text: "How quickly are critical patches rolled out?".to_string(),
            question_type: QuestionType::SingleChoice,
            options: vec![
                option("within-week", "Within a week", 2, true),
                option("within-month", "Within a month", 1, false),
                option("ad-hoc", "No fixed timeline", 0, false),
            ],
            weight: 1.0,
            must_pass: false,
            required: true,
            text_points: None,
            order: 4,
        },
        QuestionDefinition {
            topic_id: TopicId::new("operations"),
            text: "Which certifications are currently held?".to_string(),
            question_type: QuestionType::MultipleChoice,
            options: vec![
                option("iso-27001", "ISO 27001", 1, true),
                option("soc2", "SOC 2 Type II", 1, true),
                option("none", "None", 0, false),
            ],
            weight: 1.0,
            must_pass: false,
            required: false,
            text_points: None,
            order: 5,
        },
    ]
}

fn yes_no(topic: &str, text: &str, order: u32) -> QuestionDefinition {
    QuestionDefinition {
        topic_id: TopicId::new(topic),
        text: text.to_string(),
        question_type: QuestionType::YesNo,
        options: vec![
            option("yes", "Yes", 1, true),
            option("no", "No", 0, false),
        ],
        weight: 1.0,
        must_pass: false,
        required: true,
        text_points: None,
        order,
    }
}

fn option(id: &str, label: &str, points: u32, is_correct: bool) -> QuestionOption {
    QuestionOption {
        id: OptionId::new(id),
        label: label.to_string(),
        points,
        is_correct,
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_grade(raw: &str) -> Result<Grade, String> {
    raw.parse::<Grade>()
        .map_err(|_| format!("'{raw}' is not a grade (expected one of A, B, C, D, F)"))
}

/// Nine in the morning UTC on the given day.
pub(crate) fn start_of_business(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(9, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use supplier_compliance::workflows::clock::FixedClock;

    fn workflow() -> LocalWorkflow {
        let clock = Arc::new(FixedClock::new(start_of_business(
            NaiveDate::from_ymd_opt(2025, 5, 2).expect("valid date"),
        )));
        let client = StaticVerificationClient::new("supplier.example", Grade::B, clock.clone());
        ComplianceWorkflow::new(
            Arc::new(InMemoryComplianceStore::new()),
            Arc::new(client),
            clock,
        )
    }

    #[test]
    fn baseline_questionnaire_is_seeded_in_order() {
        let workflow = workflow();
        let (questionnaire, questions) =
            seed_baseline_questionnaire(&workflow).expect("seed succeeds");

        assert_eq!(questionnaire.passing_score(), 70);
        assert_eq!(questions.len(), 5);
        assert!(questions[0].must_pass);
        let max: u32 = questions.iter().map(Question::max_points).sum();
        assert_eq!(max, 7);

        let err = seed_baseline_questionnaire(&workflow).expect_err("seeded twice");
        assert_eq!(err.kind().label(), "conflict");
    }

    #[test]
    fn grades_parse_case_insensitively() {
        assert_eq!(parse_grade("c"), Ok(Grade::C));
        assert!(parse_grade("E").is_err());
        assert!(parse_date("2025-13-01").is_err());
    }
}
