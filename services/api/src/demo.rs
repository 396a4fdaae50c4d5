use crate::infra::{parse_date, parse_grade, seed_baseline_questionnaire, start_of_business};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use std::sync::Arc;
use supplier_compliance::config::AppConfig;
use supplier_compliance::error::AppError;
use supplier_compliance::workflows::audit::MemoryAuditSink;
use supplier_compliance::workflows::clock::{Clock, FixedClock};
use supplier_compliance::workflows::ids::{ActorId, CompanyId, SupplierId};
use supplier_compliance::workflows::lifecycle::Lifecycle;
use supplier_compliance::workflows::questionnaire::{Answer, Question};
use supplier_compliance::workflows::relationship::Classification;
use supplier_compliance::workflows::reminders::{
    stale_verifications, RecordingNotifier, Reminder, ReminderPlanner,
};
use supplier_compliance::workflows::repository::PageRequest;
use supplier_compliance::workflows::requirement::{
    GradeConfig, NewRequirement, Priority, QuestionnaireConfig, Requirement, RequirementFilter,
    RequirementKind,
};
use supplier_compliance::workflows::store::InMemoryComplianceStore;
use supplier_compliance::workflows::submission::GradeEvidence;
use supplier_compliance::workflows::verification::{Grade, StaticVerificationClient};
use supplier_compliance::workflows::ComplianceWorkflow;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the walkthrough starts on (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Grade the stand-in provider reports. Defaults to COMPLIANCE_STUB_GRADE.
    #[arg(long, value_parser = parse_grade)]
    pub(crate) grade: Option<Grade>,
    /// Minimum grade the company requires.
    #[arg(long, value_parser = parse_grade)]
    pub(crate) minimum_grade: Option<Grade>,
    /// Domain the stand-in provider reports. Defaults to COMPLIANCE_STUB_DOMAIN.
    #[arg(long)]
    pub(crate) domain: Option<String>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let settings = config.compliance;

    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let now = start_of_business(today);
    let grade = args.grade.unwrap_or(settings.stub_grade);
    let domain = args.domain.unwrap_or(settings.stub_domain);

    let clock = Arc::new(FixedClock::new(now));
    let client = StaticVerificationClient::new(domain.clone(), grade, clock.clone())
        .with_report_age(Duration::days(3));
    let notifier = Arc::new(RecordingNotifier::default());
    let audit = Arc::new(MemoryAuditSink::default());
    let workflow = ComplianceWorkflow::new(
        Arc::new(InMemoryComplianceStore::new()),
        Arc::new(client),
        clock.clone(),
    )
    .with_notifier(notifier.clone())
    .with_audit_sink(audit.clone());
    let planner = ReminderPlanner::new(settings.reminder_days);

    let company = CompanyId::new("co-northwind");
    let supplier = SupplierId::new("sup-contoso");
    let buyer = ActorId::new("usr-procurement");
    let vendor = ActorId::new("usr-contoso-security");

    println!("Supplier compliance demo");
    println!(
        "Starting {} | provider reports grade {} for {}",
        today,
        grade.label(),
        domain
    );

    let (questionnaire, questions) = seed_baseline_questionnaire(&workflow)?;
    println!(
        "- Catalogue: '{}' with {} questions, passing score {}%",
        questionnaire.title,
        questions.len(),
        questionnaire.passing_score()
    );

    println!("\nRelationship");
    let invited = workflow.invite_supplier(
        company.clone(),
        &format!("security@{domain}"),
        Classification::Critical,
        &buyer,
    )?;
    println!(
        "- Invited {} -> status {}",
        invited.invited_email,
        invited.status().label()
    );
    let relationship = workflow.accept_invitation(&invited.id, supplier.clone(), &vendor)?;
    println!(
        "- Accepted by {} -> status {}",
        supplier,
        relationship.status().label()
    );

    println!("\nRequirements");
    let questionnaire_req = workflow.create_requirement(
        &company,
        &relationship.id,
        NewRequirement {
            title: "Annual security questionnaire".to_string(),
            description: "Baseline controls review".to_string(),
            priority: Priority::High,
            due_date: Some(now + Duration::days(5)),
            kind: RequirementKind::Questionnaire(QuestionnaireConfig {
                questionnaire_id: questionnaire.id.clone(),
                passing_score: None,
            }),
        },
        &buyer,
    )?;
    let grade_req = workflow.create_requirement(
        &company,
        &relationship.id,
        NewRequirement {
            title: "External security grade".to_string(),
            description: String::new(),
            priority: Priority::Medium,
            due_date: Some(now + Duration::days(20)),
            kind: RequirementKind::CheckFix(GradeConfig {
                minimum_grade: args.minimum_grade,
                max_report_age_days: None,
            }),
        },
        &buyer,
    )?;
    for requirement in [&questionnaire_req, &grade_req] {
        print_requirement(requirement);
    }

    println!("\nReminder plan ({} day window)", planner.days_before());
    let open = workflow.requirements().list(
        &RequirementFilter {
            company_id: Some(company.clone()),
            ..RequirementFilter::default()
        },
        PageRequest::default(),
    )?;
    print_reminders(&planner.plan(&open.items, clock.now()));
    let sent = workflow.send_reminders(&planner)?;
    println!("- Delivered {} reminder(s)", sent.len());

    println!("\nQuestionnaire");
    workflow.start_response(&supplier, &questionnaire_req.id, &vendor)?;
    let first = workflow.submit_questionnaire(
        &supplier,
        &questionnaire_req.id,
        answers(&questions, false),
        &vendor,
    )?;
    let score = &first.submission.score;
    println!(
        "- Attempt {}: {}/{} points ({:.1}%) -> {}",
        first.submission.attempt,
        score.total_points,
        score.max_points,
        score.percentage,
        if score.passed { "passed" } else { "failed" }
    );
    for topic in score.weakest_topics(1) {
        println!("  weakest topic: {} ({:.1}%)", topic.topic_id, topic.percentage);
    }
    let rejected = workflow.reject(
        &company,
        &questionnaire_req.id,
        &buyer,
        Some("Access reviews and backup testing are required".to_string()),
    )?;
    println!(
        "- Reviewer rejected -> status {}",
        rejected.requirement.status().label()
    );
    workflow.retry(&supplier, &questionnaire_req.id, &vendor)?;
    clock.advance(Duration::days(2));
    let second = workflow.submit_questionnaire(
        &supplier,
        &questionnaire_req.id,
        answers(&questions, true),
        &vendor,
    )?;
    let score = &second.submission.score;
    println!(
        "- Attempt {}: {}/{} points ({:.1}%) -> {}",
        second.submission.attempt,
        score.total_points,
        score.max_points,
        score.percentage,
        if score.passed { "passed" } else { "failed" }
    );
    let approved = workflow.approve(
        &company,
        &questionnaire_req.id,
        &buyer,
        Some("Controls confirmed".to_string()),
    )?;
    print_requirement(&approved.requirement);

    println!("\nSecurity grade");
    workflow.start_response(&supplier, &grade_req.id, &vendor)?;
    let receipt = workflow.submit_grade(
        &supplier,
        &grade_req.id,
        GradeEvidence {
            report_hash: "rpt-demo-0001".to_string(),
            account_id: "acct-contoso".to_string(),
        },
        &vendor,
    )?;
    let verification = &receipt.verification;
    println!(
        "- Grade {} (score {}) for {}, domain match {}, valid until {}",
        verification.grade.label(),
        verification.score,
        verification.reported_domain,
        verification.domain_match,
        verification.expires_at.date_naive()
    );
    let review = if verification.passed {
        workflow.approve(&company, &grade_req.id, &buyer, None)?
    } else {
        let reasons: Vec<String> = verification
            .failures
            .iter()
            .map(|failure| failure.summary())
            .collect();
        for reason in &reasons {
            println!("  policy failure: {reason}");
        }
        workflow.reject(&company, &grade_req.id, &buyer, Some(reasons.join("; ")))?
    };
    print_requirement(&review.requirement);

    clock.advance(Duration::days(25));
    println!("\nRefresh check on {}", clock.now().date_naive());
    let verifications = workflow
        .submissions()
        .verifications(&grade_req.id, PageRequest::default())?;
    let stale = stale_verifications(&verifications.items, settings.refresh_days, clock.now());
    if stale.is_empty() {
        println!("- No verifications due for refresh");
    }
    for verification in stale {
        println!(
            "- Verification {} expires {}; ask the supplier for a new report",
            verification.id,
            verification.expires_at.date_naive()
        );
    }

    println!("\nNotifications");
    for event in notifier.events() {
        println!("- {} for {}", event.label(), event.requirement_id());
    }
    println!("\nAudit trail: {} entries", audit.entries().len());

    Ok(())
}

/// Answer the baseline questionnaire, either with the strongest option everywhere
/// or with a partial set of controls.
fn answers(questions: &[Question], complete: bool) -> Vec<Answer> {
    questions
        .iter()
        .map(|question| {
            let options: &[&str] = match (question.order, complete) {
                (1, _) => &["yes"],
                (2 | 3, true) => &["yes"],
                (2 | 3, false) => &["no"],
                (4, true) => &["within-week"],
                (4, false) => &["within-month"],
                (_, true) => &["iso-27001", "soc2"],
                (_, false) => &["iso-27001"],
            };
            Answer::choice(question.id.clone(), options)
        })
        .collect()
}

fn print_requirement(requirement: &Requirement) {
    let due = requirement
        .due_date
        .map(|due| due.date_naive().to_string())
        .unwrap_or_else(|| "no due date".to_string());
    println!(
        "- {} [{}] due {} -> status {}",
        requirement.title,
        requirement.kind().label(),
        due,
        requirement.status().label()
    );
}

fn print_reminders(reminders: &[Reminder]) {
    if reminders.is_empty() {
        println!("- Nothing due inside the window");
    }
    for reminder in reminders {
        println!(
            "- [{}] {} for {} in {} day(s)",
            reminder.kind.label(),
            reminder.title,
            reminder.supplier_id,
            reminder.days_until_due
        );
    }
}
