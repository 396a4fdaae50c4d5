use crate::cli::ServeArgs;
use crate::infra::{seed_baseline_questionnaire, AppState, ComplianceState};
use crate::routes::with_compliance_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use supplier_compliance::config::AppConfig;
use supplier_compliance::error::AppError;
use supplier_compliance::telemetry;
use supplier_compliance::workflows::clock::{Clock, SystemClock};
use supplier_compliance::workflows::reminders::ReminderPlanner;
use supplier_compliance::workflows::store::InMemoryComplianceStore;
use supplier_compliance::workflows::verification::StaticVerificationClient;
use supplier_compliance::workflows::ComplianceWorkflow;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let compliance = &config.compliance;
    let store = Arc::new(InMemoryComplianceStore::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let client = Arc::new(StaticVerificationClient::new(
        compliance.stub_domain.clone(),
        compliance.stub_grade,
        clock.clone(),
    ));
    let workflow = ComplianceWorkflow::new(store, client, clock);
    let (questionnaire, questions) = seed_baseline_questionnaire(&workflow)?;
    info!(
        questionnaire_id = %questionnaire.id,
        questions = questions.len(),
        "seeded questionnaire catalogue"
    );

    let state = ComplianceState {
        workflow: Arc::new(workflow),
        planner: ReminderPlanner::new(compliance.reminder_days),
    };

    let app = with_compliance_routes(state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        stub_domain = %compliance.stub_domain,
        stub_grade = compliance.stub_grade.label(),
        "supplier compliance service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
