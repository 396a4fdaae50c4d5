use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use supplier_compliance::workflows::clock::FixedClock;
use supplier_compliance::workflows::ids::{OptionId, QuestionnaireId, TopicId};
use supplier_compliance::workflows::questionnaire::{
    QuestionDefinition, QuestionOption, QuestionType, Questionnaire, Topic,
};
use supplier_compliance::workflows::store::InMemoryComplianceStore;
use supplier_compliance::workflows::verification::{Grade, StaticVerificationClient};
use supplier_compliance::workflows::{compliance_router, ComplianceWorkflow};
use tower::ServiceExt;

struct Api {
    router: Router,
    question_id: String,
}

fn api() -> Api {
    let now = Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap();
    let clock = Arc::new(FixedClock::new(now));
    let client = StaticVerificationClient::new("vendor.example", Grade::A, clock.clone());
    let workflow = ComplianceWorkflow::new(
        Arc::new(InMemoryComplianceStore::new()),
        Arc::new(client),
        clock,
    );

    let questionnaire = workflow
        .questionnaires()
        .create(
            Questionnaire::new(
                QuestionnaireId::new("qnr-http"),
                "Quick check",
                "",
                100,
                vec![Topic {
                    id: TopicId::new("general"),
                    title: "General".to_string(),
                }],
            )
            .unwrap(),
        )
        .unwrap();
    let question = workflow
        .questionnaires()
        .add_question(
            &questionnaire.id,
            QuestionDefinition {
                topic_id: TopicId::new("general"),
                text: "Do you encrypt data at rest?".to_string(),
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
                order: 1,
            },
        )
        .unwrap();

    Api {
        router: compliance_router(Arc::new(workflow)),
        question_id: question.id.to_string(),
    }
}

async fn call(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Invite, accept and create one requirement of the given kind; returns its id.
async fn requirement(api: &Api, kind: Value) -> String {
    let (status, relationship) = call(
        &api.router,
        Method::POST,
        "/api/v1/companies/co-1/relationships",
        Some(json!({
            "invited_email": "it@vendor.example",
            "classification": "critical",
            "actor_id": "usr-buyer"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(relationship["status"], "pending");
    let relationship_id = relationship["id"].as_str().unwrap().to_string();

    let (status, accepted) = call(
        &api.router,
        Method::POST,
        &format!("/api/v1/invitations/{relationship_id}/accept"),
        Some(json!({ "supplier_id": "sup-1", "actor_id": "usr-vendor" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "active");

    let (status, created) = call(
        &api.router,
        Method::POST,
        &format!("/api/v1/companies/co-1/relationships/{relationship_id}/requirements"),
        Some(json!({
            "actor_id": "usr-buyer",
            "title": "Vendor review",
            "priority": "high",
            "due_date": "2025-07-15T00:00:00Z",
            "kind": kind
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    created["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn questionnaire_flow_over_http() {
    let api = api();
    let id = requirement(
        &api,
        json!({ "type": "questionnaire", "questionnaire_id": "qnr-http" }),
    )
    .await;
    let supplier_base = format!("/api/v1/suppliers/sup-1/requirements/{id}");

    let (status, response) = call(
        &api.router,
        Method::POST,
        &format!("{supplier_base}/start"),
        Some(json!({ "actor_id": "usr-vendor" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["requirement_id"], id.as_str());

    let answers = json!({
        "actor_id": "usr-vendor",
        "answers": [{ "question_id": api.question_id, "selected_options": ["yes"] }]
    });
    let (status, receipt) = call(
        &api.router,
        Method::POST,
        &format!("{supplier_base}/submissions"),
        Some(answers.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(receipt["requirement"]["status"], "submitted");
    assert_eq!(receipt["submission"]["score"]["passed"], true);

    let (status, error) = call(
        &api.router,
        Method::POST,
        &format!("{supplier_base}/submissions"),
        Some(answers),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["kind"], "conflict");

    let (status, reviewed) = call(
        &api.router,
        Method::POST,
        &format!("/api/v1/companies/co-1/requirements/{id}/approve"),
        Some(json!({ "actor_id": "usr-buyer", "notes": "looks good" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviewed["requirement"]["status"], "approved");

    let (status, error) = call(
        &api.router,
        Method::POST,
        &format!("/api/v1/companies/co-1/requirements/{id}/reject"),
        Some(json!({ "actor_id": "usr-buyer" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["kind"], "invalid_transition");

    let (status, page) = call(
        &api.router,
        Method::GET,
        &format!("/api/v1/companies/co-1/requirements/{id}/submissions"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);

    let (status, page) = call(
        &api.router,
        Method::GET,
        "/api/v1/suppliers/sup-1/requirements?status=approved",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn errors_map_to_status_codes() {
    let api = api();
    let id = requirement(&api, json!({ "type": "checkfix", "minimum_grade": "B" })).await;
    let supplier_base = format!("/api/v1/suppliers/sup-1/requirements/{id}");

    let (status, error) = call(
        &api.router,
        Method::GET,
        &format!("/api/v1/companies/co-other/requirements/{id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["kind"], "not_found");

    let (status, _) = call(
        &api.router,
        Method::POST,
        &format!("{supplier_base}/start"),
        Some(json!({ "actor_id": "usr-vendor" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, error) = call(
        &api.router,
        Method::POST,
        &format!("{supplier_base}/submissions"),
        Some(json!({ "actor_id": "usr-vendor", "answers": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["kind"], "validation");

    let (status, error) = call(
        &api.router,
        Method::POST,
        &format!("{supplier_base}/verifications"),
        Some(json!({ "actor_id": "usr-vendor", "report_hash": "rpt-1", "account_id": " " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(error["kind"], "external_service");

    let (status, receipt) = call(
        &api.router,
        Method::POST,
        &format!("{supplier_base}/verifications"),
        Some(json!({ "actor_id": "usr-vendor", "report_hash": "rpt-1", "account_id": "acct-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(receipt["verification"]["grade"], "A");
    assert_eq!(receipt["verification"]["passed"], true);
}

#[tokio::test]
async fn declined_invitation_cannot_be_accepted() {
    let api = api();
    let (_, relationship) = call(
        &api.router,
        Method::POST,
        "/api/v1/companies/co-1/relationships",
        Some(json!({ "invited_email": "sales@vendor.example", "actor_id": "usr-buyer" })),
    )
    .await;
    let relationship_id = relationship["id"].as_str().unwrap().to_string();

    let (status, declined) = call(
        &api.router,
        Method::POST,
        &format!("/api/v1/invitations/{relationship_id}/decline"),
        Some(json!({ "actor_id": "usr-vendor", "reason": "not a supplier" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(declined["status"], "rejected");

    let (status, error) = call(
        &api.router,
        Method::POST,
        &format!("/api/v1/invitations/{relationship_id}/accept"),
        Some(json!({ "supplier_id": "sup-2", "actor_id": "usr-vendor" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["kind"], "invalid_transition");

    let (status, page) = call(
        &api.router,
        Method::GET,
        "/api/v1/companies/co-1/relationships?status=rejected",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
}
