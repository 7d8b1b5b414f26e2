use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode},
};
use lifeboard::{
    flows::Flows,
    server::{AppState, router},
    store::SessionStore,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

mod common;
use common::MockLlmClient;

fn test_app(mock: MockLlmClient) -> Router {
    let state = AppState {
        store: Arc::new(SessionStore::new()),
        flows: Arc::new(Flows::new().unwrap()),
        llm: Arc::new(mock),
    };
    router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_session(app: &Router) -> String {
    let response = send(app, "POST", "/api/sessions", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await["sessionId"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn create_session_returns_a_uuid() {
    let app = test_app(MockLlmClient::new());
    let session_id = create_session(&app).await;
    assert!(uuid::Uuid::parse_str(&session_id).is_ok());
}

#[test_log::test(tokio::test)]
async fn task_lifecycle_over_http() {
    let app = test_app(MockLlmClient::new());
    let session = create_session(&app).await;

    let response = send(&app, "GET", &format!("/api/sessions/{session}/tasks"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 4);

    let response = send(
        &app,
        "POST",
        &format!("/api/sessions/{session}/tasks"),
        Some(json!({"title": "Water the plants", "priority": "low"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let created = json_body(response).await;
    assert_eq!(created["title"], "Water the plants");
    assert_eq!(created["completed"], false);
    let task_id = created["id"].as_i64().unwrap();

    let response = send(
        &app,
        "POST",
        &format!("/api/sessions/{session}/tasks/{task_id}/toggle"),
        None,
    )
    .await;
    assert_eq!(json_body(response).await["completed"], true);

    let response = send(
        &app,
        "DELETE",
        &format!("/api/sessions/{session}/tasks/{task_id}"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &app,
        "DELETE",
        &format!("/api/sessions/{session}/tasks/{task_id}"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_task_title_is_rejected() {
    let app = test_app(MockLlmClient::new());
    let session = create_session(&app).await;

    let response = send(
        &app,
        "POST",
        &format!("/api/sessions/{session}/tasks"),
        Some(json!({"title": "   ", "priority": "high"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = test_app(MockLlmClient::new());

    let response = send(&app, "GET", "/api/sessions/nope/tasks", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("Session not found"));
}

#[tokio::test]
async fn expenses_can_be_added_and_listed() {
    let app = test_app(MockLlmClient::new());
    let session = create_session(&app).await;

    let response = send(
        &app,
        "POST",
        &format!("/api/sessions/{session}/expenses"),
        Some(json!({
            "description": "Coffee",
            "amount": 4.5,
            "category": "Food",
            "date": "2026-08-07T09:00:00Z",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", &format!("/api/sessions/{session}/expenses"), None).await;
    let expenses = json_body(response).await;
    assert_eq!(expenses.as_array().unwrap().len(), 5);
    assert_eq!(expenses[4]["description"], "Coffee");

    let response = send(
        &app,
        "POST",
        &format!("/api/sessions/{session}/expenses"),
        Some(json!({
            "description": "Refund",
            "amount": -10,
            "category": "Other",
            "date": "2026-08-07T09:00:00Z",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn portfolio_refresh_and_removal() {
    let app = test_app(MockLlmClient::new());
    let session = create_session(&app).await;

    let response = send(
        &app,
        "POST",
        &format!("/api/sessions/{session}/portfolio/refresh"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let refreshed = json_body(response).await;
    assert_eq!(refreshed.as_array().unwrap().len(), 4);
    for holding in refreshed.as_array().unwrap() {
        assert!(holding["price"].as_f64().unwrap() >= 0.0);
    }

    let response = send(
        &app,
        "DELETE",
        &format!("/api/sessions/{session}/portfolio/TSLA"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &app,
        "DELETE",
        &format!("/api/sessions/{session}/portfolio/TSLA"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn books_and_summary() {
    let app = test_app(MockLlmClient::new());
    let session = create_session(&app).await;

    let response = send(
        &app,
        "POST",
        &format!("/api/sessions/{session}/books"),
        Some(json!({"title": "Hyperion", "author": "Dan Simmons", "progress": 10})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", &format!("/api/sessions/{session}/summary"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let summary = json_body(response).await;
    assert_eq!(summary["tasksCompleted"], 1);
    assert_eq!(summary["pagesRead"], 195);
    assert_eq!(summary["currentBudgetGoal"], 2000.0);
}

#[tokio::test]
async fn expense_insights_round_trip() {
    let mock = MockLlmClient::new().with_response(
        json!({
            "summary": "Balanced month overall.",
            "keySpendingAreas": ["Housing"],
            "potentialSavingsAreas": ["Entertainment"],
            "recommendations": "Review subscriptions.",
        })
        .to_string(),
    );
    let app = test_app(mock);

    let response = send(
        &app,
        "POST",
        "/api/insights/expenses",
        Some(json!({
            "expenses": [
                {"category": "Housing", "amount": 1200, "date": "2026-08-01"},
            ],
            "income": 5000,
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["summary"], "Balanced month overall.");
    assert_eq!(body["keySpendingAreas"], json!(["Housing"]));
}

#[tokio::test]
async fn invalid_insights_request_names_the_field() {
    let mock = MockLlmClient::new();
    let requests = mock.requests.clone();
    let app = test_app(mock);

    let response = send(
        &app,
        "POST",
        "/api/insights/expenses",
        Some(json!({"expenses": []})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("income"));

    // Request validation failed, so the backend was never called.
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn backend_failure_is_a_generic_bad_gateway() {
    let mock = MockLlmClient::new().with_error("connection reset by peer");
    let app = test_app(mock);

    let response = send(
        &app,
        "POST",
        "/api/insights/expenses",
        Some(json!({"expenses": [], "income": 5000})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = json_body(response).await;
    assert_eq!(body["error"], "Failed to generate insights");
    assert!(!body["error"].as_str().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn malformed_backend_output_is_a_bad_gateway() {
    let mock = MockLlmClient::new().with_response(json!({"challenges": "not a list"}).to_string());
    let app = test_app(mock);

    let response = send(
        &app,
        "POST",
        "/api/challenges",
        Some(json!({
            "tasksCompleted": 3, "pagesRead": 120,
            "spendingLastWeek": 1850, "currentBudgetGoal": 2000,
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Failed to generate challenges");
}

/// The activity summary serializes to exactly the request shape the
/// challenges flow expects, so it can be posted back verbatim.
#[tokio::test]
async fn summary_feeds_the_challenges_flow() {
    let mock = MockLlmClient::new().with_response(
        json!({
            "challenges": [
                {"title": "Task Master", "description": "Complete 5 tasks.", "xpBonus": 200},
            ],
        })
        .to_string(),
    );
    let app = test_app(mock);
    let session = create_session(&app).await;

    let response = send(&app, "GET", &format!("/api/sessions/{session}/summary"), None).await;
    let summary = json_body(response).await;

    let response = send(&app, "POST", "/api/challenges", Some(summary)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["challenges"][0]["title"], "Task Master");
}

#[tokio::test]
async fn reading_recommendations_round_trip() {
    let mock =
        MockLlmClient::new().with_response(json!({"recommendations": "Try Hyperion"}).to_string());
    let app = test_app(mock);

    let response = send(
        &app,
        "POST",
        "/api/recommendations/reading",
        Some(json!({"readingHistory": "Dune by Frank Herbert"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["recommendations"], "Try Hyperion");
}

#[tokio::test]
async fn wrong_method_is_rejected() {
    let app = test_app(MockLlmClient::new());

    let response = send(&app, "GET", "/api/insights/expenses", None).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn invalid_json_body_is_a_bad_request() {
    let app = test_app(MockLlmClient::new());

    let request = Request::builder()
        .method("POST")
        .uri("/api/insights/expenses")
        .header("content-type", "application/json")
        .body(Body::from("definitely not json"))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn concurrent_insight_requests_resolve_independently() {
    let mock = MockLlmClient::new().with_responses(vec![
        json!({"recommendations": "first"}).to_string(),
        json!({"recommendations": "second"}).to_string(),
        json!({"recommendations": "third"}).to_string(),
    ]);
    let app = test_app(mock);

    let mut handles = vec![];
    for i in 0..3 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            send(
                &app,
                "POST",
                "/api/recommendations/reading",
                Some(json!({"readingHistory": format!("History {i}")})),
            )
            .await
            .status()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }
}
