//! Integration tests for pulse-fb API endpoints
//!
//! Every test runs against an in-memory store. Most point the provider at
//! a closed loopback port, so derivations take the fallback path
//! deterministically; the partial-failure test serves a loopback
//! chat-completions stub instead. Nothing leaves the loopback interface.

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::post,
    Json, Router,
};
use http_body_util::BodyExt;
use serde_json::json;
use tower::util::ServiceExt;

use pulse_common::config::FeedbackLimits;
use pulse_common::events::EventBus;
use pulse_fb::config::ProviderConfig;
use pulse_fb::services::enrichment::{FALLBACK_ACTIONS, FALLBACK_RESPONSE, FALLBACK_SUMMARY};
use pulse_fb::services::EnrichmentClient;

/// Provider config pointing at a closed loopback port; every call fails
/// with connection refused immediately.
fn unreachable_provider() -> ProviderConfig {
    ProviderConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        api_key: "test-key".to_string(),
        model: "test-model".to_string(),
        timeout: Duration::from_secs(2),
    }
}

/// Test helper: create test app with in-memory database
async fn create_test_app() -> (axum::Router, sqlx::SqlitePool) {
    create_test_app_with_provider(&unreachable_provider()).await
}

/// Test helper: create test app against a specific provider endpoint
async fn create_test_app_with_provider(
    provider: &ProviderConfig,
) -> (axum::Router, sqlx::SqlitePool) {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    pulse_fb::db::init_tables(&pool)
        .await
        .expect("Failed to initialize database schema");

    let event_bus = EventBus::new(100);
    let enricher = EnrichmentClient::new(provider).expect("Failed to build enrichment client");

    let state =
        pulse_fb::AppState::new(pool.clone(), event_bus, enricher, FeedbackLimits::default());
    let app = pulse_fb::build_router(state);

    (app, pool)
}

/// Spawn a chat-completions stub that fails exactly one derivation
///
/// The three derivations carry distinct token budgets (1024 for the
/// response, 64 for the summary, 256 for the actions), so the stub keys on
/// `max_tokens`: the summary call gets a 500, the other two get canned
/// completions. Returns the base URL to point the provider config at.
async fn spawn_summary_failing_provider() -> String {
    let stub = Router::new().route(
        "/chat/completions",
        post(|Json(body): Json<serde_json::Value>| async move {
            match body["max_tokens"].as_u64() {
                Some(64) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": {"message": "stub outage"}})),
                ),
                Some(256) => (
                    StatusCode::OK,
                    Json(json!({
                        "choices": [{"message": {"content": "- Pass this along to the checkout team"}}]
                    })),
                ),
                _ => (
                    StatusCode::OK,
                    Json(json!({
                        "choices": [{"message": {"content": "Glad checkout worked well for you."}}]
                    })),
                ),
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub provider");
    let addr = listener.local_addr().expect("Failed to read stub address");
    tokio::spawn(async move {
        axum::serve(listener, stub).await.expect("Stub provider exited");
    });

    format!("http://{}", addr)
}

/// Test helper: POST /api/feedback and decode the JSON body
async fn post_feedback(
    app: axum::Router,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/feedback")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Test helper: GET any path and decode the JSON body
async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _pool) = create_test_app().await;

    let (status, json) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "pulse-fb");
    assert!(json["uptime_seconds"].is_number());
}

#[tokio::test]
async fn test_submit_feedback_persists_with_fallbacks() {
    let (app, _pool) = create_test_app().await;

    let (status, json) = post_feedback(
        app.clone(),
        json!({
            "rating": 4,
            "review": "Fast delivery, friendly support.",
            "name": "Dana",
            "category": "shipping"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["record"]["rating"], 4);
    assert_eq!(json["record"]["review"], "Fast delivery, friendly support.");
    assert_eq!(json["record"]["name"], "Dana");
    assert_eq!(json["record"]["email"], serde_json::Value::Null);
    assert!(json["record"]["id"].is_string());
    assert!(json["record"]["created_at"].is_string());

    // Provider is unreachable, so all three derivations surface fallbacks
    assert_eq!(json["record"]["ai_response"], FALLBACK_RESPONSE);
    assert_eq!(json["record"]["ai_summary"], FALLBACK_SUMMARY);
    assert_eq!(json["record"]["ai_actions"], FALLBACK_ACTIONS);
    assert_eq!(json["warnings"].as_array().unwrap().len(), 3);

    // The record is in the store despite the fallbacks
    let (status, listing) = get_json(app, "/api/feedback").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["records"][0]["id"], json["record"]["id"]);
}

#[tokio::test]
async fn test_single_failed_derivation_does_not_block_the_others() {
    let base_url = spawn_summary_failing_provider().await;
    let provider = ProviderConfig {
        base_url,
        api_key: "test-key".to_string(),
        model: "test-model".to_string(),
        timeout: Duration::from_secs(2),
    };
    let (app, _pool) = create_test_app_with_provider(&provider).await;

    let (status, json) = post_feedback(
        app.clone(),
        json!({"rating": 5, "review": "Checkout was effortless."}),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);

    // Only the summary fell back; the other two carry derived text
    assert_eq!(json["record"]["ai_summary"], FALLBACK_SUMMARY);
    assert_eq!(
        json["record"]["ai_response"],
        "Glad checkout worked well for you."
    );
    assert_eq!(
        json["record"]["ai_actions"],
        "- Pass this along to the checkout team"
    );

    let warnings = json["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["derivation"], "SUMMARY");

    // The partially derived record still persisted
    let (status, listing) = get_json(app, "/api/feedback").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["records"][0]["ai_summary"], FALLBACK_SUMMARY);
    assert_eq!(
        listing["records"][0]["ai_response"],
        "Glad checkout worked well for you."
    );
}

#[tokio::test]
async fn test_submit_invalid_rating_rejected() {
    let (app, pool) = create_test_app().await;

    let (status, json) = post_feedback(
        app,
        json!({
            "rating": 6,
            "review": "Brilliant."
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("between 1 and 5"));

    // Nothing was written
    let count = pulse_fb::db::feedback::count_feedback(&pool).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_submit_blank_review_rejected() {
    let (app, pool) = create_test_app().await;

    let (status, json) = post_feedback(
        app,
        json!({
            "rating": 3,
            "review": "   \n\t  "
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VALIDATION_FAILED");

    let count = pulse_fb::db::feedback::count_feedback(&pool).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_submit_fractional_rating_rejected_at_json_boundary() {
    let (app, _pool) = create_test_app().await;

    let (status, _json) = post_feedback(
        app,
        json!({
            "rating": 4.5,
            "review": "Pretty good."
        }),
    )
    .await;

    // Serde refuses a float where an integer is expected
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_dashboard_summary_empty_store() {
    let (app, _pool) = create_test_app().await;

    let (status, json) = get_json(app, "/api/dashboard/summary").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 0);
    assert_eq!(json["mean_rating"], 0.0);
    assert_eq!(json["positive_rate"], 0.0);
    assert_eq!(json["negative_count"], 0);

    // Histogram always carries all five buckets
    let histogram = json["rating_histogram"].as_object().unwrap();
    assert_eq!(histogram.len(), 5);
    for rating in 1..=5 {
        assert_eq!(histogram[&rating.to_string()], 0);
    }

    assert!(json["daily_series"].as_object().unwrap().is_empty());
    assert!(json["category_breakdown"].as_object().unwrap().is_empty());
    assert_eq!(json["unique_users"], 0);
}

#[tokio::test]
async fn test_dashboard_summary_aggregates() {
    let (app, _pool) = create_test_app().await;

    let submissions = [
        (5, "support", Some("ada@example.com")),
        (5, "shipping", Some("brin@example.com")),
        (4, "support", Some("ada@example.com")),
        (2, "shipping", None),
    ];
    for (rating, category, email) in submissions {
        let (status, _) = post_feedback(
            app.clone(),
            json!({
                "rating": rating,
                "review": format!("A {} star experience.", rating),
                "category": category,
                "email": email
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, json) = get_json(app, "/api/dashboard/summary").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 4);
    assert_eq!(json["mean_rating"], 4.0);
    assert_eq!(json["positive_rate"], 0.75);
    assert_eq!(json["negative_count"], 1);
    assert_eq!(json["rating_histogram"]["5"], 2);
    assert_eq!(json["rating_histogram"]["4"], 1);
    assert_eq!(json["rating_histogram"]["2"], 1);
    assert_eq!(json["rating_histogram"]["1"], 0);
    assert_eq!(json["category_breakdown"]["support"], 2);
    assert_eq!(json["category_breakdown"]["shipping"], 2);

    // Two submissions share an email, one is anonymous
    assert_eq!(json["unique_users"], 2);

    // Everything submitted today lands in a single UTC bucket
    let series = json["daily_series"].as_object().unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series.values().next().unwrap(), 4);
}

#[tokio::test]
async fn test_list_feedback_filter_and_sort() {
    let (app, _pool) = create_test_app().await;

    let submissions = [
        (2, "review A"),
        (5, "review B"),
        (4, "review C"),
        (5, "review D"),
        (1, "review E"),
    ];
    for (rating, review) in submissions {
        let (status, _) = post_feedback(app.clone(), json!({"rating": rating, "review": review})).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, json) = get_json(app, "/api/feedback?ratings=4,5&sort=highest_rating").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 3);
    let reviews: Vec<&str> = json["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["review"].as_str().unwrap())
        .collect();
    // Equal ratings fall back to submission order
    assert_eq!(reviews, vec!["review B", "review D", "review C"]);
}

#[tokio::test]
async fn test_list_feedback_rejects_bad_query() {
    let (app, _pool) = create_test_app().await;

    let (status, json) = get_json(app.clone(), "/api/feedback?ratings=9").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");

    let (status, json) = get_json(app, "/api/feedback?sort=sideways").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_storage_outage_is_503_not_empty() {
    let (app, pool) = create_test_app().await;
    pool.close().await;

    let (status, json) = get_json(app.clone(), "/api/feedback").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "STORAGE_UNAVAILABLE");

    // The aggregation endpoints fail the same way, never as empty data
    let (status, json) = get_json(app.clone(), "/api/dashboard/summary").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "STORAGE_UNAVAILABLE");

    let (status, json) = get_json(app.clone(), "/api/export/csv").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "STORAGE_UNAVAILABLE");

    let (status, json) = post_feedback(
        app.clone(),
        json!({"rating": 5, "review": "Lovely."}),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "STORAGE_UNAVAILABLE");

    // The failed append shows up in the health report
    let (status, json) = get_json(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "error");
    assert!(json["last_error"].is_string());
}

#[tokio::test]
async fn test_insights_requires_feedback() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/dashboard/insights")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_insights_surfaces_provider_failure() {
    let (app, _pool) = create_test_app().await;

    let (status, _) = post_feedback(
        app.clone(),
        json!({"rating": 3, "review": "Average visit."}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/dashboard/insights")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Unlike submissions, insights have no fallback text
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"]["code"], "PROVIDER_ERROR");
}

#[tokio::test]
async fn test_export_csv() {
    let (app, _pool) = create_test_app().await;

    let (status, _) = post_feedback(
        app.clone(),
        json!({"rating": 5, "review": "Great coffee, nice staff."}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/export/csv")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    assert!(response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("feedback.csv"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.starts_with("id,created_at,rating,review"));
    assert!(body.contains("\"Great coffee, nice staff.\""));
}

#[tokio::test]
async fn test_sse_endpoint_connection() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/events")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/event-stream"
    );
}

#[tokio::test]
async fn test_ui_pages_render() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
