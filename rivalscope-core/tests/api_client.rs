//! Integration tests for `ApiClient` using wiremock HTTP mocks.

use rivalscope_core::{ApiClient, Error, SignalDetectRequest, SignalType, UpdateCompanyRequest};
use wiremock::matchers::{body_partial_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> ApiClient {
    ApiClient::with_base_url(base_url, 30).expect("client construction should not fail")
}

#[tokio::test]
async fn list_companies_returns_parsed_watchlist() {
    let server = MockServer::start().await;

    let body = serde_json::json!([
        {
            "id": "co-1",
            "name": "Acme Analytics",
            "domains": ["acme.io"],
            "include_paths": ["/pricing", "/release-notes"],
            "tags": ["direct"],
            "created_at": "2025-05-01T09:00:00Z",
            "last_run_at": "2025-06-01T09:00:00Z"
        },
        {
            "id": "co-2",
            "name": "Borealis",
            "domains": ["borealis.dev"],
            "created_at": "2025-05-02T09:00:00Z"
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/vendors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let companies = client
        .list_companies()
        .await
        .expect("should parse watchlist");

    assert_eq!(companies.len(), 2);
    assert_eq!(companies[0].id, "co-1");
    assert_eq!(companies[0].name, "Acme Analytics");
    assert_eq!(companies[0].include_paths, vec!["/pricing", "/release-notes"]);
    // Optional fields default cleanly
    assert!(companies[1].include_paths.is_empty());
    assert!(companies[1].last_run_at.is_none());
}

#[tokio::test]
async fn missing_company_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vendors/co-9"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such vendor"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let company = client
        .get_company("co-9")
        .await
        .expect("404 should not be an error");

    assert!(company.is_none());
}

#[tokio::test]
async fn update_company_puts_changed_fields() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "id": "co-1",
        "name": "Acme Analytics",
        "domains": ["acme.io", "acme.dev"],
        "include_paths": ["/pricing"],
        "tags": ["direct", "enterprise"],
        "created_at": "2025-05-01T09:00:00Z"
    });

    Mock::given(method("PUT"))
        .and(path("/vendors/co-1"))
        .and(body_partial_json(serde_json::json!({
            "name": "Acme Analytics",
            "domains": ["acme.io", "acme.dev"],
            "tags": ["direct", "enterprise"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let request = UpdateCompanyRequest {
        name: "Acme Analytics".to_string(),
        domains: vec!["acme.io".to_string(), "acme.dev".to_string()],
        include_paths: vec!["/pricing".to_string()],
        tags: vec!["direct".to_string(), "enterprise".to_string()],
    };
    let updated = client
        .update_company("co-1", &request)
        .await
        .expect("update should succeed");

    assert_eq!(updated.domains, vec!["acme.io", "acme.dev"]);
    assert_eq!(updated.tags, vec!["direct", "enterprise"]);
}

#[tokio::test]
async fn list_signals_sends_company_filter() {
    let server = MockServer::start().await;

    let body = serde_json::json!([
        {
            "id": "sig-1",
            "company_id": "co-1",
            "type": "pricing_change",
            "severity": "high",
            "title": "Enterprise tier went from $499 to $599",
            "url": "https://acme.io/pricing",
            "confidence": 0.9,
            "detected_at": "2025-06-02T08:00:00Z"
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/signals"))
        .and(query_param("company_id", "co-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let signals = client
        .list_signals(Some("co-1"))
        .await
        .expect("should parse signals");

    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].signal_type, SignalType::PricingChange);
    assert_eq!(signals[0].company_id, "co-1");
}

#[tokio::test]
async fn detect_signals_posts_request_and_parses_response() {
    let server = MockServer::start().await;

    let body = serde_json::json!([
        {
            "id": "sig-9",
            "company_id": "co-1",
            "type": "security_update",
            "severity": "medium",
            "title": "New SOC 2 report published",
            "detected_at": "2025-06-02T10:00:00Z",
            "citations": ["https://acme.io/security"]
        }
    ]);

    Mock::given(method("POST"))
        .and(path("/signals/detect"))
        .and(body_partial_json(serde_json::json!({
            "company_id": "co-1",
            "use_livecrawl": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let request = SignalDetectRequest::for_company("co-1", &[]);
    let signals = client
        .detect_signals(&request)
        .await
        .expect("should parse detected signals");

    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].citations, vec!["https://acme.io/security"]);
}

#[tokio::test]
async fn run_watchlist_unwraps_results_envelope() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "results": [
            {
                "company": "Acme Analytics",
                "paths_checked": 4,
                "urls_found": 11,
                "signals_created": 2,
                "answer_content": "Two pricing changes detected.",
                "citations": ["https://acme.io/pricing"]
            },
            {
                "company": "Borealis",
                "paths_checked": 4,
                "urls_found": 0,
                "signals_created": 0
            }
        ]
    });

    Mock::given(method("POST"))
        .and(path("/run/watchlist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let results = client
        .run_watchlist(None)
        .await
        .expect("should parse run results");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].signals_created, 2);
    assert_eq!(results[1].company, "Borealis");
    assert!(results[1].answer_content.is_none());
}

#[tokio::test]
async fn missing_tearsheet_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tearsheet/co-9"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not generated yet"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let sheet = client
        .get_tearsheet("co-9")
        .await
        .expect("404 should not be an error");

    assert!(sheet.is_none());
}

#[tokio::test]
async fn backend_error_carries_status_and_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vendors"))
        .respond_with(ResponseTemplate::new(500).set_body_string("detector crashed"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.list_companies().await.unwrap_err();

    match &err {
        Error::Api { status, message } => {
            assert_eq!(*status, 500);
            assert!(message.contains("detector crashed"));
        }
        other => panic!("expected Api error, got: {other}"),
    }
    assert_eq!(err.api_status(), Some(500));
}

#[tokio::test]
async fn malformed_body_is_a_json_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vendors"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{definitely not json"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.list_companies().await.unwrap_err();
    assert!(matches!(err, Error::Json(_)), "got: {err}");
}

#[tokio::test]
async fn mute_signal_posts_to_signal_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/signals/sig-1/mute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "muted"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    client.mute_signal("sig-1").await.expect("mute should succeed");
}

#[tokio::test]
async fn follow_up_posts_task_description() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/signals/sig-1/follow-up"))
        .and(body_partial_json(serde_json::json!({
            "task_description": "Check their new enterprise tier"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "created"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    client
        .create_follow_up("sig-1", "Check their new enterprise tier")
        .await
        .expect("follow-up should succeed");
}

#[tokio::test]
async fn weekly_report_posts_trailing_period() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/reports/weekly"))
        .and(body_string_contains("period_start"))
        .and(body_string_contains("period_end"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "rep-1",
            "period_start": "2025-06-02T00:00:00Z",
            "period_end": "2025-06-09T00:00:00Z",
            "contents_md": "# Weekly Competitive Intelligence Report\n",
            "url_list": ["https://acme.io/pricing"],
            "created_at": "2025-06-09T00:05:00Z"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let report = client
        .generate_weekly_report()
        .await
        .expect("report generation should succeed");

    assert_eq!(report.id, "rep-1");
    assert_eq!(report.url_list, vec!["https://acme.io/pricing"]);
}

#[tokio::test]
async fn health_check_reports_backend_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/healthz"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    assert!(client.health_check().await.unwrap());

    // An unreachable backend is unhealthy, not an error
    let dead = ApiClient::with_base_url("http://127.0.0.1:1", 1).unwrap();
    assert!(!dead.health_check().await.unwrap());
}

#[tokio::test]
async fn settings_round_trip() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "schedule": { "enabled": true, "frequency": "weekly", "day": "friday", "time": "08:30" },
        "api_keys": { "exa_api_key": "exa-xxx" },
        "retention": { "signals_days": 30, "reports_days": 180, "snapshots_days": 7 },
        "signals_cache_duration_seconds": 900
    });

    Mock::given(method("GET"))
        .and(path("/settings/configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let settings = client.get_settings().await.expect("should parse settings");

    assert!(settings.schedule.enabled);
    assert_eq!(settings.schedule.day, "friday");
    assert_eq!(settings.signals_cache_duration_seconds, 900);
    assert_eq!(settings.retention.signals_days, 30);
}
