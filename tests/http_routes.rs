/// HTTP surface of the dashboard service
/// Drives the router in-process against a mocked prediction server
use axum::body::Body;
use axum::extract::{Form, State};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use emergency_dashboard::api_client::ApiClient;
use emergency_dashboard::config::Config;
use emergency_dashboard::controller::SubmissionState;
use emergency_dashboard::csrf::CsrfToken;
use emergency_dashboard::handlers::{self, AppState};
use emergency_dashboard::notifications::NotificationLevel;
use emergency_dashboard::routes::router;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLIENT_IP: &str = "10.1.2.3";

fn form_pairs() -> Vec<(&'static str, &'static str)> {
    vec![
        ("temperature", "33"),
        ("humidity", "25"),
        ("air_quality", "140"),
        ("wind_speed", "18"),
        ("precipitation", "0"),
        ("population_density", "1800"),
        ("building_density", "0.7"),
        ("hour_of_day", "13"),
        ("day_of_week", "2"),
        ("is_holiday", "false"),
        ("latitude", ""),
        ("longitude", ""),
        ("location_name", "Old Town"),
    ]
}

fn form_map() -> HashMap<String, String> {
    form_pairs()
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn prediction_body() -> serde_json::Value {
    serde_json::json!({
        "emergency_type": "fire",
        "severity": "high",
        "confidence": 0.8,
        "probabilities": {"fire": 0.8, "none": 0.2},
        "prediction_id": 11,
        "timestamp": "2024-08-01T13:00:00Z",
        "recommendations": ["Evacuate the area immediately"]
    })
}

fn state_for(server: &MockServer, config: &Config) -> Arc<AppState> {
    let client =
        ApiClient::new(&server.uri(), CsrfToken::new("start-tok"), Duration::from_secs(5)).unwrap();
    Arc::new(AppState::new(config.clone(), client))
}

fn app_for(server: &MockServer) -> (Router, Arc<AppState>) {
    let config = Config::for_base_url(server.uri());
    let state = state_for(server, &config);
    (router(state.clone(), &config).unwrap(), state)
}

fn predict_request() -> Request<Body> {
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(form_pairs())
        .finish();
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("x-forwarded-for", CLIENT_IP)
        .body(Body::from(encoded))
        .unwrap()
}

fn get(uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-forwarded-for", CLIENT_IP)
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_concurrent_submit_is_refused() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/predict/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(prediction_body())
                .set_delay(Duration::from_millis(400)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (app, _state) = app_for(&mock_server);

    let first = tokio::spawn(app.clone().oneshot(predict_request()));
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = app.clone().oneshot(predict_request()).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let first = first.await.unwrap().unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let snapshot = json_body(first).await;
    assert_eq!(snapshot["state"], "displayed");
    assert_eq!(snapshot["submit_control"]["disabled"], false);
}

#[tokio::test]
async fn test_disabled_dashboard_has_no_form_routes() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/predict/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction_body()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = Config::for_base_url(mock_server.uri());
    config.dashboard_enabled = false;
    let app = router(state_for(&mock_server, &config), &config).unwrap();

    let response = app.clone().oneshot(predict_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(get("/panel").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_panel_etag_and_not_modified() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/predict/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction_body()))
        .mount(&mock_server)
        .await;

    let (app, _state) = app_for(&mock_server);

    let empty = app
        .clone()
        .oneshot(get("/panel").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::OK);
    assert!(empty.headers().get(header::ETAG).is_none());

    let submitted = app.clone().oneshot(predict_request()).await.unwrap();
    assert_eq!(submitted.status(), StatusCode::OK);

    let panel = app
        .clone()
        .oneshot(get("/panel").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(panel.status(), StatusCode::OK);
    let etag = panel
        .headers()
        .get(header::ETAG)
        .cloned()
        .expect("panel should carry an ETag once a result is shown");
    let snapshot = json_body(panel).await;
    let fingerprint = snapshot["result_panel"]["fingerprint"].as_str().unwrap();
    assert_eq!(etag.to_str().unwrap(), format!("\"{}\"", fingerprint));

    let unchanged = app
        .clone()
        .oneshot(
            get("/panel")
                .header(header::IF_NONE_MATCH, etag.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(unchanged.status(), StatusCode::NOT_MODIFIED);

    let stale = app
        .oneshot(
            get("/panel")
                .header(header::IF_NONE_MATCH, "\"something-else\"")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(stale.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_csrf_refresh_reaches_both_clients() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/predict/"))
        .and(header_eq("x-csrftoken", "fresh-tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction_body()))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/batch_predict/"))
        .and(header_eq("x-csrftoken", "fresh-tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "predictions": [
                {"emergency_type": "fire", "severity": "high", "confidence": 0.8, "location": "Old Town"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (app, state) = app_for(&mock_server);

    let refreshed = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/session/csrf")
                .header("x-forwarded-for", CLIENT_IP)
                .header(header::COOKIE, "sessionid=abc; csrftoken=fresh-tok")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(refreshed.status(), StatusCode::OK);
    assert_eq!(json_body(refreshed).await["csrf_token_present"], true);

    let expected = CsrfToken::new("fresh-tok");
    assert_eq!(state.controller.lock().await.api().csrf_token(), &expected);
    assert_eq!(state.client.read().await.csrf_token(), &expected);

    let submitted = app.clone().oneshot(predict_request()).await.unwrap();
    assert_eq!(json_body(submitted).await["state"], "displayed");

    let batch_body = serde_json::json!({
        "records": [{
            "temperature": 33.0,
            "humidity": 25.0,
            "air_quality": 140.0,
            "wind_speed": 18.0,
            "precipitation": 0.0,
            "population_density": 1800.0,
            "building_density": 0.7,
            "hour_of_day": 13,
            "day_of_week": 2,
            "is_holiday": false,
            "location_name": "Old Town"
        }]
    });
    let batch = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/batch")
                .header("x-forwarded-for", CLIENT_IP)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(batch_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(batch.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_dismiss_notification_then_not_found() {
    let mock_server = MockServer::start().await;
    let (app, state) = app_for(&mock_server);

    let id = state
        .notifications
        .show("Model reloaded", NotificationLevel::Info)
        .await;
    let uri = format!("/notifications/{}", id);
    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri(uri.as_str())
            .header("x-forwarded-for", CLIENT_IP)
            .body(Body::empty())
            .unwrap()
    };

    let first = app.clone().oneshot(delete()).await.unwrap();
    assert_eq!(first.status(), StatusCode::NO_CONTENT);
    assert!(state.notifications.active().await.is_empty());

    let second = app.oneshot(delete()).await.unwrap();
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_completes_after_caller_goes_away() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/predict/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(prediction_body())
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config::for_base_url(mock_server.uri());
    let state = state_for(&mock_server, &config);

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        handlers::submit_prediction(State(state.clone()), Form(form_map())),
    )
    .await;
    assert!(abandoned.is_err(), "handler should still be waiting on upstream");

    tokio::time::sleep(Duration::from_millis(600)).await;

    let controller = state.controller.lock().await;
    assert_eq!(controller.state(), SubmissionState::Displayed);
    assert!(!controller.submit_control().disabled);
    assert!(controller.result_panel().html.is_some());
    assert_eq!(controller.result_panel().scroll_requests, 1);
}
