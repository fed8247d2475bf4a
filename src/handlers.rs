use crate::api_client::ApiClient;
use crate::config::Config;
use crate::controller::{DashboardSnapshot, PredictionController};
use crate::csrf::CsrfToken;
use crate::errors::{AppError, ResultExt};
use crate::models::{BatchPredictionRequest, BatchPredictionResponse, HistoryQuery, PredictionRecord};
use crate::notifications::NotificationCenter;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// The single prediction form controller; one submission at a time.
    pub controller: Arc<Mutex<PredictionController<ApiClient>>>,
    /// Client for the pass-through batch and history endpoints.
    pub client: RwLock<ApiClient>,
    /// Same notification store the controller writes to.
    pub notifications: NotificationCenter,
}

impl AppState {
    pub fn new(config: Config, client: ApiClient) -> Self {
        let notifications = NotificationCenter::new(config.notification_ttl());
        let controller = PredictionController::new(client.clone(), notifications.clone());
        Self {
            config,
            controller: Arc::new(Mutex::new(controller)),
            client: RwLock::new(client),
            notifications,
        }
    }
}

/// Health check endpoint.
#[utoipa::path(get, path = "/health", responses((status = 200, description = "Service is healthy")))]
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "emergency-dashboard",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /predict
///
/// Submits the prediction form. A failed prediction still answers 200: the
/// snapshot's state is `failed` and it carries the error notification.
/// While another submission is in flight the request is refused with 409
/// rather than queued. The cycle runs on its own task and completes even
/// if the caller disconnects.
#[utoipa::path(
    post,
    path = "/predict",
    request_body(content = crate::models::PredictionRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Submit cycle finished", body = DashboardSnapshot),
        (status = 409, description = "A submission is already in flight")
    )
)]
pub async fn submit_prediction(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Json<DashboardSnapshot>, AppError> {
    let mut controller = state.controller.clone().try_lock_owned().map_err(|_| {
        AppError::Conflict("A prediction is already in progress".to_string())
    })?;

    tracing::info!("POST /predict - {} fields", fields.len());
    let cycle = tokio::spawn(async move {
        let outcome = controller.submit(&fields).await;
        tracing::info!("Submit cycle finished: {:?}", outcome);
        controller.snapshot().await
    });

    let snapshot = cycle
        .await
        .map_err(|e| AppError::InternalError(format!("Submit task failed: {}", e)))?;
    Ok(Json(snapshot))
}

/// GET /panel
///
/// Current dashboard state. The `ETag` is the panel fingerprint, and a
/// matching `If-None-Match` yields 304.
#[utoipa::path(
    get,
    path = "/panel",
    responses(
        (status = 200, description = "Current dashboard state", body = DashboardSnapshot),
        (status = 304, description = "Panel unchanged")
    )
)]
pub async fn get_panel(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let snapshot = state.controller.lock().await.snapshot().await;

    let etag = snapshot
        .result_panel
        .fingerprint
        .as_ref()
        .map(|fp| format!("\"{}\"", fp));

    if let Some(ref tag) = etag {
        let unchanged = headers
            .get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
            .map(|v| v == tag)
            .unwrap_or(false);
        if unchanged {
            return StatusCode::NOT_MODIFIED.into_response();
        }
    }

    let mut response = Json(snapshot).into_response();
    if let Some(value) = etag.and_then(|t| HeaderValue::from_str(&t).ok()) {
        response.headers_mut().insert(header::ETAG, value);
    }
    response
}

/// DELETE /notifications/:id
#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Dismissed"),
        (status = 404, description = "No such notification")
    )
)]
pub async fn dismiss_notification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.notifications.dismiss(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Notification {} not found", id)))
    }
}

/// POST /session/csrf
///
/// Re-reads the anti-forgery token from this request's `Cookie` header and
/// installs it for all later upstream calls. Waits for an in-flight
/// submission to finish first.
#[utoipa::path(
    post,
    path = "/session/csrf",
    responses((status = 200, description = "Token installed"))
)]
pub async fn refresh_csrf(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let cookies = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = CsrfToken::from_cookie_header(cookies, &state.config.csrf_cookie_name);
    let present = token.is_present();

    state
        .controller
        .lock()
        .await
        .api_mut()
        .set_csrf_token(token.clone());
    state.client.write().await.set_csrf_token(token);

    Json(json!({ "csrf_token_present": present }))
}

/// POST /batch
#[utoipa::path(
    post,
    path = "/batch",
    request_body = BatchPredictionRequest,
    responses((status = 200, description = "Batch predictions", body = BatchPredictionResponse))
)]
pub async fn batch_predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchPredictionRequest>,
) -> Result<Json<BatchPredictionResponse>, AppError> {
    tracing::info!("POST /batch - {} records", request.records.len());
    let client = state.client.read().await.clone();
    let response = client
        .batch_predict(&request)
        .await
        .context("Batch prediction failed")?;
    Ok(Json(response))
}

/// GET /history
#[utoipa::path(
    get,
    path = "/history",
    responses((status = 200, description = "Stored predictions, newest first", body = [PredictionRecord]))
)]
pub async fn prediction_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<PredictionRecord>>, AppError> {
    tracing::info!("GET /history - {:?}", query);
    let client = state.client.read().await.clone();
    let records = client
        .history(&query)
        .await
        .context("History lookup failed")?;
    Ok(Json(records))
}
