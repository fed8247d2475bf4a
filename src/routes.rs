//! Route table and middleware stack of the dashboard service.

use crate::config::Config;
use crate::handlers::{self, AppState};
use crate::openapi::{ApiDoc, SWAGGER_UI_HTML};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::OpenApi;

/// Serves the generated OpenAPI document.
async fn serve_openapi_spec() -> impl IntoResponse {
    (StatusCode::OK, Json(ApiDoc::openapi()))
}

/// Serves the Swagger UI HTML page.
async fn serve_swagger_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

/// Builds the service router.
///
/// `/predict` and `/panel` are only mounted when the dashboard is enabled.
/// Everything except `/health` sits behind the body limit and the per-IP
/// rate limiter, which keys on `X-Forwarded-For` before the peer address.
pub fn router(state: Arc<AppState>, config: &Config) -> anyhow::Result<Router> {
    // Rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let mut protected_routes = Router::new()
        .route("/docs", get(serve_swagger_ui))
        .route("/api-docs/openapi.json", get(serve_openapi_spec))
        .route("/notifications/:id", delete(handlers::dismiss_notification))
        .route("/session/csrf", post(handlers::refresh_csrf))
        .route("/batch", post(handlers::batch_predict))
        .route("/history", get(handlers::prediction_history));

    if config.dashboard_enabled {
        protected_routes = protected_routes
            .route("/predict", post(handlers::submit_prediction))
            .route("/panel", get(handlers::get_panel));
    } else {
        tracing::warn!("Dashboard disabled; prediction form routes not mounted");
    }

    let protected_routes = protected_routes.layer(
        ServiceBuilder::new()
            // Request size limit: 1MB max payload
            .layer(RequestBodyLimitLayer::new(1024 * 1024))
            .layer(GovernorLayer {
                config: governor_conf,
            }),
    );

    // Health check bypasses rate limiting
    Ok(Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()))
}
