//! OpenAPI description of the dashboard service.

use crate::controller::{DashboardSnapshot, ResultPanel, SubmissionState, SubmitControl};
use crate::handlers;
use crate::models::{
    BatchPrediction, BatchPredictionRequest, BatchPredictionResponse, HistoryQuery,
    PredictionRecord, PredictionRequest, PredictionResponse,
};
use crate::notifications::{Notification, NotificationLevel};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Emergency Prediction Dashboard", description = "Prediction form, result panel and pass-through endpoints"),
    paths(
        handlers::health,
        handlers::submit_prediction,
        handlers::get_panel,
        handlers::dismiss_notification,
        handlers::refresh_csrf,
        handlers::batch_predict,
        handlers::prediction_history,
    ),
    components(schemas(
        PredictionRequest,
        PredictionResponse,
        BatchPrediction,
        BatchPredictionRequest,
        BatchPredictionResponse,
        HistoryQuery,
        PredictionRecord,
        DashboardSnapshot,
        SubmissionState,
        SubmitControl,
        ResultPanel,
        Notification,
        NotificationLevel,
    ))
)]
pub struct ApiDoc;

/// Swagger UI page pointing at the served OpenAPI document.
pub const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Emergency Prediction Dashboard - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.json",
                dom_id: '#swagger-ui',
                deepLinking: true
            });
        };
    </script>
</body>
</html>
"#;
