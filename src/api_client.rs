use crate::config::Config;
use crate::csrf::{CsrfToken, CSRF_HEADER};
use crate::errors::{AppError, ResultExt};
use crate::models::{
    BatchPredictionRequest, BatchPredictionResponse, HistoryQuery, PredictionRecord,
    PredictionRequest, PredictionResponse,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use url::Url;

pub const PREDICT_PATH: &str = "/api/predict/";
pub const BATCH_PREDICT_PATH: &str = "/api/batch_predict/";
pub const HISTORY_PATH: &str = "/api/history/";

/// Anything that can turn a prediction request into a prediction.
pub trait PredictionApi {
    fn predict(
        &self,
        request: &PredictionRequest,
    ) -> impl Future<Output = Result<PredictionResponse, AppError>> + Send;
}

/// JSON client for the prediction server.
///
/// Every request carries `Content-Type: application/json` and the
/// anti-forgery header. The token is whatever was last installed; it is
/// never re-read behind the caller's back.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    csrf_token: CsrfToken,
}

impl ApiClient {
    /// Creates a new `ApiClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Prediction server root, e.g. `http://localhost:8000`.
    /// * `csrf_token` - Anti-forgery token to send.
    /// * `timeout` - Per-request timeout.
    pub fn new(base_url: &str, csrf_token: CsrfToken, timeout: Duration) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            AppError::InternalError(format!("Invalid prediction API base URL '{}': {}", base_url, e))
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create prediction client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            csrf_token,
        })
    }

    /// Creates a client from configuration, seeding the token from the
    /// configured session cookies.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let token = config
            .session_cookies
            .as_deref()
            .map(|cookies| CsrfToken::from_cookie_header(cookies, &config.csrf_cookie_name))
            .unwrap_or_default();
        Self::new(&config.predict_api_base_url, token, config.request_timeout())
    }

    pub fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }

    /// Replaces the anti-forgery token used by subsequent requests.
    pub fn set_csrf_token(&mut self, token: CsrfToken) {
        tracing::info!("CSRF token replaced (present: {})", token.is_present());
        self.csrf_token = token;
    }

    fn resolve(&self, path: &str) -> Result<Url, AppError> {
        self.base_url.join(path).map_err(|e| {
            AppError::InternalError(format!("Failed to build URL for '{}': {}", path, e))
        })
    }

    /// Issues one JSON request and returns the parsed body.
    ///
    /// The payload becomes the body only for POST, PUT and PATCH. No shape
    /// checks happen here.
    ///
    /// # Returns
    ///
    /// * `Result<Value, AppError>` - The JSON body, or a `NetworkError`,
    ///   `HttpStatus` or `MalformedResponse` error. Failures are logged
    ///   before being returned.
    pub async fn issue_request(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<Value, AppError> {
        let url = self.resolve(path)?;
        self.send(method, url, payload).await
    }

    async fn send(&self, method: Method, url: Url, payload: Option<&Value>) -> Result<Value, AppError> {
        tracing::info!("{} {}", method, url);

        let carries_body = matches!(method, Method::POST | Method::PUT | Method::PATCH);
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(CSRF_HEADER, self.csrf_token.header_value());

        if carries_body {
            if let Some(body) = payload {
                request = request.body(serde_json::to_vec(body)?);
            }
        }

        let result = self.execute(request).await;
        if let Err(ref e) = result {
            tracing::error!("Request failed: {} {}: {}", method, url, e);
        }
        result
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<Value, AppError> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::NetworkError(e.to_string()))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::MalformedResponse(format!("Response is not JSON: {}", e)))
    }

    async fn typed<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        payload: Option<&Value>,
        what: &str,
    ) -> Result<T, AppError> {
        let value = self.send(method, url, payload).await?;
        serde_json::from_value(value).with_context(|| format!("Unexpected {} shape", what))
    }

    /// Requests a single prediction.
    pub async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, AppError> {
        let body = serde_json::to_value(request)?;
        let url = self.resolve(PREDICT_PATH)?;
        let response: PredictionResponse = self
            .typed(Method::POST, url, Some(&body), "prediction response")
            .await?;

        tracing::info!(
            "✓ Prediction received: {} ({}), confidence {:.4}",
            response.emergency_type,
            response.severity,
            response.confidence
        );
        Ok(response)
    }

    /// Requests predictions for several records in one call.
    pub async fn batch_predict(
        &self,
        request: &BatchPredictionRequest,
    ) -> Result<BatchPredictionResponse, AppError> {
        let body = serde_json::to_value(request)?;
        let url = self.resolve(BATCH_PREDICT_PATH)?;
        let response: BatchPredictionResponse = self
            .typed(Method::POST, url, Some(&body), "batch prediction response")
            .await?;

        tracing::info!("✓ Batch prediction received: {} results", response.predictions.len());
        Ok(response)
    }

    /// Fetches stored predictions, newest first.
    pub async fn history(&self, query: &HistoryQuery) -> Result<Vec<PredictionRecord>, AppError> {
        let mut url = self.resolve(HISTORY_PATH)?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
            if let Some(ref t) = query.emergency_type {
                pairs.append_pair("emergency_type", t.as_str());
            }
            if let Some(ref s) = query.severity {
                pairs.append_pair("severity", s.as_str());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        self.typed(Method::GET, url, None, "history response").await
    }
}

impl PredictionApi for ApiClient {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, AppError> {
        ApiClient::predict(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ApiClient::new(
            "https://example.com",
            CsrfToken::new("token"),
            Duration::from_secs(5),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let client = ApiClient::new("not a url", CsrfToken::absent(), Duration::from_secs(5));
        assert!(matches!(client, Err(AppError::InternalError(_))));
    }

    #[test]
    fn test_from_config_reads_cookie_once() {
        let mut config = Config::for_base_url("http://localhost:8000");
        config.session_cookies = Some("sessionid=s1; csrftoken=tok123".to_string());
        let client = ApiClient::from_config(&config).unwrap();
        assert_eq!(client.csrf_token().header_value(), "tok123");
    }

    #[test]
    fn test_set_csrf_token_replaces_value() {
        let mut client =
            ApiClient::new("http://localhost:8000", CsrfToken::absent(), Duration::from_secs(5))
                .unwrap();
        assert_eq!(client.csrf_token().header_value(), "");
        client.set_csrf_token(CsrfToken::new("fresh"));
        assert_eq!(client.csrf_token().header_value(), "fresh");
    }

    #[test]
    fn test_paths_resolve_against_base() {
        let client =
            ApiClient::new("http://localhost:8000", CsrfToken::absent(), Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            client.resolve(PREDICT_PATH).unwrap().as_str(),
            "http://localhost:8000/api/predict/"
        );
    }
}
