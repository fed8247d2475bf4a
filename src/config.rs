use serde::Deserialize;
use std::time::Duration;

/// Default cookie carrying the anti-forgery token.
pub const DEFAULT_CSRF_COOKIE: &str = "csrftoken";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub predict_api_base_url: String,
    pub csrf_cookie_name: String,
    /// Cookie header read once at start-up to seed the anti-forgery token.
    pub session_cookies: Option<String>,
    pub request_timeout_secs: u64,
    pub notification_ttl_secs: u64,
    /// When false the submit route is never mounted.
    pub dashboard_enabled: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            predict_api_base_url: std::env::var("PREDICT_API_BASE_URL")
                .map_err(|_| anyhow::anyhow!("PREDICT_API_BASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("PREDICT_API_BASE_URL cannot be empty");
                    }
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("PREDICT_API_BASE_URL must start with http:// or https://");
                    }
                    Ok(url)
                })?,
            csrf_cookie_name: std::env::var("CSRF_COOKIE_NAME")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CSRF_COOKIE.to_string()),
            session_cookies: std::env::var("SESSION_COOKIES")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("REQUEST_TIMEOUT_SECS must be a whole number"))
                .and_then(|secs: u64| {
                    if secs == 0 {
                        anyhow::bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
                    }
                    Ok(secs)
                })?,
            notification_ttl_secs: std::env::var("NOTIFICATION_TTL_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("NOTIFICATION_TTL_SECS must be a whole number"))?,
            dashboard_enabled: std::env::var("DASHBOARD_ENABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        };

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Prediction API base URL: {}", config.predict_api_base_url);
        tracing::debug!("CSRF cookie name: {}", config.csrf_cookie_name);
        if config.session_cookies.is_none() {
            tracing::warn!("SESSION_COOKIES not set; requests will carry an empty CSRF token");
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Builds a configuration for a given prediction server with defaults
    /// for everything else.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            port: 3000,
            predict_api_base_url: base_url.into(),
            csrf_cookie_name: DEFAULT_CSRF_COOKIE.to_string(),
            session_cookies: None,
            request_timeout_secs: 30,
            notification_ttl_secs: 5,
            dashboard_enabled: true,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_ttl_secs)
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(parse_flag(""));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(" OFF "));
        assert!(!parse_flag("0"));
    }

    #[test]
    fn test_for_base_url_defaults() {
        let config = Config::for_base_url("http://localhost:8000");
        assert_eq!(config.csrf_cookie_name, "csrftoken");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.notification_ttl(), Duration::from_secs(5));
        assert!(config.dashboard_enabled);
    }
}
