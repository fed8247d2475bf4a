use emergency_dashboard::api_client::ApiClient;
use emergency_dashboard::config::Config;
use emergency_dashboard::handlers::AppState;
use emergency_dashboard::routes;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the dashboard service.
///
/// Initializes logging, loads configuration, builds the prediction client
/// with the start-up anti-forgery token, and starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emergency_dashboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let client = ApiClient::from_config(&config)?;
    tracing::info!(
        "✓ Prediction client initialized: {} (CSRF token present: {})",
        config.predict_api_base_url,
        client.csrf_token().is_present()
    );

    let app_state = Arc::new(AppState::new(config.clone(), client));
    let app = routes::router(app_state, &config)?;

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
