//! Submits the prediction form once from the command line and prints the
//! rendered result card.
//!
//! Usage: `predict_once temperature=31 humidity=40 ... is_holiday=false`

use emergency_dashboard::api_client::ApiClient;
use emergency_dashboard::config::Config;
use emergency_dashboard::controller::{PredictionController, SubmissionState};
use emergency_dashboard::form::FORM_FIELDS;
use emergency_dashboard::notifications::NotificationCenter;
use std::collections::BTreeMap;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the one-shot prediction utility.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emergency_dashboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut fields = BTreeMap::new();
    for arg in env::args().skip(1) {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Expected field=value, got '{}'", arg))?;
        if !FORM_FIELDS.contains(&key) {
            anyhow::bail!("Unknown form field '{}'", key);
        }
        fields.insert(key.to_string(), value.to_string());
    }

    let config = Config::from_env()?;
    let client = ApiClient::from_config(&config)?;
    let mut controller =
        PredictionController::new(client, NotificationCenter::new(config.notification_ttl()));

    match controller.submit(&fields).await {
        SubmissionState::Displayed => {
            if let Some(html) = controller.result_panel().html.as_deref() {
                println!("{}", html);
            }
            Ok(())
        }
        state => {
            for notification in controller.notifications().active().await {
                eprintln!("[{}] {}", notification.level.as_str(), notification.message);
            }
            anyhow::bail!("Prediction did not complete (state: {:?})", state)
        }
    }
}
