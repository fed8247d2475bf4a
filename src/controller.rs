//! Prediction form controller.
//!
//! One submit cycle: type the form, call the prediction API, render the
//! result into the panel or raise an error notification. The submit control
//! is held busy for the whole cycle and released on every exit path by
//! [`BusyGuard`].

use crate::api_client::PredictionApi;
use crate::display::format_date;
use crate::errors::AppError;
use crate::form::{build_prediction_request, FormFields};
use crate::notifications::{Notification, NotificationCenter, NotificationLevel};
use crate::view::{fingerprint_html, render_html, ResultView};
use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_SUBMIT_LABEL: &str = "Predict Emergency";
pub const BUSY_LABEL: &str = "Predicting...";
pub const PREDICTION_ERROR_MESSAGE: &str = "Error making prediction. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Submitting,
    Displayed,
    Failed,
}

/// The form's submit button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SubmitControl {
    pub label: String,
    pub disabled: bool,
}

impl SubmitControl {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            disabled: false,
        }
    }

    /// Disables the control and shows `busy_label` until the guard drops.
    pub fn acquire(&mut self, busy_label: &str) -> BusyGuard<'_> {
        let original_label = std::mem::replace(&mut self.label, busy_label.to_string());
        self.disabled = true;
        BusyGuard {
            control: self,
            original_label,
        }
    }
}

/// Restores the submit control when dropped.
pub struct BusyGuard<'a> {
    control: &'a mut SubmitControl,
    original_label: String,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.control.label = std::mem::take(&mut self.original_label);
        self.control.disabled = false;
    }
}

/// Where the result card is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResultPanel {
    pub html: Option<String>,
    pub visible: bool,
    /// SHA-256 of `html`, hex encoded.
    pub fingerprint: Option<String>,
    /// Times the page was asked to scroll the panel into view.
    pub scroll_requests: u32,
}

impl ResultPanel {
    /// Replaces the whole panel content and asks for one scroll.
    fn replace(&mut self, html: String) {
        self.fingerprint = Some(fingerprint_html(&html));
        self.html = Some(html);
        self.visible = true;
        self.scroll_requests += 1;
    }
}

/// Serializable view of everything the controller owns.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardSnapshot {
    pub state: SubmissionState,
    pub submit_control: SubmitControl,
    pub result_panel: ResultPanel,
    pub notifications: Vec<Notification>,
}

pub struct PredictionController<A> {
    api: A,
    state: SubmissionState,
    control: SubmitControl,
    panel: ResultPanel,
    notifications: NotificationCenter,
    last_view: Option<ResultView>,
    time_format: fn(&str) -> String,
}

impl<A: PredictionApi> PredictionController<A> {
    pub fn new(api: A, notifications: NotificationCenter) -> Self {
        Self {
            api,
            state: SubmissionState::Idle,
            control: SubmitControl::new(DEFAULT_SUBMIT_LABEL),
            panel: ResultPanel::default(),
            notifications,
            last_view: None,
            time_format: format_date,
        }
    }

    pub fn with_submit_label(mut self, label: impl Into<String>) -> Self {
        self.control = SubmitControl::new(label);
        self
    }

    /// Overrides how the prediction timestamp is rendered.
    pub fn with_time_format(mut self, time_format: fn(&str) -> String) -> Self {
        self.time_format = time_format;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn api_mut(&mut self) -> &mut A {
        &mut self.api
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn submit_control(&self) -> &SubmitControl {
        &self.control
    }

    pub fn result_panel(&self) -> &ResultPanel {
        &self.panel
    }

    pub fn last_view(&self) -> Option<&ResultView> {
        self.last_view.as_ref()
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// Runs one submit cycle and returns the state it ended in.
    ///
    /// Errors never escape: they become a single danger notification and
    /// the panel keeps whatever it showed before.
    pub async fn submit<F>(&mut self, form: &F) -> SubmissionState
    where
        F: FormFields + Sync + ?Sized,
    {
        self.state = SubmissionState::Submitting;

        let outcome = {
            let _busy = self.control.acquire(BUSY_LABEL);
            Self::predict_and_render(&self.api, form, self.time_format).await
        };

        match outcome {
            Ok((view, html)) => {
                self.panel.replace(html);
                self.last_view = Some(view);
                self.state = SubmissionState::Displayed;
            }
            Err(e) => {
                tracing::error!("Prediction error: {}", e);
                self.notifications
                    .show(PREDICTION_ERROR_MESSAGE, NotificationLevel::Danger)
                    .await;
                self.state = SubmissionState::Failed;
            }
        }

        self.state
    }

    async fn predict_and_render<F>(
        api: &A,
        form: &F,
        time_format: fn(&str) -> String,
    ) -> Result<(ResultView, String), AppError>
    where
        F: FormFields + Sync + ?Sized,
    {
        let request = build_prediction_request(form)?;
        let response = api.predict(&request).await?;
        let view = ResultView::build(&response, time_format)?;
        let html = render_html(&view);
        Ok((view, html))
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            state: self.state,
            submit_control: self.control.clone(),
            result_panel: self.panel.clone(),
            notifications: self.notifications.active().await,
        }
    }
}
