//! Result card view-model and its HTML rendering.
//!
//! [`ResultView`] holds everything the card shows, already formatted.
//! [`render_html`] is a pure function of it, so the same prediction always
//! renders to the same markup.

use crate::display::{
    bar_color, emergency_icon, escape_html, format_date, humanize_label, percentage,
    severity_color,
};
use crate::errors::AppError;
use crate::models::PredictionResponse;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// One row of the probability distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityBar {
    /// Human-readable class name.
    pub label: String,
    /// Percentage with two decimals, no sign (e.g. `"70.00"`).
    pub percentage: String,
    /// CSS colour of the fill.
    pub color: &'static str,
}

impl ProbabilityBar {
    /// Value of the fill's CSS `width`.
    pub fn width(&self) -> String {
        format!("{}%", self.percentage)
    }
}

/// Everything the result card displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub severity_class: String,
    pub severity_color: &'static str,
    pub icon: &'static str,
    pub heading: String,
    pub severity_label: String,
    pub confidence: String,
    pub time: String,
    pub bars: Vec<ProbabilityBar>,
    pub recommendations: Vec<String>,
}

impl ResultView {
    /// Builds the view with timestamps shown in local time.
    pub fn from_response(response: &PredictionResponse) -> Result<Self, AppError> {
        Self::build(response, format_date)
    }

    /// Builds the view using `format_time` to render the timestamp.
    ///
    /// A response without a timestamp or without any probabilities cannot
    /// be shown and is reported as malformed.
    pub fn build<F>(response: &PredictionResponse, format_time: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> String,
    {
        if response.timestamp.trim().is_empty() {
            return Err(AppError::MalformedResponse(
                "prediction has no timestamp".to_string(),
            ));
        }
        if response.probabilities.is_empty() {
            return Err(AppError::MalformedResponse(
                "prediction has no probability distribution".to_string(),
            ));
        }

        let bars = response
            .probabilities
            .iter()
            .map(|(emergency_type, p)| ProbabilityBar {
                label: humanize_label(emergency_type.as_str()),
                percentage: percentage(*p),
                color: bar_color(emergency_type),
            })
            .collect();

        Ok(Self {
            severity_class: format!("emergency-{}", response.severity.as_str()),
            severity_color: severity_color(&response.severity),
            icon: emergency_icon(&response.emergency_type),
            heading: format!("{} Emergency", humanize_label(response.emergency_type.as_str())),
            severity_label: response.severity.as_str().to_string(),
            confidence: percentage(response.confidence),
            time: format_time(&response.timestamp),
            bars,
            recommendations: response.recommendations.clone(),
        })
    }

    /// SHA-256 of the rendered markup, hex encoded.
    pub fn fingerprint(&self) -> String {
        fingerprint_html(&render_html(self))
    }
}

pub fn fingerprint_html(html: &str) -> String {
    hex::encode(Sha256::digest(html.as_bytes()))
}

/// Renders the result card.
pub fn render_html(view: &ResultView) -> String {
    let mut html = String::new();

    // Writing to a String cannot fail.
    let _ = write!(
        html,
        concat!(
            r#"<div class="card shadow {severity_class}">"#,
            r#"<div class="card-header bg-{color} text-white">"#,
            r#"<h5 class="card-title mb-0"><i class="fas {icon} me-2"></i>Prediction Result</h5>"#,
            r#"</div>"#,
            r#"<div class="card-body"><div class="row">"#,
            r#"<div class="col-md-6"><div class="alert alert-{color}">"#,
            r#"<h4 class="alert-heading text-capitalize">{heading}</h4>"#,
            r#"<p class="mb-0"><strong>Severity:</strong> <span class="text-capitalize">{severity}</span></p>"#,
            r#"<p class="mb-0"><strong>Confidence:</strong> {confidence}%</p>"#,
            r#"<p class="mb-0"><strong>Time:</strong> {time}</p>"#,
            r#"</div></div>"#,
            r#"<div class="col-md-6"><h5>Probability Distribution</h5>"#,
        ),
        severity_class = escape_html(&view.severity_class),
        color = view.severity_color,
        icon = view.icon,
        heading = escape_html(&view.heading),
        severity = escape_html(&view.severity_label),
        confidence = view.confidence,
        time = escape_html(&view.time),
    );

    for bar in &view.bars {
        let _ = write!(
            html,
            concat!(
                r#"<div class="mb-2">"#,
                r#"<div class="d-flex justify-content-between">"#,
                r#"<span class="text-capitalize">{label}</span><span>{pct}%</span>"#,
                r#"</div>"#,
                r#"<div class="probability-bar">"#,
                r#"<div class="probability-fill" style="width: {width}; background-color: {color};">{pct}%</div>"#,
                r#"</div></div>"#,
            ),
            label = escape_html(&bar.label),
            pct = bar.percentage,
            width = bar.width(),
            color = bar.color,
        );
    }

    html.push_str("</div></div>");

    if !view.recommendations.is_empty() {
        html.push_str(concat!(
            r#"<div class="mt-4">"#,
            r#"<h5><i class="fas fa-lightbulb me-2"></i>Recommendations</h5>"#,
            r#"<ul class="list-group">"#,
        ));
        for rec in &view.recommendations {
            let _ = write!(
                html,
                r#"<li class="list-group-item">{}</li>"#,
                escape_html(rec)
            );
        }
        html.push_str("</ul></div>");
    }

    html.push_str(concat!(
        r#"<div class="mt-3 text-center">"#,
        r#"<button class="btn btn-outline-primary me-2" onclick="window.location.reload()">"#,
        r#"<i class="fas fa-redo me-2"></i>Make Another Prediction</button>"#,
        r#"<a class="btn btn-outline-secondary" href="/dashboard/">"#,
        r#"<i class="fas fa-chart-line me-2"></i>View Dashboard</a>"#,
        r#"</div></div></div>"#,
    ));

    html
}
