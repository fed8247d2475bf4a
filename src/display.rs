//! Presentation lookups shared by the result view and notifications.

use crate::models::{EmergencyType, Severity};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

pub const FALLBACK_ICON: &str = "fa-question-circle";
pub const FALLBACK_SEVERITY_COLOR: &str = "secondary";
pub const FALLBACK_BAR_COLOR: &str = "#6c757d";

/// Font Awesome icon for an emergency type.
pub fn emergency_icon(emergency_type: &EmergencyType) -> &'static str {
    match emergency_type {
        EmergencyType::Fire => "fa-fire",
        EmergencyType::Accident => "fa-car-crash",
        EmergencyType::Medical => "fa-ambulance",
        EmergencyType::NaturalDisaster => "fa-volcano",
        EmergencyType::None => "fa-check-circle",
        EmergencyType::Other(_) => FALLBACK_ICON,
    }
}

/// Bootstrap contextual colour for a severity.
pub fn severity_color(severity: &Severity) -> &'static str {
    match severity {
        Severity::None => "success",
        Severity::Low | Severity::Medium => "warning",
        Severity::High | Severity::Critical => "danger",
        Severity::Other(_) => FALLBACK_SEVERITY_COLOR,
    }
}

/// Fill colour of a probability bar.
pub fn bar_color(emergency_type: &EmergencyType) -> &'static str {
    match emergency_type {
        EmergencyType::Fire => "#dc3545",
        EmergencyType::Accident => "#fd7e14",
        EmergencyType::Medical => "#ffc107",
        EmergencyType::NaturalDisaster => "#6f42c1",
        EmergencyType::None => "#28a745",
        EmergencyType::Other(_) => FALLBACK_BAR_COLOR,
    }
}

/// `natural_disaster` -> `natural disaster`.
pub fn humanize_label(label: &str) -> String {
    label.replace('_', " ")
}

/// Formats a fraction as a percentage with two decimals, without the sign.
pub fn percentage(fraction: f64) -> String {
    format!("{:.2}", fraction * 100.0)
}

/// Renders an ISO-8601 timestamp in the local time zone.
///
/// Offset-less timestamps are read as wall-clock time in the local zone.
/// Input that does not parse is returned as given.
pub fn format_date(iso: &str) -> String {
    format_date_in(iso, &Local)
}

/// Same as [`format_date`] with an explicit time zone.
pub fn format_date_in<Tz>(iso: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let parsed = match DateTime::parse_from_rfc3339(iso) {
        Ok(dt) => Some(dt.with_timezone(tz)),
        Err(_) => NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .and_then(|naive| tz.from_local_datetime(&naive).earliest()),
    };

    match parsed {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => {
            tracing::warn!("Unparseable timestamp '{}'", iso);
            iso.to_string()
        }
    }
}

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
