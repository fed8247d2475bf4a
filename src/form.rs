//! Typing of submitted prediction form fields.

use crate::errors::AppError;
use crate::models::PredictionRequest;
use std::collections::{BTreeMap, HashMap};

/// Identifiers of every field the prediction form carries.
pub const FORM_FIELDS: [&str; 13] = [
    "temperature",
    "humidity",
    "air_quality",
    "wind_speed",
    "precipitation",
    "population_density",
    "building_density",
    "hour_of_day",
    "day_of_week",
    "is_holiday",
    "latitude",
    "longitude",
    "location_name",
];

/// Read access to submitted form values by field identifier.
pub trait FormFields {
    fn field(&self, name: &str) -> Option<&str>;
}

impl FormFields for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl FormFields for BTreeMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl FormFields for [(&str, &str)] {
    fn field(&self, name: &str) -> Option<&str> {
        self.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
    }
}

impl<const N: usize> FormFields for [(&str, &str); N] {
    fn field(&self, name: &str) -> Option<&str> {
        self.as_slice().field(name)
    }
}

/// Builds the prediction payload from form values.
///
/// Numeric fields parse as `f64` or `i32` by declared type. `is_holiday` is
/// `true` only for the exact value `"true"`. Location fields are left out
/// when blank; a non-blank `location_name` is sent as entered.
pub fn build_prediction_request<F: FormFields + ?Sized>(
    form: &F,
) -> Result<PredictionRequest, AppError> {
    let location_name = form
        .field("location_name")
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string);

    Ok(PredictionRequest {
        temperature: required_float(form, "temperature")?,
        humidity: required_float(form, "humidity")?,
        air_quality: required_float(form, "air_quality")?,
        wind_speed: required_float(form, "wind_speed")?,
        precipitation: required_float(form, "precipitation")?,
        population_density: required_float(form, "population_density")?,
        building_density: required_float(form, "building_density")?,
        hour_of_day: required_int(form, "hour_of_day")?,
        day_of_week: required_int(form, "day_of_week")?,
        is_holiday: form.field("is_holiday") == Some("true"),
        latitude: optional_float(form, "latitude")?,
        longitude: optional_float(form, "longitude")?,
        location_name,
    })
}

fn non_blank<'a, F: FormFields + ?Sized>(form: &'a F, name: &str) -> Option<&'a str> {
    form.field(name).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_float(name: &str, raw: &str) -> Result<f64, AppError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::InvalidForm(format!("{} must be a number, got '{}'", name, raw)))
}

fn required_float<F: FormFields + ?Sized>(form: &F, name: &str) -> Result<f64, AppError> {
    let raw = non_blank(form, name)
        .ok_or_else(|| AppError::InvalidForm(format!("{} is required", name)))?;
    parse_float(name, raw)
}

fn required_int<F: FormFields + ?Sized>(form: &F, name: &str) -> Result<i32, AppError> {
    let raw = non_blank(form, name)
        .ok_or_else(|| AppError::InvalidForm(format!("{} is required", name)))?;
    // Whole-valued decimals such as "8.0" are accepted.
    raw.parse::<i32>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && v.fract() == 0.0)
                .filter(|v| *v >= i32::MIN as f64 && *v <= i32::MAX as f64)
                .map(|v| v as i32)
        })
        .ok_or_else(|| {
            AppError::InvalidForm(format!("{} must be a whole number, got '{}'", name, raw))
        })
}

fn optional_float<F: FormFields + ?Sized>(form: &F, name: &str) -> Result<Option<f64>, AppError> {
    non_blank(form, name)
        .map(|raw| parse_float(name, raw))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_form() -> HashMap<String, String> {
        [
            ("temperature", "31.5"),
            ("humidity", "40"),
            ("air_quality", "120.25"),
            ("wind_speed", "12"),
            ("precipitation", "0"),
            ("population_density", "1500"),
            ("building_density", "0.75"),
            ("hour_of_day", "17"),
            ("day_of_week", "4"),
            ("is_holiday", "false"),
            ("latitude", ""),
            ("longitude", ""),
            ("location_name", ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_build_types_every_field() {
        let req = build_prediction_request(&base_form()).unwrap();
        assert_eq!(req.temperature, 31.5);
        assert_eq!(req.air_quality, 120.25);
        assert_eq!(req.building_density, 0.75);
        assert_eq!(req.hour_of_day, 17);
        assert_eq!(req.day_of_week, 4);
        assert!(!req.is_holiday);
        assert_eq!(req.latitude, None);
        assert_eq!(req.location_name, None);
    }

    #[test]
    fn test_optional_location_included_when_present() {
        let mut form = base_form();
        form.insert("latitude".into(), "40.7128".into());
        form.insert("longitude".into(), "-74.0060".into());
        form.insert("location_name".into(), "Lower Manhattan".into());

        let req = build_prediction_request(&form).unwrap();
        assert_eq!(req.latitude, Some(40.7128));
        assert_eq!(req.longitude, Some(-74.006));
        assert_eq!(req.location_name.as_deref(), Some("Lower Manhattan"));
    }

    #[test]
    fn test_is_holiday_exact_match_only() {
        for (value, expected) in [("true", true), ("True", false), ("1", false), ("", false)] {
            let mut form = base_form();
            form.insert("is_holiday".into(), value.into());
            let req = build_prediction_request(&form).unwrap();
            assert_eq!(req.is_holiday, expected, "value {:?}", value);
        }

        let mut form = base_form();
        form.remove("is_holiday");
        assert!(!build_prediction_request(&form).unwrap().is_holiday);
    }

    #[test]
    fn test_missing_required_field_is_invalid() {
        let mut form = base_form();
        form.remove("humidity");
        let err = build_prediction_request(&form).unwrap_err();
        assert!(matches!(err, AppError::InvalidForm(ref m) if m.contains("humidity")));
    }

    #[test]
    fn test_non_numeric_values_rejected() {
        let mut form = base_form();
        form.insert("temperature".into(), "hot".into());
        assert!(build_prediction_request(&form).is_err());

        let mut form = base_form();
        form.insert("hour_of_day".into(), "3.5".into());
        assert!(build_prediction_request(&form).is_err());

        let mut form = base_form();
        form.insert("wind_speed".into(), "NaN".into());
        assert!(build_prediction_request(&form).is_err());
    }

    #[test]
    fn test_whole_valued_decimal_accepted_for_integers() {
        let mut form = base_form();
        form.insert("hour_of_day".into(), "8.0".into());
        form.insert("day_of_week".into(), "2.00".into());

        let req = build_prediction_request(&form).unwrap();
        assert_eq!(req.hour_of_day, 8);
        assert_eq!(req.day_of_week, 2);

        let payload = serde_json::to_value(&req).unwrap();
        assert_eq!(payload["hour_of_day"], serde_json::json!(8));
    }

    #[test]
    fn test_location_name_sent_as_entered() {
        let mut form = base_form();
        form.insert("location_name".into(), "  Harbour Gate ".into());
        let req = build_prediction_request(&form).unwrap();
        assert_eq!(req.location_name.as_deref(), Some("  Harbour Gate "));

        form.insert("location_name".into(), "   ".into());
        assert_eq!(build_prediction_request(&form).unwrap().location_name, None);
    }

    #[test]
    fn test_array_form_source() {
        let form = [
            ("temperature", "20"),
            ("humidity", "50"),
            ("air_quality", "50"),
            ("wind_speed", "5"),
            ("precipitation", "2"),
            ("population_density", "500"),
            ("building_density", "0.5"),
            ("hour_of_day", "9"),
            ("day_of_week", "0"),
            ("is_holiday", "true"),
        ];
        let req = build_prediction_request(&form).unwrap();
        assert!(req.is_holiday);
        assert_eq!(req.hour_of_day, 9);
    }
}
