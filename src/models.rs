use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use utoipa::ToSchema;

// ============ Labels ============

/// Kind of predicted incident.
///
/// Labels outside the known set deserialize into `Other` so that display
/// lookups can fall back instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EmergencyType {
    Fire,
    Accident,
    Medical,
    NaturalDisaster,
    None,
    Other(String),
}

impl EmergencyType {
    pub const KNOWN: [EmergencyType; 5] = [
        EmergencyType::Fire,
        EmergencyType::Accident,
        EmergencyType::Medical,
        EmergencyType::NaturalDisaster,
        EmergencyType::None,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            EmergencyType::Fire => "fire",
            EmergencyType::Accident => "accident",
            EmergencyType::Medical => "medical",
            EmergencyType::NaturalDisaster => "natural_disaster",
            EmergencyType::None => "none",
            EmergencyType::Other(label) => label,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, EmergencyType::Other(_))
    }
}

impl From<String> for EmergencyType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "fire" => EmergencyType::Fire,
            "accident" => EmergencyType::Accident,
            "medical" => EmergencyType::Medical,
            "natural_disaster" => EmergencyType::NaturalDisaster,
            "none" => EmergencyType::None,
            _ => EmergencyType::Other(label),
        }
    }
}

impl From<&str> for EmergencyType {
    fn from(label: &str) -> Self {
        EmergencyType::from(label.to_string())
    }
}

impl fmt::Display for EmergencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EmergencyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EmergencyType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(EmergencyType::from)
    }
}

/// Predicted impact level, ordered `none < low < medium < high < critical`.
///
/// Unknown labels are kept as `Other` and rank below `none`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
    Critical,
    Other(String),
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Other(label) => label,
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            Severity::Other(_) => 0,
            Severity::None => 1,
            Severity::Low => 2,
            Severity::Medium => 3,
            Severity::High => 4,
            Severity::Critical => 5,
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.as_str().cmp(other.as_str()))
    }
}

impl From<String> for Severity {
    fn from(label: String) -> Self {
        match label.as_str() {
            "none" => Severity::None,
            "low" => Severity::Low,
            "medium" => Severity::Medium,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Other(label),
        }
    }
}

impl From<&str> for Severity {
    fn from(label: &str) -> Self {
        Severity::from(label.to_string())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Severity::from)
    }
}

// ============ Probability distribution ============

/// Per-class probabilities in the order the server sent them.
///
/// Deserialization rejects duplicate labels and values that are not finite
/// numbers in `[0, 1]`. The sum is not checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbabilityDistribution(Vec<(EmergencyType, f64)>);

impl ProbabilityDistribution {
    pub fn new(entries: Vec<(EmergencyType, f64)>) -> Result<Self, String> {
        let mut dist = Self(Vec::with_capacity(entries.len()));
        for (label, p) in entries {
            dist.push(label, p)?;
        }
        Ok(dist)
    }

    fn push(&mut self, label: EmergencyType, p: f64) -> Result<(), String> {
        if !is_unit_interval(p) {
            return Err(format!("probability for '{}' out of range: {}", label, p));
        }
        if self.get(&label).is_some() {
            return Err(format!("duplicate probability label '{}'", label));
        }
        self.0.push((label, p));
        Ok(())
    }

    pub fn get(&self, label: &EmergencyType) -> Option<f64> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, p)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(EmergencyType, f64)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entry with the highest probability; ties keep the earliest.
    pub fn most_likely(&self) -> Option<&(EmergencyType, f64)> {
        self.0.iter().fold(None, |best, entry| match best {
            Some(b) if b.1 >= entry.1 => Some(b),
            _ => Some(entry),
        })
    }
}

impl Serialize for ProbabilityDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, p) in &self.0 {
            map.serialize_entry(label.as_str(), p)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ProbabilityDistribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DistributionVisitor;

        impl<'de> Visitor<'de> for DistributionVisitor {
            type Value = ProbabilityDistribution;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map from emergency type to probability")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut dist = ProbabilityDistribution(Vec::with_capacity(
                    access.size_hint().unwrap_or(0),
                ));
                while let Some((label, p)) = access.next_entry::<String, f64>()? {
                    dist.push(EmergencyType::from(label), p)
                        .map_err(de::Error::custom)?;
                }
                Ok(dist)
            }
        }

        deserializer.deserialize_map(DistributionVisitor)
    }
}

fn is_unit_interval(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

fn unit_interval<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if !is_unit_interval(value) {
        return Err(de::Error::custom(format!(
            "confidence out of range: {}",
            value
        )));
    }
    Ok(value)
}

// ============ Prediction API Models ============

/// Body of `POST /api/predict/`.
///
/// Location fields are omitted from the JSON entirely when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PredictionRequest {
    /// Air temperature in °C.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Air quality index.
    pub air_quality: f64,
    /// Wind speed in km/h.
    pub wind_speed: f64,
    /// Precipitation in mm.
    pub precipitation: f64,
    /// People per km².
    pub population_density: f64,
    /// Built-up ratio, 0..1.
    pub building_density: f64,
    /// 0..23.
    pub hour_of_day: i32,
    /// 0 = Monday.
    pub day_of_week: i32,
    pub is_holiday: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
}

/// Body returned by `POST /api/predict/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PredictionResponse {
    #[schema(value_type = String, example = "fire")]
    pub emergency_type: EmergencyType,
    #[schema(value_type = String, example = "high")]
    pub severity: Severity,
    /// Probability that the top class is correct, 0..1.
    #[serde(deserialize_with = "unit_interval")]
    pub confidence: f64,
    /// ISO-8601 timestamp of the prediction.
    pub timestamp: String,
    #[schema(value_type = Object)]
    pub probabilities: ProbabilityDistribution,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction_id: Option<i64>,
}

// ============ Batch / History Models ============

/// Body of `POST /api/batch_predict/`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchPredictionRequest {
    pub records: Vec<PredictionRequest>,
}

/// One entry of a batch prediction result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BatchPrediction {
    #[schema(value_type = String)]
    pub emergency_type: EmergencyType,
    #[schema(value_type = String)]
    pub severity: Severity,
    #[serde(deserialize_with = "unit_interval")]
    pub confidence: f64,
    /// Location name, `"Unknown"` when the record had none.
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchPredictionResponse {
    pub predictions: Vec<BatchPrediction>,
}

/// Filters for `GET /api/history/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct HistoryQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub emergency_type: Option<EmergencyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub severity: Option<Severity>,
}

/// A stored prediction as returned by the history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PredictionRecord {
    pub id: i64,
    pub timestamp: String,
    pub temperature: f64,
    pub humidity: f64,
    pub air_quality: f64,
    pub wind_speed: f64,
    pub precipitation: f64,
    pub population_density: f64,
    pub building_density: f64,
    pub hour_of_day: i32,
    pub day_of_week: i32,
    pub is_holiday: bool,
    #[schema(value_type = String)]
    pub predicted_emergency: EmergencyType,
    #[schema(value_type = String)]
    pub severity: Severity,
    pub confidence: f64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub location_name: String,
}
