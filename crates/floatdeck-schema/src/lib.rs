use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Measured variable selectable in the dashboard filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    Temperature,
    Salinity,
    Pressure,
    Oxygen,
}

impl Variable {
    /// Wire name, used verbatim as the `var` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Variable::Temperature => "temperature",
            Variable::Salinity => "salinity",
            Variable::Pressure => "pressure",
            Variable::Oxygen => "oxygen",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperature" => Ok(Variable::Temperature),
            "salinity" => Ok(Variable::Salinity),
            "pressure" => Ok(Variable::Pressure),
            "oxygen" => Ok(Variable::Oxygen),
            other => Err(format!("unknown variable: {other}")),
        }
    }
}

/// Filter inputs owned by the top-level session. Mutated only by user
/// interaction; fetch results never write back into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub variable: Variable,
    #[serde(default)]
    pub dataset_types: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub min_lat: Option<f64>,
    #[serde(default)]
    pub max_lat: Option<f64>,
    #[serde(default)]
    pub min_lon: Option<f64>,
    #[serde(default)]
    pub max_lon: Option<f64>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            variable: Variable::Temperature,
            dataset_types: vec!["ARGO Floats".to_string()],
            start_date: NaiveDate::from_ymd_opt(2020, 3, 1).expect("valid date"),
            end_date: NaiveDate::from_ymd_opt(2020, 5, 30).expect("valid date"),
            min_lat: None,
            max_lat: None,
            min_lon: None,
            max_lon: None,
        }
    }
}

impl FilterState {
    /// Whether an edit from `self` to `next` re-runs the fetches on its
    /// own. Bounds and dataset-type edits wait for an explicit apply.
    pub fn triggers_refresh(&self, next: &FilterState) -> bool {
        self.variable != next.variable
            || self.start_date != next.start_date
            || self.end_date != next.end_date
    }
}

/// One asynchronous fetch slot. Replaced wholesale on each completion,
/// never merged incrementally. `last_error` records a swallowed transport
/// failure for surfaces that want it; the default UI ignores it.
#[derive(Debug, Clone)]
pub struct FetchResultSet<T> {
    pub data: Vec<T>,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl<T> Default for FetchResultSet<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            loading: false,
            last_error: None,
        }
    }
}

/// Per-float aggregate as reported by the float list endpoint.
/// A float without an averaged position is rendered as unmapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatSummary {
    pub float_id: String,
    #[serde(default)]
    pub avg_lat: Option<f64>,
    #[serde(default)]
    pub avg_lon: Option<f64>,
    pub total_observations: u64,
    pub last_observation: DateTime<Utc>,
}

/// Single measurement within one vertical profile scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub temperature: f64,
    pub pressure: f64,
    #[serde(default)]
    pub salinity: Option<f64>,
}

/// Daily aggregate for the selected variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub day: NaiveDate,
    pub avg_value: f64,
    #[serde(default)]
    pub num_observations: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Which backend path produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    System,
    Database,
    AdvancedAi,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Lenient wire parse; anything outside the known set is dropped
    /// rather than failing the whole response.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Confidence::High),
            "medium" => Some(Confidence::Medium),
            "low" => Some(Confidence::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

/// One transcript entry. Immutable once appended; the transcript is an
/// append-only ordered sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Monotonically increasing, wall-clock-derived identifier.
    pub id: i64,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub source: MessageSource,
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub record_count: Option<u64>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
}

impl ChatMessage {
    pub fn new(id: i64, role: Role, text: impl Into<String>, source: MessageSource) -> Self {
        Self {
            id,
            role,
            text: text.into(),
            timestamp: Utc::now(),
            source,
            sql: None,
            record_count: None,
            confidence: None,
            model: None,
            success: None,
        }
    }
}

/// Backend AI availability as last observed by the capability poller.
/// A single session-wide value, overwritten on each poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityStatus {
    #[default]
    Checking,
    Loaded,
    NotLoaded,
    Error,
}

impl CapabilityStatus {
    /// Map a server-reported status string. Unknown capability is treated
    /// as absence of capability.
    pub fn parse(s: &str) -> Self {
        match s {
            "loaded" => CapabilityStatus::Loaded,
            "not_loaded" => CapabilityStatus::NotLoaded,
            "error" => CapabilityStatus::Error,
            _ => CapabilityStatus::NotLoaded,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityStatus::Checking => "checking",
            CapabilityStatus::Loaded => "loaded",
            CapabilityStatus::NotLoaded => "not_loaded",
            CapabilityStatus::Error => "error",
        }
    }
}

impl fmt::Display for CapabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
