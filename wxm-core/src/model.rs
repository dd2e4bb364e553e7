use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque bearer token returned by the login endpoint.
///
/// Exactly one token is obtained per run and reused for every subsequent
/// request; there is no refresh or expiry handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A weather station registered to the authenticated account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Fields the API returns that this program does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Device {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), name: None, extra: Map::new() }
    }
}

/// One calendar day of history for a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayHistory {
    pub date: NaiveDate,

    /// IANA time-zone label of the station, e.g. "Europe/Athens".
    pub tz: String,

    #[serde(default)]
    pub hourly: Vec<HourlyReading>,
}

/// A single hourly observation.
///
/// Every measurement is optional: the API omits fields a station did not
/// report, and `None` keeps "absent" distinct from a zero reading. Unknown
/// fields land in `extra`, so re-serializing a reading reproduces the
/// payload the API returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyReading {
    pub timestamp: DateTime<FixedOffset>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_direction: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_gust: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation_accumulated: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dew_point: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub illuminance: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub solar_irradiance: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
