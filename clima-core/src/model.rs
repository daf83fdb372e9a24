use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::{
    codec::{self, Decoded},
    error::DecodeError,
    schema::{Schema, WEATHER, weather_schemas},
};

/// One `current.json` response: where, and what it is like there right now.
///
/// Field names here are the decoded names from [`weather_schemas`]; the wire
/// names (`lat`, `feelslike_c`, ...) only exist on the JSON side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: Location,
    pub current: CurrentWeather,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub region: String,
    pub country: String,
    pub latitude: Reading,
    pub longitude: Reading,
    pub timezone_id: String,
    pub localtime_epoch: Reading,
    /// Wall-clock time at the location, as upstream formats it.
    pub localtime: String,
    /// Fields upstream sent that the schema does not declare.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    /// Protocol-relative URL of the condition icon.
    pub icon: String,
    pub code: Reading,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub last_updated_epoch: Reading,
    pub last_updated: String,
    pub temp_c: Reading,
    pub temp_f: Reading,
    /// 1 during daylight at the location, 0 otherwise.
    pub is_day: Reading,
    pub condition: Condition,
    pub wind_mph: Reading,
    pub wind_kph: Reading,
    pub wind_degree: Reading,
    pub wind_dir: String,
    pub pressure_mb: Reading,
    pub pressure_in: Reading,
    pub precip_mm: Reading,
    pub precip_in: Reading,
    pub humidity: Reading,
    pub cloud: Reading,
    pub feels_like_c: Reading,
    pub feels_like_f: Reading,
    pub visibility_km: Reading,
    pub visibility_miles: Reading,
    pub uv: Reading,
    pub gust_mph: Reading,
    pub gust_kph: Reading,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A JSON number kept exactly as upstream wrote it.
///
/// `1016` and `1016.0` are different documents on the wire, so readings are
/// not collapsed into `f64` until someone asks for one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reading(Number);

impl Reading {
    pub fn as_f64(&self) -> f64 {
        self.0.as_f64().unwrap_or(f64::NAN)
    }

    /// Whole-number value; `56.0` counts as well as `56`.
    pub fn as_i64(&self) -> Option<i64> {
        self.0.as_i64().or_else(|| {
            let v = self.0.as_f64()?;
            let in_range = v >= i64::MIN as f64 && v < i64::MAX as f64;
            (v.fract() == 0.0 && in_range).then_some(v as i64)
        })
    }

    pub fn as_number(&self) -> &Number {
        &self.0
    }
}

impl From<Number> for Reading {
    fn from(n: Number) -> Self {
        Self(n)
    }
}

impl PartialEq<f64> for Reading {
    fn eq(&self, other: &f64) -> bool {
        self.as_f64() == *other
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_f64())
    }
}

impl WeatherReport {
    /// Validate an untyped response body and convert it into a report.
    pub fn from_json(value: &Value) -> Result<Self, DecodeError> {
        let decoded = codec::decode(value, &Schema::reference(WEATHER), weather_schemas())?;
        Ok(serde_json::from_value(Value::from(decoded))?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json(&value)
    }

    /// Wire representation of the report, as upstream would have sent it.
    pub fn to_json(&self) -> Result<Value, DecodeError> {
        let internal = Decoded::from(serde_json::to_value(self)?);
        codec::encode(&internal, &Schema::reference(WEATHER), weather_schemas())
    }

    pub fn to_json_string_pretty(&self) -> Result<String, DecodeError> {
        Ok(serde_json::to_string_pretty(&self.to_json()?)?)
    }
}

impl Location {
    pub fn local_time(&self) -> Option<DateTime<Utc>> {
        self.localtime_epoch.as_i64().and_then(unix_to_utc)
    }
}

impl Condition {
    /// Upstream condition code, e.g. `1000` for clear skies.
    pub fn code(&self) -> Option<u32> {
        self.code.as_i64().and_then(|c| u32::try_from(c).ok())
    }

    /// Icon reference with a scheme, ready to open or display.
    pub fn icon_url(&self) -> String {
        if self.icon.starts_with("//") {
            format!("https:{}", self.icon)
        } else {
            self.icon.clone()
        }
    }
}

impl CurrentWeather {
    pub fn is_day(&self) -> bool {
        self.is_day.as_f64() != 0.0
    }

    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        self.last_updated_epoch.as_i64().and_then(unix_to_utc)
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}
