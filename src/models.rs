//! Data models for the room climate service.
//!
//! [`Reading`] is the stored sensor sample. The report types are derived on
//! every request and never persisted.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ReportError;

// ---

/// Wire format of a reading timestamp after the space has become a `T`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// An optional numeric sensor value as it arrived from the device.
///
/// Devices send `null`, omit the field, or occasionally send garbage. The
/// value is kept exactly as received so the raw series can be charted
/// unchanged, and classification decides what counts as a sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Measurement {
    // ---
    #[default]
    Missing,
    Invalid(serde_json::Value),
    Value(f64),
}

impl Measurement {
    // ---
    /// The value if it is a finite number.
    pub fn finite(&self) -> Option<f64> {
        match self {
            Measurement::Value(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }
}

impl From<Option<f64>> for Measurement {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Measurement::Missing, Measurement::Value)
    }
}

impl Serialize for Measurement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // ---
        match self {
            Measurement::Missing => serializer.serialize_none(),
            Measurement::Invalid(raw) => raw.serialize(serializer),
            Measurement::Value(v) => serializer.serialize_f64(*v),
        }
    }
}

impl<'de> Deserialize<'de> for Measurement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // ---
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(match raw {
            serde_json::Value::Null => Measurement::Missing,
            serde_json::Value::Number(ref n) => match n.as_f64() {
                Some(v) => Measurement::Value(v),
                None => Measurement::Invalid(raw),
            },
            other => Measurement::Invalid(other),
        })
    }
}

/// One sensor sample as posted by a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    // ---
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub temperature: Measurement,
    #[serde(default)]
    pub humidity: Measurement,
    pub room: String,
    /// Local time, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    #[serde(default)]
    pub api_key: String,
}

impl Reading {
    // ---
    /// Parse the timestamp into a naive date-time.
    pub fn recorded_at(&self) -> Result<NaiveDateTime, ReportError> {
        // ---
        let iso = self.timestamp.replacen(' ', "T", 1);
        NaiveDateTime::parse_from_str(&iso, TIMESTAMP_FORMAT).map_err(|source| {
            ReportError::MalformedTimestamp {
                timestamp: self.timestamp.clone(),
                source,
            }
        })
    }

    /// Calendar day the reading belongs to.
    pub fn date(&self) -> Result<NaiveDate, ReportError> {
        Ok(self.recorded_at()?.date())
    }
}

/// Data integrity verdict for a group of readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataStability {
    // ---
    #[serde(rename = "secure")]
    Secure,
    #[serde(rename = "anomali")]
    Anomaly,
}

/// Threshold verdict for one metric over a group of readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricStability {
    // ---
    #[serde(rename = "aman")]
    Safe,
    #[serde(rename = "anomali")]
    Anomaly,
}

/// Stability summary for one calendar day, all rooms pooled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayReport {
    // ---
    pub date: NaiveDate,
    pub temperature_stability: MetricStability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity_stability: Option<MetricStability>,
    pub data_stability: DataStability,
}

/// Averages and stability for one room on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomReport {
    // ---
    pub room: String,
    pub date: String,
    pub avg_temperature: Option<f64>,
    /// Outer `None` when humidity is not tracked, inner `None` when no valid sample.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_humidity: Option<Option<f64>>,
    pub temperature_stability: MetricStability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity_stability: Option<MetricStability>,
    pub data_stability: DataStability,
}

/// Min / max / rounded mean over the valid samples of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SeriesStats {
    // ---
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
}

/// Chart-ready time series for one room on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesReport {
    // ---
    pub date: String,
    pub room: String,
    pub temperature: SeriesStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<SeriesStats>,
    /// `HH:MM` per sample, same length as the series.
    pub labels: Vec<String>,
    pub temperature_series: Vec<Measurement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity_series: Option<Vec<Measurement>>,
}
