//! Aggregation engine: grouping, anomaly classification and series reduction.
//!
//! Everything here is pure and synchronous. The engine is configured once with
//! the set of tracked metrics and the anomaly thresholds, then shared by all
//! request handlers through the reporting service.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::error::ReportError;
use crate::models::{
    DataStability, DayReport, Measurement, MetricStability, Reading, RoomReport, SeriesReport,
    SeriesStats,
};

// ---

/// Temperature above which a group is flagged, in °C.
pub const DEFAULT_TEMPERATURE_LIMIT: f64 = 30.0;

/// Relative humidity above which a group is flagged, in %.
pub const DEFAULT_HUMIDITY_LIMIT: f64 = 70.0;

/// Temperature reported by the probe when it fails to read.
pub const DEFAULT_SENSOR_FAULT: f64 = -127.0;

/// A numeric field of a [`Reading`] that the engine can aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    // ---
    Temperature,
    Humidity,
}

impl Metric {
    // ---
    fn of(self, reading: &Reading) -> &Measurement {
        match self {
            Metric::Temperature => &reading.temperature,
            Metric::Humidity => &reading.humidity,
        }
    }
}

/// Which optional metrics the deployment collects. Temperature is always on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSet {
    // ---
    pub humidity: bool,
}

impl MetricSet {
    // ---
    pub const TEMPERATURE_ONLY: MetricSet = MetricSet { humidity: false };
    pub const TEMPERATURE_AND_HUMIDITY: MetricSet = MetricSet { humidity: true };

    pub fn tracks(self, metric: Metric) -> bool {
        match metric {
            Metric::Temperature => true,
            Metric::Humidity => self.humidity,
        }
    }
}

impl Default for MetricSet {
    fn default() -> Self {
        Self::TEMPERATURE_AND_HUMIDITY
    }
}

/// Anomaly thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    // ---
    pub temperature_limit: f64,
    pub humidity_limit: f64,
    pub sensor_fault: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature_limit: DEFAULT_TEMPERATURE_LIMIT,
            humidity_limit: DEFAULT_HUMIDITY_LIMIT,
            sensor_fault: DEFAULT_SENSOR_FAULT,
        }
    }
}

impl Thresholds {
    // ---
    fn limit(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Temperature => self.temperature_limit,
            Metric::Humidity => self.humidity_limit,
        }
    }
}

/// The aggregation engine.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    // ---
    metrics: MetricSet,
    thresholds: Thresholds,
}

impl Aggregator {
    // ---
    pub fn new(metrics: MetricSet, thresholds: Thresholds) -> Self {
        Self {
            metrics,
            thresholds,
        }
    }

    pub fn metrics(&self) -> MetricSet {
        self.metrics
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// `Anomaly` if any temperature is missing, non-numeric, NaN or the
    /// sensor-fault sentinel.
    pub fn classify_data_stability(&self, readings: &[Reading]) -> DataStability {
        // ---
        let faulty = readings.iter().any(|r| match r.temperature {
            Measurement::Value(v) => v.is_nan() || v == self.thresholds.sensor_fault,
            Measurement::Missing | Measurement::Invalid(_) => true,
        });

        if faulty {
            DataStability::Anomaly
        } else {
            DataStability::Secure
        }
    }

    /// `Anomaly` if any numeric value of `metric` exceeds its limit.
    ///
    /// Non-numeric values never trip this check, so a faulted probe reads as
    /// `Safe` here and is only caught by [`Self::classify_data_stability`].
    pub fn classify_stability(&self, metric: Metric, readings: &[Reading]) -> MetricStability {
        // ---
        let limit = self.thresholds.limit(metric);
        let exceeded = readings
            .iter()
            .any(|r| matches!(metric.of(r), Measurement::Value(v) if *v > limit));

        if exceeded {
            MetricStability::Anomaly
        } else {
            MetricStability::Safe
        }
    }

    pub fn classify_temperature_stability(&self, readings: &[Reading]) -> MetricStability {
        self.classify_stability(Metric::Temperature, readings)
    }

    pub fn classify_humidity_stability(&self, readings: &[Reading]) -> MetricStability {
        self.classify_stability(Metric::Humidity, readings)
    }

    /// Rounded mean of the valid samples of `metric`, `None` if there are none.
    pub fn average(&self, metric: Metric, readings: &[Reading]) -> Option<f64> {
        // ---
        let samples: Vec<f64> = readings
            .iter()
            .filter_map(|r| self.sample(metric, metric.of(r)))
            .collect();
        mean(&samples)
    }

    pub fn average_temperature(&self, readings: &[Reading]) -> Option<f64> {
        self.average(Metric::Temperature, readings)
    }

    pub fn average_humidity(&self, readings: &[Reading]) -> Option<f64> {
        self.average(Metric::Humidity, readings)
    }

    /// Stability summary for one day's readings across all rooms.
    pub fn day_report(&self, date: NaiveDate, readings: &[Reading]) -> DayReport {
        // ---
        DayReport {
            date,
            temperature_stability: self.classify_temperature_stability(readings),
            humidity_stability: self
                .metrics
                .humidity
                .then(|| self.classify_humidity_stability(readings)),
            data_stability: self.classify_data_stability(readings),
        }
    }

    /// Averages and stability for one room's readings on `date`.
    pub fn room_report(&self, room: &str, date: &str, readings: &[Reading]) -> RoomReport {
        // ---
        let humidity = self.metrics.tracks(Metric::Humidity);

        RoomReport {
            room: room.to_string(),
            date: date.to_string(),
            avg_temperature: self.average_temperature(readings),
            avg_humidity: humidity.then(|| self.average_humidity(readings)),
            temperature_stability: self.classify_temperature_stability(readings),
            humidity_stability: humidity.then(|| self.classify_humidity_stability(readings)),
            data_stability: self.classify_data_stability(readings),
        }
    }

    /// Reduce one room's readings for a day into a chart series.
    ///
    /// Readings are ordered by timestamp (stable for ties). The raw series keep
    /// every value as received; min, max and avg only see valid samples.
    pub fn build_series(
        &self,
        readings: &[Reading],
        date: &str,
        room: &str,
    ) -> Result<SeriesReport, ReportError> {
        // ---
        let mut timed = readings
            .iter()
            .map(|r| r.recorded_at().map(|at| (at, r)))
            .collect::<Result<Vec<_>, ReportError>>()?;
        timed.sort_by(|a, b| a.0.cmp(&b.0));

        let labels = timed
            .iter()
            .map(|(at, _)| at.format("%H:%M").to_string())
            .collect();
        let temperature_series: Vec<Measurement> =
            timed.iter().map(|(_, r)| r.temperature.clone()).collect();
        let humidity_series: Option<Vec<Measurement>> = self
            .metrics
            .humidity
            .then(|| timed.iter().map(|(_, r)| r.humidity.clone()).collect());

        Ok(SeriesReport {
            date: date.to_string(),
            room: room.to_string(),
            temperature: self.stats(Metric::Temperature, &temperature_series),
            humidity: humidity_series
                .as_deref()
                .map(|series| self.stats(Metric::Humidity, series)),
            labels,
            temperature_series,
            humidity_series,
        })
    }

    fn stats(&self, metric: Metric, series: &[Measurement]) -> SeriesStats {
        // ---
        let samples: Vec<f64> = series
            .iter()
            .filter_map(|m| self.sample(metric, m))
            .collect();

        SeriesStats {
            min: samples.iter().copied().reduce(f64::min),
            max: samples.iter().copied().reduce(f64::max),
            avg: mean(&samples),
        }
    }

    /// A value counts as a sample if it is finite and, for temperature, not
    /// the fault sentinel.
    fn sample(&self, metric: Metric, value: &Measurement) -> Option<f64> {
        // ---
        let v = value.finite()?;
        if metric == Metric::Temperature && v == self.thresholds.sensor_fault {
            return None;
        }
        Some(v)
    }
}

/// Group readings by calendar day, most recent day first.
pub fn group_by_date(
    readings: Vec<Reading>,
) -> Result<Vec<(NaiveDate, Vec<Reading>)>, ReportError> {
    // ---
    let mut days: BTreeMap<NaiveDate, Vec<Reading>> = BTreeMap::new();
    for reading in readings {
        days.entry(reading.date()?).or_default().push(reading);
    }
    Ok(days.into_iter().rev().collect())
}

/// Group readings by exact room name, in order of each room's first appearance.
pub fn group_by_room(readings: Vec<Reading>) -> Vec<(String, Vec<Reading>)> {
    // ---
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rooms: Vec<(String, Vec<Reading>)> = Vec::new();

    for reading in readings {
        match index.get(&reading.room) {
            Some(&i) => rooms[i].1.push(reading),
            None => {
                index.insert(reading.room.clone(), rooms.len());
                rooms.push((reading.room.clone(), vec![reading]));
            }
        }
    }
    rooms
}

/// Magnitude beyond which an `f64` no longer carries a tenths digit.
const TENTHS_PRECISION_LIMIT: f64 = 1e15;

/// Arithmetic mean rounded to one decimal, half away from zero.
///
/// The mean is accumulated incrementally so large samples cannot overflow the
/// sum. Before rounding it is pushed a few ULPs away from zero, which only
/// settles binary representation error: `[24.04, 24.06]` averages to `24.1`
/// while `[24.0499999999]` stays at `24.0`.
fn mean(samples: &[f64]) -> Option<f64> {
    // ---
    if samples.is_empty() {
        return None;
    }
    let raw = samples
        .iter()
        .enumerate()
        .fold(0.0, |acc, (i, x)| acc + (x - acc) / (i + 1) as f64);

    if raw.abs() >= TENTHS_PRECISION_LIMIT {
        return Some(raw);
    }
    let settled = raw + raw.signum() * raw.abs() * f64::EPSILON * 4.0;
    Some((settled * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    fn reading(
        timestamp: &str,
        room: &str,
        temperature: Measurement,
        humidity: Measurement,
    ) -> Reading {
        // ---
        Reading {
            device_id: "ESP32-001".to_string(),
            temperature,
            humidity,
            room: room.to_string(),
            timestamp: timestamp.to_string(),
            api_key: "RAHASIA123".to_string(),
        }
    }

    fn temp(t: f64) -> Reading {
        reading("2025-01-01 10:00:00", "A1", Measurement::Value(t), Measurement::Missing)
    }

    fn engine() -> Aggregator {
        Aggregator::default()
    }

    #[test]
    fn test_data_stability() {
        // ---
        let e = engine();
        assert_eq!(e.classify_data_stability(&[temp(22.0), temp(31.0)]), DataStability::Secure);
        assert_eq!(e.classify_data_stability(&[]), DataStability::Secure);

        let faults = [
            Measurement::Missing,
            Measurement::Invalid(json!("err")),
            Measurement::Value(f64::NAN),
            Measurement::Value(-127.0),
        ];
        for fault in faults {
            let group = vec![
                temp(22.0),
                reading("2025-01-01 10:30:00", "A1", fault.clone(), Measurement::Missing),
            ];
            assert_eq!(
                e.classify_data_stability(&group),
                DataStability::Anomaly,
                "{fault:?} should be flagged"
            );
        }
    }

    #[test]
    fn test_temperature_stability_threshold() {
        // ---
        let e = engine();
        assert_eq!(e.classify_temperature_stability(&[temp(30.0)]), MetricStability::Safe);
        assert_eq!(e.classify_temperature_stability(&[temp(30.1)]), MetricStability::Anomaly);
        assert_eq!(
            e.classify_temperature_stability(&[temp(20.0), temp(45.0)]),
            MetricStability::Anomaly
        );
    }

    #[test]
    fn test_fault_reading_is_data_anomaly_but_temperature_safe() {
        // ---
        let e = engine();
        let group = vec![
            temp(-127.0),
            reading(
                "2025-01-01 11:00:00",
                "A1",
                Measurement::Invalid(json!("99")),
                Measurement::Missing,
            ),
        ];

        assert_eq!(e.classify_data_stability(&group), DataStability::Anomaly);
        assert_eq!(e.classify_temperature_stability(&group), MetricStability::Safe);
    }

    #[test]
    fn test_humidity_stability_threshold() {
        // ---
        let e = engine();
        let at = |h: Measurement| reading("2025-01-01 10:00:00", "A1", Measurement::Value(25.0), h);

        let stability = |h: Measurement| e.classify_humidity_stability(&[at(h)]);

        assert_eq!(stability(Measurement::Value(70.0)), MetricStability::Safe);
        assert_eq!(stability(Measurement::Value(70.5)), MetricStability::Anomaly);
        assert_eq!(stability(Measurement::Missing), MetricStability::Safe);
        assert_eq!(
            e.classify_humidity_stability(&[at(Measurement::Invalid(json!("wet")))]),
            MetricStability::Safe
        );
    }

    #[test]
    fn test_configured_thresholds() {
        // ---
        let e = Aggregator::new(
            MetricSet::TEMPERATURE_ONLY,
            Thresholds {
                temperature_limit: 25.0,
                humidity_limit: 50.0,
                sensor_fault: -99.0,
            },
        );

        assert_eq!(e.classify_temperature_stability(&[temp(26.0)]), MetricStability::Anomaly);
        assert_eq!(e.classify_data_stability(&[temp(-127.0)]), DataStability::Secure);
        assert_eq!(e.classify_data_stability(&[temp(-99.0)]), DataStability::Anomaly);
    }

    #[test]
    fn test_average() {
        // ---
        let e = engine();
        assert_eq!(e.average_temperature(&[]), None);
        assert_eq!(e.average_temperature(&[temp(20.0), temp(25.0)]), Some(22.5));
        assert_eq!(e.average_temperature(&[temp(24.04), temp(24.06)]), Some(24.1));
        assert_eq!(e.average_temperature(&[temp(28.5), temp(31.2), temp(29.9)]), Some(29.9));
    }

    #[test]
    fn test_average_rounds_only_at_the_tenths_digit() {
        // ---
        let e = engine();
        assert_eq!(e.average_temperature(&[temp(24.0499999999)]), Some(24.0));
        assert_eq!(e.average_temperature(&[temp(24.05)]), Some(24.1));
        assert_eq!(e.average_temperature(&[temp(-2.25)]), Some(-2.3));
        assert_eq!(e.average_temperature(&[temp(-2.2499999)]), Some(-2.2));
        assert_eq!(e.average_temperature(&[temp(0.0)]), Some(0.0));
    }

    #[test]
    fn test_average_of_huge_samples_stays_finite() {
        // ---
        let e = engine();
        assert_eq!(e.average_temperature(&[temp(1e300)]), Some(1e300));
        assert_eq!(e.average_temperature(&[temp(1.7e308), temp(1.7e308)]), Some(1.7e308));

        let series = e.build_series(&[temp(1e300)], "2025-01-01", "A1").unwrap();
        assert_eq!(
            series.temperature,
            SeriesStats {
                min: Some(1e300),
                max: Some(1e300),
                avg: Some(1e300),
            }
        );
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["temperature"]["avg"], json!(1e300));
    }

    #[test]
    fn test_average_skips_bad_samples() {
        // ---
        let e = engine();
        let group = vec![
            temp(24.0),
            temp(-127.0),
            temp(26.0),
            reading("2025-01-01 12:00:00", "A1", Measurement::Missing, Measurement::Missing),
            reading(
                "2025-01-01 12:30:00",
                "A1",
                Measurement::Invalid(json!("x")),
                Measurement::Missing,
            ),
        ];
        assert_eq!(e.average_temperature(&group), Some(25.0));

        let all_bad = vec![temp(-127.0), temp(f64::NAN)];
        assert_eq!(e.average_temperature(&all_bad), None);
    }

    #[test]
    fn test_average_humidity() {
        // ---
        let e = engine();
        let group = vec![
            reading("2025-01-01 10:00:00", "A1", Measurement::Missing, Measurement::Value(55.0)),
            reading("2025-01-01 10:30:00", "A1", Measurement::Missing, Measurement::Value(60.0)),
            reading("2025-01-01 11:00:00", "A1", Measurement::Missing, Measurement::Missing),
        ];
        assert_eq!(e.average_humidity(&group), Some(57.5));
    }

    #[test]
    fn test_build_series_orders_by_time() {
        // ---
        let e = engine();
        let input = vec![
            reading(
                "2025-01-01 12:30:00",
                "A1",
                Measurement::Value(27.0),
                Measurement::Value(60.0),
            ),
            reading(
                "2025-01-01 08:00:00",
                "A1",
                Measurement::Value(22.0),
                Measurement::Value(50.0),
            ),
            reading("2025-01-01 10:15:45", "A1", Measurement::Missing, Measurement::Value(55.0)),
        ];

        let series = e.build_series(&input, "2025-01-01", "A1").unwrap();

        assert_eq!(series.labels, vec!["08:00", "10:15", "12:30"]);
        assert_eq!(
            series.temperature_series,
            vec![Measurement::Value(22.0), Measurement::Missing, Measurement::Value(27.0)]
        );
        assert_eq!(
            series.temperature,
            SeriesStats {
                min: Some(22.0),
                max: Some(27.0),
                avg: Some(24.5),
            }
        );
        assert_eq!(
            series.humidity,
            Some(SeriesStats { min: Some(50.0), max: Some(60.0), avg: Some(55.0) })
        );
        assert_eq!(series.humidity_series.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn test_build_series_is_stable_for_equal_timestamps() {
        // ---
        let e = engine();
        let input = vec![
            reading("2025-01-01 09:00:00", "A1", Measurement::Value(1.0), Measurement::Missing),
            reading("2025-01-01 09:00:00", "A1", Measurement::Value(2.0), Measurement::Missing),
            reading("2025-01-01 08:00:00", "A1", Measurement::Value(3.0), Measurement::Missing),
        ];

        let series = e.build_series(&input, "2025-01-01", "A1").unwrap();
        assert_eq!(
            series.temperature_series,
            vec![Measurement::Value(3.0), Measurement::Value(1.0), Measurement::Value(2.0)]
        );
    }

    #[test]
    fn test_build_series_without_samples() {
        // ---
        let e = engine();

        let empty = e.build_series(&[], "2025-01-01", "A1").unwrap();
        assert!(empty.labels.is_empty());
        assert!(empty.temperature_series.is_empty());
        assert_eq!(empty.temperature, SeriesStats::default());
        assert_eq!(empty.humidity, Some(SeriesStats::default()));

        let faults = vec![temp(-127.0)];
        let series = e.build_series(&faults, "2025-01-01", "A1").unwrap();
        assert_eq!(series.temperature_series, vec![Measurement::Value(-127.0)]);
        assert_eq!(series.temperature, SeriesStats::default());
    }

    #[test]
    fn test_build_series_temperature_only() {
        // ---
        let e = Aggregator::new(MetricSet::TEMPERATURE_ONLY, Thresholds::default());
        let series = e.build_series(&[temp(21.0)], "2025-01-01", "A1").unwrap();

        assert_eq!(series.humidity, None);
        assert_eq!(series.humidity_series, None);

        let json = serde_json::to_value(&series).unwrap();
        assert!(json.get("humiditySeries").is_none());
        assert_eq!(json["temperature"]["avg"], json!(21.0));
    }

    #[test]
    fn test_build_series_rejects_malformed_timestamp() {
        // ---
        let e = engine();
        let input = vec![
            temp(21.0),
            reading("yesterday", "A1", Measurement::Value(22.0), Measurement::Missing),
        ];

        assert!(matches!(
            e.build_series(&input, "2025-01-01", "A1"),
            Err(ReportError::MalformedTimestamp { .. })
        ));
    }

    #[test]
    fn test_group_by_date_descending() {
        // ---
        let input = vec![
            reading("2025-01-01 10:00:00", "A1", Measurement::Value(20.0), Measurement::Missing),
            reading("2025-01-03 10:00:00", "A1", Measurement::Value(21.0), Measurement::Missing),
            reading("2025-01-01 23:59:59", "B2", Measurement::Value(22.0), Measurement::Missing),
            reading("2024-12-31 00:00:00", "A1", Measurement::Value(23.0), Measurement::Missing),
        ];

        let days = group_by_date(input).unwrap();
        let dates: Vec<String> = days.iter().map(|(d, _)| d.to_string()).collect();

        assert_eq!(dates, vec!["2025-01-03", "2025-01-01", "2024-12-31"]);
        assert_eq!(days[1].1.len(), 2);
    }

    #[test]
    fn test_group_by_room_keeps_first_appearance_order() {
        // ---
        let input = vec![
            reading("2025-01-01 10:00:00", "B2", Measurement::Value(20.0), Measurement::Missing),
            reading("2025-01-01 10:30:00", "A1", Measurement::Value(21.0), Measurement::Missing),
            reading("2025-01-01 11:00:00", "B2", Measurement::Value(22.0), Measurement::Missing),
            reading("2025-01-01 11:30:00", "a1", Measurement::Value(23.0), Measurement::Missing),
        ];

        let rooms = group_by_room(input);
        let names: Vec<&str> = rooms.iter().map(|(r, _)| r.as_str()).collect();

        assert_eq!(names, vec!["B2", "A1", "a1"]);
        assert_eq!(rooms[0].1.len(), 2);
    }

    #[test]
    fn test_room_report_scenario() {
        // ---
        let e = engine();
        let group = vec![temp(32.0), temp(28.0)];
        let report = e.room_report("A1", "2025-01-01", &group);

        assert_eq!(report.avg_temperature, Some(30.0));
        assert_eq!(report.temperature_stability, MetricStability::Anomaly);
        assert_eq!(report.data_stability, DataStability::Secure);
        assert_eq!(report.avg_humidity, Some(None));
        assert_eq!(report.humidity_stability, Some(MetricStability::Safe));
    }

    #[test]
    fn test_day_report_temperature_only_omits_humidity() {
        // ---
        let e = Aggregator::new(MetricSet::TEMPERATURE_ONLY, Thresholds::default());
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let report = e.day_report(date, &[temp(25.0)]);

        assert_eq!(report.humidity_stability, None);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["date"], json!("2025-01-01"));
        assert!(json.get("humidityStability").is_none());
    }
}
