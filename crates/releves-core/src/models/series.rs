//! Chart-ready sensor series

use serde::Serialize;

use super::validation::parse_decimal;
use super::EntryCollection;

/// One point of a sensor series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Reading time, Unix epoch milliseconds
    pub timestamp_ms: i64,
    pub value: f64,
}

/// The three sensor series of a collection, oldest reading first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensorSeries {
    pub sensor1: Vec<SeriesPoint>,
    pub sensor2: Vec<SeriesPoint>,
    pub sensor3: Vec<SeriesPoint>,
}

impl SensorSeries {
    pub fn len(&self) -> usize {
        self.sensor1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensor1.is_empty()
    }
}

/// Extract sensor series from every entry carrying a full numeric sensor set.
///
/// Meter-only entries and entries with unusable timestamps are skipped.
pub fn sensor_series(collection: &EntryCollection) -> SensorSeries {
    let mut points = collection
        .iter()
        .filter_map(|entry| {
            let seconds = entry.epoch_seconds()?;
            let [s1, s2, s3] = entry.sensors().map(parse_decimal);
            Some((seconds.saturating_mul(1000), s1?, s2?, s3?))
        })
        .collect::<Vec<_>>();
    points.sort_by_key(|(timestamp_ms, ..)| *timestamp_ms);

    let mut series = SensorSeries::default();
    for (timestamp_ms, s1, s2, s3) in points {
        series.sensor1.push(SeriesPoint {
            timestamp_ms,
            value: s1,
        });
        series.sensor2.push(SeriesPoint {
            timestamp_ms,
            value: s2,
        });
        series.sensor3.push(SeriesPoint {
            timestamp_ms,
            value: s3,
        });
    }
    series
}
