//! Entry validation rules
//!
//! Checks run in a fixed order and accumulate; the order of the returned
//! errors is the order in which a form should display them.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Entry;
use crate::util::{local_epoch_seconds, local_now, parse_timestamp};

static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)$").expect("valid decimal regex"));

static INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+$").expect("valid integer regex"));

/// Entry field an error is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Date,
    Sensor1,
    Sensor2,
    Sensor3,
    MeterIndex,
    SupplementFlag,
    /// Error about the entry as a whole
    Entry,
}

impl Field {
    /// Local vocabulary name of the field.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Sensor1 => "sensor1",
            Self::Sensor2 => "sensor2",
            Self::Sensor3 => "sensor3",
            Self::MeterIndex => "meterIndex",
            Self::SupplementFlag => "supplementFlag",
            Self::Entry => "entry",
        }
    }

    const fn sensor(index: usize) -> Self {
        match index {
            0 => Self::Sensor1,
            1 => Self::Sensor2,
            _ => Self::Sensor3,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-correctable problem with one field of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate an entry against the current local time.
pub fn validate(entry: &Entry) -> Vec<FieldError> {
    validate_at(entry, local_now())
}

/// Validate an entry, treating `now` as the evaluation time.
pub fn validate_at(entry: &Entry, now: NaiveDateTime) -> Vec<FieldError> {
    validate_with(entry, now, local_epoch_seconds)
}

/// Validate with an explicit mapping from local time to epoch seconds.
///
/// A timestamp the mapping cannot place (a local time skipped by a DST
/// change) is a date error.
fn validate_with(
    entry: &Entry,
    now: NaiveDateTime,
    epoch_of: impl Fn(&NaiveDateTime) -> Option<i64>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    check_timestamp(entry, now, &epoch_of, &mut errors);

    let present = entry.sensor_count();
    if present == 1 || present == 2 {
        errors.push(FieldError::new(
            Field::Sensor1,
            "All the sensors or none should be populated.",
        ));
    }

    let mut readings = [None; 3];
    for (index, raw) in entry.sensors().iter().enumerate() {
        if raw.is_empty() {
            continue;
        }
        readings[index] = parse_decimal(raw);
        if readings[index].is_none() {
            errors.push(FieldError::new(
                Field::sensor(index),
                format!("Incorrect value for sensor {}.", index + 1),
            ));
        }
    }

    if let [Some(_), Some(sensor2), Some(sensor3)] = readings {
        if sensor2 > sensor3 {
            errors.push(FieldError::new(
                Field::Sensor3,
                "Sensor 2 cannot be greater than sensor 3.",
            ));
        }
    }

    if entry.has_meter_index() {
        if !parse_integer(&entry.meter_index).is_some_and(|index| index > 0) {
            errors.push(FieldError::new(
                Field::MeterIndex,
                "Meter index should be an integer greater than 0.",
            ));
        }
    } else if present == 0 {
        errors.push(FieldError::new(
            Field::Sensor1,
            "Sensors or meter index should be populated.",
        ));
    }

    errors
}

fn check_timestamp(
    entry: &Entry,
    now: NaiveDateTime,
    epoch_of: &impl Fn(&NaiveDateTime) -> Option<i64>,
    errors: &mut Vec<FieldError>,
) {
    if entry.timestamp.is_empty() {
        errors.push(FieldError::new(Field::Date, "Date is mandatory."));
        return;
    }

    match parse_timestamp(&entry.timestamp) {
        None => errors.push(FieldError::new(
            Field::Date,
            "Date is incorrect, expected YYYY-MM-DD HH:MM:SS.",
        )),
        Some(taken_at) if taken_at > now => {
            errors.push(FieldError::new(Field::Date, "Date cannot be in the future."));
        }
        Some(taken_at) if epoch_of(&taken_at).is_none() => {
            errors.push(FieldError::new(
                Field::Date,
                "Date does not exist in the local time zone.",
            ));
        }
        Some(_) => {}
    }
}

/// Parse a sensor reading; only plain decimal notation is accepted.
pub fn parse_decimal(value: &str) -> Option<f64> {
    let value = value.trim();
    if DECIMAL_RE.is_match(value) {
        value.parse().ok()
    } else {
        None
    }
}

/// Parse a meter index.
pub fn parse_integer(value: &str) -> Option<i64> {
    let value = value.trim();
    if INTEGER_RE.is_match(value) {
        value.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn now() -> NaiveDateTime {
        parse_timestamp("2024-06-01 12:00:00").unwrap()
    }

    fn fields(errors: &[FieldError]) -> Vec<Field> {
        errors.iter().map(|error| error.field).collect()
    }

    fn reading() -> Entry {
        Entry::new("2024-01-01 10:00:00")
    }

    #[test]
    fn test_complete_sensor_entry_is_valid() {
        let entry = reading().with_sensors("20", "5", "6");
        assert!(validate_at(&entry, now()).is_empty());
    }

    #[test]
    fn test_meter_only_entry_is_valid() {
        let entry = reading().with_meter_index("1200");
        assert!(validate_at(&entry, now()).is_empty());
    }

    #[test]
    fn test_partial_sensor_sets_are_rejected() {
        let partials = [
            ("20", "", ""),
            ("", "5", ""),
            ("", "", "6"),
            ("20", "5", ""),
            ("20", "", "6"),
            ("", "5", "6"),
        ];
        for (s1, s2, s3) in partials {
            let entry = reading().with_sensors(s1, s2, s3).with_meter_index("10");
            let errors = validate_at(&entry, now());
            assert!(
                errors
                    .iter()
                    .any(|error| error.field == Field::Sensor1
                        && error.message.contains("All the sensors")),
                "expected sensor-presence error for {s1:?}/{s2:?}/{s3:?}"
            );
        }
    }

    #[test]
    fn test_empty_entry_requires_sensors_or_meter() {
        let errors = validate_at(&reading(), now());
        assert_eq!(fields(&errors), vec![Field::Sensor1]);
        assert!(errors[0].message.contains("meter index"));
    }

    #[test]
    fn test_sensor2_greater_than_sensor3_flags_sensor3() {
        let entry = reading().with_sensors("20", "10", "9");
        assert_eq!(fields(&validate_at(&entry, now())), vec![Field::Sensor3]);
    }

    #[test]
    fn test_sensor_comparison_is_numeric() {
        // "10" > "9" as text, but not as numbers
        let entry = reading().with_sensors("20", "9", "10");
        assert!(validate_at(&entry, now()).is_empty());
    }

    #[test]
    fn test_timestamp_rules() {
        let missing = Entry::new("").with_meter_index("1");
        assert_eq!(
            validate_at(&missing, now())[0],
            FieldError::new(Field::Date, "Date is mandatory.")
        );

        let malformed = Entry::new("01/01/2024 10:00").with_meter_index("1");
        assert_eq!(fields(&validate_at(&malformed, now())), vec![Field::Date]);

        let future = Entry::new("2024-06-01 12:00:01").with_meter_index("1");
        let errors = validate_at(&future, now());
        assert_eq!(errors[0].message, "Date cannot be in the future.");

        let exactly_now = Entry::new("2024-06-01 12:00:00").with_meter_index("1");
        assert!(validate_at(&exactly_now, now()).is_empty());
    }

    #[test]
    fn test_skipped_local_time_is_a_date_error() {
        let skipped = parse_timestamp("2024-03-31 02:30:00").unwrap();
        let spring_forward = |taken_at: &NaiveDateTime| {
            (*taken_at != skipped).then(|| taken_at.and_utc().timestamp())
        };

        let in_gap = Entry::new("2024-03-31 02:30:00").with_meter_index("10");
        assert_eq!(
            validate_with(&in_gap, now(), spring_forward),
            vec![FieldError::new(
                Field::Date,
                "Date does not exist in the local time zone."
            )]
        );

        let after_gap = Entry::new("2024-03-31 03:30:00").with_meter_index("10");
        assert!(validate_with(&after_gap, now(), spring_forward).is_empty());
    }

    #[test]
    fn test_meter_index_must_be_positive_integer() {
        for bad in ["0", "-3", "12.5", "abc"] {
            let entry = reading().with_meter_index(bad);
            assert_eq!(
                fields(&validate_at(&entry, now())),
                vec![Field::MeterIndex],
                "meter index {bad:?}"
            );
        }
    }

    #[test]
    fn test_non_numeric_sensor_is_attached_to_its_field() {
        let entry = reading().with_sensors("20", "warm", "6");
        assert_eq!(fields(&validate_at(&entry, now())), vec![Field::Sensor2]);
    }

    #[test]
    fn test_errors_accumulate_in_fixed_order() {
        let entry = Entry::new("").with_sensors("20", "", "").with_meter_index("0");
        assert_eq!(
            fields(&validate_at(&entry, now())),
            vec![Field::Date, Field::Sensor1, Field::MeterIndex]
        );
    }

    #[test]
    fn test_parse_decimal_accepts_plain_numbers_only() {
        assert_eq!(parse_decimal("20"), Some(20.0));
        assert_eq!(parse_decimal("-1.5"), Some(-1.5));
        assert_eq!(parse_decimal(".5"), Some(0.5));
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal("1e3"), None);
    }
}
