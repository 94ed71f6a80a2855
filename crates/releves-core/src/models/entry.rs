//! Entry model

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::util::{format_timestamp, local_epoch_seconds, local_now, parse_timestamp};

/// Reconciliation state of an entry, derived from its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    /// Never saved anywhere (`id == 0`)
    New,
    /// Saved locally with a provisional identifier (`id < 0`)
    PendingServer,
    /// Identifier assigned by the server (`id > 0`)
    Confirmed,
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::New => "new",
            Self::PendingServer => "pending",
            Self::Confirmed => "confirmed",
        };
        f.write_str(label)
    }
}

/// One sensor/meter reading.
///
/// Optional numeric fields are kept as text: an empty string means absent.
/// The serialized form uses the local field vocabulary
/// (`date`, `sensor1..3`, `meterIndex`, `supplementFlag`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Server id when positive, provisional id when negative, 0 when new
    #[serde(default)]
    pub id: i64,
    /// Local reading time, `YYYY-MM-DD HH:MM:SS`
    #[serde(rename = "date", default, deserialize_with = "text_or_empty")]
    pub timestamp: String,
    #[serde(rename = "sensor1", default, deserialize_with = "text_or_empty")]
    pub sensor_reading1: String,
    #[serde(rename = "sensor2", default, deserialize_with = "text_or_empty")]
    pub sensor_reading2: String,
    #[serde(rename = "sensor3", default, deserialize_with = "text_or_empty")]
    pub sensor_reading3: String,
    /// Cumulative meter counter
    #[serde(default, deserialize_with = "text_or_empty")]
    pub meter_index: String,
    #[serde(default, deserialize_with = "flag")]
    pub supplement_flag: bool,
    /// Local state not yet confirmed by the server
    #[serde(default, deserialize_with = "flag")]
    pub dirty: bool,
}

/// Field values as submitted by a form or decoded from another vocabulary.
///
/// `None` and blank values both normalize to "absent".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryDraft {
    pub id: i64,
    pub timestamp: Option<String>,
    pub sensor1: Option<String>,
    pub sensor2: Option<String>,
    pub sensor3: Option<String>,
    pub meter_index: Option<String>,
    pub supplement_flag: bool,
    pub dirty: bool,
}

impl From<EntryDraft> for Entry {
    fn from(draft: EntryDraft) -> Self {
        Self {
            id: draft.id,
            timestamp: normalize(draft.timestamp),
            sensor_reading1: normalize(draft.sensor1),
            sensor_reading2: normalize(draft.sensor2),
            sensor_reading3: normalize(draft.sensor3),
            meter_index: normalize(draft.meter_index),
            supplement_flag: draft.supplement_flag,
            dirty: draft.dirty,
        }
    }
}

impl Entry {
    /// Create a new (id 0) entry taken at `timestamp` with no readings.
    #[must_use]
    pub fn new(timestamp: impl Into<String>) -> Self {
        EntryDraft {
            timestamp: Some(timestamp.into()),
            dirty: true,
            ..EntryDraft::default()
        }
        .into()
    }

    /// Create an empty new entry stamped with the current local time.
    #[must_use]
    pub fn empty_now() -> Self {
        Self::new(format_timestamp(&local_now()))
    }

    /// Set the three sensor readings.
    #[must_use]
    pub fn with_sensors(
        mut self,
        sensor1: impl Into<String>,
        sensor2: impl Into<String>,
        sensor3: impl Into<String>,
    ) -> Self {
        self.sensor_reading1 = normalize(Some(sensor1.into()));
        self.sensor_reading2 = normalize(Some(sensor2.into()));
        self.sensor_reading3 = normalize(Some(sensor3.into()));
        self
    }

    /// Set the meter index.
    #[must_use]
    pub fn with_meter_index(mut self, meter_index: impl Into<String>) -> Self {
        self.meter_index = normalize(Some(meter_index.into()));
        self
    }

    #[must_use]
    pub const fn with_supplement(mut self, supplement: bool) -> Self {
        self.supplement_flag = supplement;
        self
    }

    #[must_use]
    pub const fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub const fn with_dirty(mut self, dirty: bool) -> Self {
        self.dirty = dirty;
        self
    }

    /// Re-apply field normalization (trim, blank means absent).
    #[must_use]
    pub fn normalized(self) -> Self {
        self.into_draft().into()
    }

    /// Convert back into a draft, mapping empty fields to `None`.
    #[must_use]
    pub fn into_draft(self) -> EntryDraft {
        EntryDraft {
            id: self.id,
            timestamp: present(self.timestamp),
            sensor1: present(self.sensor_reading1),
            sensor2: present(self.sensor_reading2),
            sensor3: present(self.sensor_reading3),
            meter_index: present(self.meter_index),
            supplement_flag: self.supplement_flag,
            dirty: self.dirty,
        }
    }

    pub const fn state(&self) -> EntryState {
        match self.id {
            0 => EntryState::New,
            id if id < 0 => EntryState::PendingServer,
            _ => EntryState::Confirmed,
        }
    }

    pub const fn is_new(&self) -> bool {
        self.id == 0
    }

    pub const fn is_provisional(&self) -> bool {
        self.id < 0
    }

    pub const fn is_confirmed(&self) -> bool {
        self.id > 0
    }

    /// The three sensor readings, in order.
    pub fn sensors(&self) -> [&str; 3] {
        [
            self.sensor_reading1.as_str(),
            self.sensor_reading2.as_str(),
            self.sensor_reading3.as_str(),
        ]
    }

    /// Number of non-empty sensor readings.
    pub fn sensor_count(&self) -> usize {
        self.sensors().iter().filter(|value| !value.is_empty()).count()
    }

    pub fn has_meter_index(&self) -> bool {
        !self.meter_index.is_empty()
    }

    /// Provisional id derived from the timestamp: negated local epoch seconds.
    ///
    /// Returns `None` when the timestamp does not parse or names a local time
    /// that does not exist.
    pub fn derive_provisional_id(&self) -> Option<i64> {
        let parsed = parse_timestamp(&self.timestamp)?;
        local_epoch_seconds(&parsed).map(|seconds| -seconds)
    }

    /// Reading time in local epoch seconds.
    pub fn epoch_seconds(&self) -> Option<i64> {
        parse_timestamp(&self.timestamp).and_then(|parsed| local_epoch_seconds(&parsed))
    }
}

fn normalize(value: Option<String>) -> String {
    value.map(|value| value.trim().to_string()).unwrap_or_default()
}

fn present(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Scalar accepted where an optional text field is expected.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub(crate) fn into_text(self) -> String {
        match self {
            Self::Bool(value) => if value { "1" } else { "0" }.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Text(value) => value.trim().to_string(),
        }
    }

    pub(crate) fn into_flag(self) -> bool {
        match self {
            Self::Bool(value) => value,
            Self::Int(value) => value != 0,
            Self::Float(value) => value != 0.0,
            Self::Text(value) => matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ),
        }
    }
}

/// Deserialize `null`, a number or a string into text, `null` becoming empty.
pub(crate) fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .map(Scalar::into_text)
        .unwrap_or_default())
}

/// Deserialize a boolean-like value (`true`, `1`, `"1"`, `"on"`, ...).
pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.is_some_and(Scalar::into_flag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_entry_new_is_blank_and_dirty() {
        let entry = Entry::new("2024-01-01 10:00:00");
        assert_eq!(entry.id, 0);
        assert_eq!(entry.state(), EntryState::New);
        assert!(entry.dirty);
        assert_eq!(entry.sensor_count(), 0);
        assert!(!entry.has_meter_index());
        assert!(!entry.supplement_flag);
    }

    #[test]
    fn test_draft_normalizes_missing_and_blank_fields() {
        let entry: Entry = EntryDraft {
            timestamp: Some(" 2024-01-01 10:00:00 ".to_string()),
            sensor1: Some(" 20 ".to_string()),
            sensor2: None,
            sensor3: Some("   ".to_string()),
            ..EntryDraft::default()
        }
        .into();

        assert_eq!(entry.timestamp, "2024-01-01 10:00:00");
        assert_eq!(entry.sensor_reading1, "20");
        assert_eq!(entry.sensor_reading2, "");
        assert_eq!(entry.sensor_reading3, "");
        assert_eq!(entry.meter_index, "");
        assert_eq!(entry.sensor_count(), 1);
    }

    #[test]
    fn test_state_follows_id_sign() {
        let entry = Entry::new("2024-01-01 10:00:00");
        assert_eq!(entry.clone().with_id(-5).state(), EntryState::PendingServer);
        assert_eq!(entry.clone().with_id(42).state(), EntryState::Confirmed);
        assert!(entry.clone().with_id(-5).is_provisional());
        assert!(entry.with_id(42).is_confirmed());
    }

    #[test]
    fn test_derive_provisional_id_negates_local_epoch() {
        let entry = Entry::new("2024-01-01 10:00:00");
        let parsed = parse_timestamp("2024-01-01 10:00:00").unwrap();
        let expected = -local_epoch_seconds(&parsed).unwrap();
        assert_eq!(entry.derive_provisional_id(), Some(expected));
        assert!(expected < 0);
    }

    #[test]
    fn test_derive_provisional_id_rejects_bad_timestamp() {
        assert_eq!(Entry::new("yesterday").derive_provisional_id(), None);
        assert_eq!(Entry::new("").derive_provisional_id(), None);
    }

    #[test]
    fn test_deserialize_coerces_nulls_and_numbers() {
        let payload = r#"{
            "id": -1704099600,
            "date": "2024-01-01 10:00:00",
            "sensor1": 20.5,
            "sensor2": null,
            "sensor3": "6",
            "supplementFlag": 1,
            "dirty": "1"
        }"#;
        let entry: Entry = serde_json::from_str(payload).unwrap();
        assert_eq!(entry.sensor_reading1, "20.5");
        assert_eq!(entry.sensor_reading2, "");
        assert_eq!(entry.sensor_reading3, "6");
        assert_eq!(entry.meter_index, "");
        assert!(entry.supplement_flag);
        assert!(entry.dirty);
    }

    #[test]
    fn test_serialize_uses_local_vocabulary() {
        let entry = Entry::new("2024-01-01 10:00:00")
            .with_sensors("20", "5", "6")
            .with_meter_index("1200");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["date"], "2024-01-01 10:00:00");
        assert_eq!(value["sensor1"], "20");
        assert_eq!(value["meterIndex"], "1200");
        assert_eq!(value["supplementFlag"], false);
        assert_eq!(value["dirty"], true);
    }
}
