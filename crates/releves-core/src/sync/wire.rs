//! Server wire format
//!
//! The server names entry fields `dt, s1, s2, s3, elec, app`; everything
//! local uses `date, sensor1..3, meterIndex, supplementFlag`. All translation
//! between the two vocabularies goes through this module.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::gateway::{GatewayError, GatewayResult, SaveResponse};
use crate::models::{flag, text_or_empty, Entry, EntryDraft, Field, FieldError, Scalar};

/// `returnCode` of an accepted save.
pub const RETURN_CODE_OK: &str = "OK";
/// `returnCode` of a rejected save.
pub const RETURN_CODE_KO: &str = "KO";

const FIELD_NAMES: [(Field, &str); 6] = [
    (Field::Date, "dt"),
    (Field::Sensor1, "s1"),
    (Field::Sensor2, "s2"),
    (Field::Sensor3, "s3"),
    (Field::MeterIndex, "elec"),
    (Field::SupplementFlag, "app"),
];

/// Server name of a local field. Whole-entry errors travel as `"id"`.
pub fn server_field_name(field: Field) -> &'static str {
    FIELD_NAMES
        .iter()
        .find(|(local, _)| *local == field)
        .map_or("id", |(_, server)| *server)
}

/// Local field for a server field name.
///
/// Local names are accepted too; anything unknown is attached to the entry
/// as a whole.
pub fn field_from_server(name: &str) -> Field {
    let name = name.trim();
    FIELD_NAMES
        .iter()
        .find(|(local, server)| *server == name || local.as_str() == name)
        .map_or(Field::Entry, |(local, _)| *local)
}

/// Id sent to the server: provisional ids mean "create" and go over as 0.
pub const fn to_server_id(id: i64) -> i64 {
    if id < 0 {
        0
    } else {
        id
    }
}

/// An entry in the server vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    #[serde(default, deserialize_with = "server_id")]
    pub id: i64,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub dt: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub s1: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub s2: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub s3: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub elec: String,
    #[serde(default, deserialize_with = "flag", serialize_with = "flag_as_int")]
    pub app: bool,
}

impl ServerEntry {
    /// Wire form of a local entry, ready for a create-or-update request.
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            id: to_server_id(entry.id),
            dt: entry.timestamp.clone(),
            s1: entry.sensor_reading1.clone(),
            s2: entry.sensor_reading2.clone(),
            s3: entry.sensor_reading3.clone(),
            elec: entry.meter_index.clone(),
            app: entry.supplement_flag,
        }
    }

    /// Local entry as confirmed by the server (never dirty).
    pub fn into_entry(self) -> Entry {
        EntryDraft {
            id: self.id,
            timestamp: Some(self.dt),
            sensor1: Some(self.s1),
            sensor2: Some(self.s2),
            sensor3: Some(self.s3),
            meter_index: Some(self.elec),
            supplement_flag: self.app,
            dirty: false,
        }
        .into()
    }

    /// Form fields of the save request, in the order the server lists them.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("id", self.id.to_string()),
            ("dt", self.dt.clone()),
            ("s1", self.s1.clone()),
            ("s2", self.s2.clone()),
            ("s3", self.s3.clone()),
            ("elec", self.elec.clone()),
            ("app", if self.app { "1" } else { "0" }.to_string()),
        ]
    }
}

/// A per-field error as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFieldError {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub message: String,
}

impl From<&FieldError> for ServerFieldError {
    fn from(error: &FieldError) -> Self {
        Self {
            field: server_field_name(error.field).to_string(),
            message: error.message.clone(),
        }
    }
}

impl From<ServerFieldError> for FieldError {
    fn from(error: ServerFieldError) -> Self {
        Self::new(field_from_server(&error.field), error.message)
    }
}

/// Body of a save response: `{"content": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveEnvelope {
    pub content: SaveContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveContent {
    pub return_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ServerFieldError>,
}

impl SaveEnvelope {
    pub fn accepted(id: i64) -> Self {
        Self {
            content: SaveContent {
                return_code: RETURN_CODE_OK.to_string(),
                id: Some(id),
                errors: Vec::new(),
            },
        }
    }

    pub fn rejected(errors: &[FieldError]) -> Self {
        Self {
            content: SaveContent {
                return_code: RETURN_CODE_KO.to_string(),
                id: None,
                errors: errors.iter().map(ServerFieldError::from).collect(),
            },
        }
    }

    pub fn into_response(self) -> GatewayResult<SaveResponse> {
        let content = self.content;
        match content.return_code.trim() {
            RETURN_CODE_OK => content.id.filter(|id| *id > 0).map_or_else(
                || {
                    Err(GatewayError::InvalidPayload(
                        "accepted save did not include a positive id".to_string(),
                    ))
                },
                |id| Ok(SaveResponse::accepted(id)),
            ),
            RETURN_CODE_KO => Ok(SaveResponse::rejected(
                content.errors.into_iter().map(FieldError::from).collect(),
            )),
            other => Err(GatewayError::InvalidPayload(format!(
                "unknown returnCode: {other}"
            ))),
        }
    }
}

/// Body of a list response: `{"RelevesList": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEnvelope {
    #[serde(rename = "RelevesList", default)]
    pub entries: Vec<ServerEntry>,
}

/// Body of the connectivity probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeEnvelope {
    pub content: String,
}

fn server_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Scalar::Int(id)) => Ok(id),
        Some(Scalar::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                Ok(0)
            } else {
                text.parse()
                    .map_err(|_| D::Error::custom(format!("invalid entry id: {text}")))
            }
        }
        Some(Scalar::Bool(_) | Scalar::Float(_)) => {
            Err(D::Error::custom("entry id must be an integer"))
        }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn flag_as_int<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(u8::from(*value))
}
