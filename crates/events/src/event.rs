//! The inbound event envelope and its domain view.
//!
//! The notification service pushes a cloud-event envelope whose `data`
//! array holds destination-table records describing a completed ingest:
//!
//! ```json
//! {
//!   "eventID": "...", "eventType": "org.dispatch.ingest",
//!   "data": [
//!     {"destinationTable": "Transactions.submitter", "value": 10},
//!     {"destinationTable": "TransactionKeyValue",
//!      "key": "uppercase_text", "value": "false"},
//!     {"destinationTable": "Files", "_id": 92,
//!      "name": "hello.txt", "subdir": "a/b"}
//!   ]
//! }
//! ```
//!
//! [`IngestEvent::from_envelope`] lifts that into a typed, immutable view
//! while keeping the raw envelope for predicate evaluation.

use dispatchd_core::types::DbId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error produced while interpreting a notification envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The envelope has no `data` member, or it is not an array.
    #[error("envelope has no `data` array")]
    MissingData,
}

/// A name/value annotation attached to a transaction.
///
/// Used as marker flags; the `uppercase_text` pair both triggers handling
/// (`"false"`) and suppresses reprocessing of handler output (`"true"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A reference to a file that was part of the triggering event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Platform file id, used to request a download.
    pub id: DbId,
    pub name: String,
    /// Sub-directory the file occupied within its transaction, if any.
    pub subdir: Option<String>,
}

/// The domain view of a received notification. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct IngestEvent {
    pub event_id: Option<String>,
    pub event_type: Option<String>,
    pub submitter: Option<DbId>,
    pub instrument: Option<DbId>,
    pub project: Option<String>,
    pub key_values: Vec<KeyValue>,
    pub files: Vec<FileRef>,
    /// The raw envelope, retained for predicate evaluation.
    pub payload: Value,
}

impl IngestEvent {
    /// Interpret a notification envelope.
    ///
    /// Records with an unknown `destinationTable` are ignored; records
    /// missing required fields are skipped with a warning. Only a missing
    /// or non-array `data` member is an error.
    pub fn from_envelope(envelope: Value) -> Result<Self, EnvelopeError> {
        let data = envelope
            .get("data")
            .and_then(Value::as_array)
            .ok_or(EnvelopeError::MissingData)?;

        let mut event = Self {
            event_id: str_field(&envelope, "eventID"),
            event_type: str_field(&envelope, "eventType"),
            submitter: None,
            instrument: None,
            project: None,
            key_values: Vec::new(),
            files: Vec::new(),
            payload: Value::Null,
        };

        for record in data {
            let Some(table) = record.get("destinationTable").and_then(Value::as_str) else {
                tracing::warn!("Envelope record has no destinationTable, skipping");
                continue;
            };

            match table {
                "Transactions.submitter" => {
                    event.submitter = record.get("value").and_then(Value::as_i64);
                }
                "Transactions.instrument" => {
                    event.instrument = record.get("value").and_then(Value::as_i64);
                }
                "Transactions.project" => {
                    event.project = record.get("value").map(value_to_string);
                }
                "TransactionKeyValue" => {
                    match (str_field(record, "key"), str_field(record, "value")) {
                        (Some(key), Some(value)) => {
                            event.key_values.push(KeyValue { key, value });
                        }
                        _ => tracing::warn!(table, "Key-value record missing key or value"),
                    }
                }
                "Files" => match (record.get("_id").and_then(Value::as_i64), str_field(record, "name")) {
                    (Some(id), Some(name)) => {
                        event.files.push(FileRef {
                            id,
                            name,
                            subdir: str_field(record, "subdir").filter(|s| !s.is_empty()),
                        });
                    }
                    _ => tracing::warn!(table, "File record missing _id or name"),
                },
                // Other metadata tables are not needed for dispatch.
                _ => {}
            }
        }

        event.payload = envelope;
        Ok(event)
    }

    /// Look up a transaction key-value by key.
    pub fn key_value(&self, key: &str) -> Option<&str> {
        self.key_values
            .iter()
            .find(|kv| kv.key == key)
            .map(|kv| kv.value.as_str())
    }
}

fn str_field(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Render a scalar JSON value as a string (projects arrive as either).
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
