//! Record - Schema-less Persisted Object
//!
//! TigerStyle: Explicit id, open field bag, typed accessors.
//!
//! A record is an id plus arbitrary JSON fields. It is stored as one flat
//! JSON object with `id` alongside the fields:
//!
//! ```json
//! {"id": "u1", "name": "Alex", "created_at": "2024-05-01T09:00:00.000000Z"}
//! ```

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::clock::parse_timestamp;
use crate::constants::{FIELD_CREATED_AT, FIELD_ID, FIELD_UPDATED_AT};
use crate::storage::{StorageError, StorageResult};

/// Field bag of a record (everything except `id`).
pub type Fields = Map<String, Value>;

// =============================================================================
// IntoFields
// =============================================================================

/// Values accepted as record data.
pub trait IntoFields {
    /// Convert into a field bag.
    ///
    /// # Errors
    /// Returns a validation error if the value is not a JSON object.
    fn into_fields(self) -> StorageResult<Fields>;
}

impl IntoFields for Fields {
    fn into_fields(self) -> StorageResult<Fields> {
        Ok(self)
    }
}

impl IntoFields for Value {
    fn into_fields(self) -> StorageResult<Fields> {
        match self {
            Value::Object(map) => Ok(map),
            other => Err(StorageError::validation(format!(
                "record data must be a JSON object, got {}",
                kind_of(&other)
            ))),
        }
    }
}

impl IntoFields for Record {
    fn into_fields(self) -> StorageResult<Fields> {
        let mut fields = self.fields;
        fields.insert(FIELD_ID.to_string(), Value::String(self.id));
        Ok(fields)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

/// Normalise a caller-supplied id value.
///
/// Strings are kept, numbers and booleans are stringified, `null` means
/// "no id". Lists and maps are rejected.
///
/// # Errors
/// Returns a validation error for list or map ids.
pub fn id_from_value(value: &Value) -> StorageResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(StorageError::validation(format!(
            "record id must be a scalar, got {}",
            kind_of(other)
        ))),
    }
}

/// Field equality used by filters.
///
/// Numbers compare by value, so `1` equals `1.0`.
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(i), Some(j)) = (x.as_i64(), y.as_i64()) {
                return i == j;
            }
            if let (Some(i), Some(j)) = (x.as_u64(), y.as_u64()) {
                return i == j;
            }
            x.as_f64() == y.as_f64()
        }
        _ => a == b,
    }
}

// =============================================================================
// Record
// =============================================================================

/// One persisted object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique id within the collection
    pub id: String,
    /// Every other field
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    /// Create a record with no fields.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Fields::new(),
        }
    }

    /// Create a record from an id and a field bag.
    ///
    /// An `id` entry inside `fields` is dropped; the explicit id wins.
    #[must_use]
    pub fn from_fields(id: impl Into<String>, mut fields: Fields) -> Self {
        fields.remove(FIELD_ID);
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Add a field (builder style).
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field. Setting `id` is ignored; ids are immutable.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        if field == FIELD_ID {
            return;
        }
        self.fields.insert(field, value.into());
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Raw field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Check if a field is present.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// String field.
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Integer field.
    #[must_use]
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    /// Floating-point field (integers widen).
    #[must_use]
    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    /// Boolean field.
    #[must_use]
    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    /// List field.
    #[must_use]
    pub fn get_list(&self, field: &str) -> Option<&Vec<Value>> {
        self.get(field).and_then(Value::as_array)
    }

    /// Nested map field.
    #[must_use]
    pub fn get_map(&self, field: &str) -> Option<&Map<String, Value>> {
        self.get(field).and_then(Value::as_object)
    }

    /// Creation time, if stamped and parseable.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.get_str(FIELD_CREATED_AT).and_then(parse_timestamp)
    }

    /// Last update time, if stamped and parseable.
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.get_str(FIELD_UPDATED_AT).and_then(parse_timestamp)
    }

    /// Check one equality constraint. A missing field equals `null`.
    #[must_use]
    pub fn field_equals(&self, field: &str, expected: &Value) -> bool {
        if field == FIELD_ID {
            return match id_from_value(expected) {
                Ok(Some(id)) => id == self.id,
                _ => false,
            };
        }
        values_equal(self.get(field).unwrap_or(&Value::Null), expected)
    }

    /// The stored JSON object, `id` included.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert(FIELD_ID.to_string(), Value::String(self.id.clone()));
        Value::Object(map)
    }

    /// Decode into a typed view.
    ///
    /// # Errors
    /// Returns the serde error if the fields do not fit `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_value())
    }

    /// Encode a typed value into record data.
    ///
    /// # Errors
    /// Returns a serialization error if `value` does not encode to a JSON
    /// object, or a validation error if it is not a map.
    pub fn encode<T: Serialize>(value: &T) -> StorageResult<Fields> {
        serde_json::to_value(value)
            .map_err(|e| StorageError::serialization(e.to_string()))?
            .into_fields()
    }
}

// =============================================================================
// Tests
// =============================================================================
