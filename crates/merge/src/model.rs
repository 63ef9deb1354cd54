use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::config::{MergeConfig, MergePolicy};
use crate::error::MergeError;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A single canonical field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Convert a JSON scalar. Booleans, arrays and objects have no canonical form.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Int(i)),
                None => n.as_f64().map(Self::Float),
            },
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view; Int and Float share one scale.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Null | Self::Text(_) => None,
        }
    }

    /// Numeric ordering. Two ints compare exactly; a float on either side
    /// puts both on the f64 scale. `None` for text, null and NaN.
    pub fn numeric_cmp(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
        }
    }

    /// Value equality where `8` and `8.0` are the same number.
    pub fn same_as(&self, other: &FieldValue) -> bool {
        match self.numeric_cmp(other) {
            Some(ord) => ord == Ordering::Equal,
            None => self == other,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One provider's flat, already-normalized view of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    /// `None` when the identifier was absent, null or not a string.
    pub entity_id: Option<String>,
    pub provider: Option<String>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl CanonicalRecord {
    pub fn new(entity_id: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            entity_id: Some(entity_id.into()),
            provider: Some(provider.into()),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Field value, `Null` when the record does not carry the field.
    pub fn field(&self, name: &str) -> &FieldValue {
        self.fields.get(name).unwrap_or(&FieldValue::Null)
    }

    /// Build a record from one element of a JSON array, using the configured
    /// entity and provider key names.
    pub fn from_json(index: usize, value: &Value, config: &MergeConfig) -> Result<Self, MergeError> {
        let obj = value.as_object().ok_or_else(|| {
            MergeError::invalid(Some(index), format!("expected an object, found {}", json_kind(value)))
        })?;

        let entity_id = obj.get(&config.entity_key).and_then(Value::as_str).map(str::to_string);

        let provider = match obj.get(&config.provider_key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                return Err(MergeError::invalid(
                    Some(index),
                    format!("'{}' must be a string, found {}", config.provider_key, json_kind(other)),
                ))
            }
        };

        let mut fields = BTreeMap::new();
        for (key, raw) in obj {
            if key == &config.entity_key || key == &config.provider_key {
                continue;
            }
            let value = FieldValue::from_json(raw).ok_or_else(|| {
                MergeError::invalid(
                    Some(index),
                    format!("field '{key}' has unsupported {} value", json_kind(raw)),
                )
            })?;
            fields.insert(key.clone(), value);
        }

        Ok(Self {
            entity_id,
            provider,
            fields,
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// One provider's offer for a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub provider: Option<String>,
    pub value: FieldValue,
}

impl Candidate {
    pub fn new(provider: Option<&str>, value: impl Into<FieldValue>) -> Self {
        Self {
            provider: provider.map(str::to_string),
            value: value.into(),
        }
    }
}

/// Why a field resolved the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    NoData,
    ProviderPriority,
    Policy(MergePolicy),
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData => write!(f, "no-data"),
            Self::ProviderPriority => write!(f, "provider-priority"),
            Self::Policy(policy) => write!(f, "policy:{policy}"),
        }
    }
}

impl Serialize for Reason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub value: FieldValue,
    pub provider: Option<String>,
    pub reason: Reason,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One reconciled entity. Serializes flat: entity key, `providers`, then
/// every field in lexicographic order.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    /// Name the identifier is written under (`entity_id`, `movie_id`, ...).
    pub entity_key: String,
    pub entity_id: String,
    /// Sorted, duplicate-free.
    pub providers: Vec<String>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl MergedRecord {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }
}

impl Serialize for MergedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 2))?;
        map.serialize_entry(&self.entity_key, &self.entity_id)?;
        map.serialize_entry("providers", &self.providers)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
