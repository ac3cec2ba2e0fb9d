//! Typed values and records produced by the reader.
//!
//! A [`Record`] holds one [`Value`] per declared field, in schema declaration order, plus any
//! surplus raw cells under the configured rest key.

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A single converted cell.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing/blank value, or a field that failed validation in lenient mode.
    Null,
    /// Raw string, unchanged.
    Str(String),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit float.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Calendar date.
    Date(NaiveDate),
}

impl Value {
    /// True for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// One typed output row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<(String, Value)>,
    rest_key: String,
    rest: Option<Vec<String>>,
}

impl Record {
    pub(crate) fn new(values: Vec<(String, Value)>, rest_key: &str, rest: Option<Vec<String>>) -> Self {
        Self {
            values,
            rest_key: rest_key.to_owned(),
            rest,
        }
    }

    /// Value of a declared field, if the schema declares it.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, v)| v)
    }

    /// Surplus raw cells beyond the column map width, if the row had any.
    pub fn rest(&self) -> Option<&[String]> {
        self.rest.as_deref()
    }

    /// Key under which [`Self::rest`] is serialized.
    pub fn rest_key(&self) -> &str {
        &self.rest_key
    }

    /// Iterate `(field, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, v)| (name.as_str(), v))
    }

    /// Number of declared fields (the rest entry is not counted).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Render the record as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        // Serializing plain strings, numbers and dates cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.values.len() + usize::from(self.rest.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        if let Some(rest) = &self.rest {
            map.serialize_entry(&self.rest_key, rest)?;
        }
        map.end()
    }
}
