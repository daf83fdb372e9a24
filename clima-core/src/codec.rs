//! Schema-driven conversion between raw JSON and decoded values.
//!
//! [`decode`] checks a [`serde_json::Value`] against a [`Schema`] and produces
//! a [`Decoded`] tree keyed by internal field names; [`encode`] walks the same
//! schema backwards and yields the wire representation again. Both stop at
//! the first mismatch.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde_json::{Map, Number, Value};

use crate::{
    error::DecodeError,
    schema::{ObjectSchema, Schema, SchemaSet},
};

/// A value that passed a schema. Same shape as JSON, plus real dates.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Date(DateTime<FixedOffset>),
    Array(Vec<Decoded>),
    Object(BTreeMap<String, Decoded>),
}

impl Decoded {
    /// Field of an object value.
    pub fn get(&self, field: &str) -> Option<&Decoded> {
        match self {
            Decoded::Object(fields) => fields.get(field),
            _ => None,
        }
    }

    fn excerpt(&self) -> String {
        excerpt(&Value::from(self.clone()))
    }
}

impl From<Value> for Decoded {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Decoded::Null,
            Value::Bool(b) => Decoded::Bool(b),
            Value::Number(n) => Decoded::Number(n),
            Value::String(s) => Decoded::String(s),
            Value::Array(items) => Decoded::Array(items.into_iter().map(Decoded::from).collect()),
            Value::Object(fields) => {
                Decoded::Object(fields.into_iter().map(|(k, v)| (k, Decoded::from(v))).collect())
            }
        }
    }
}

impl From<Decoded> for Value {
    fn from(value: Decoded) -> Self {
        match value {
            Decoded::Null => Value::Null,
            Decoded::Bool(b) => Value::Bool(b),
            Decoded::Number(n) => Value::Number(n),
            Decoded::String(s) => Value::String(s),
            Decoded::Date(d) => Value::String(d.to_rfc3339()),
            Decoded::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Decoded::Object(fields) => {
                Value::Object(fields.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Validate `value` against `schema`, renaming declared fields to their
/// internal names.
pub fn decode(value: &Value, schema: &Schema, set: &SchemaSet) -> Result<Decoded, DecodeError> {
    decode_at(value, schema, set, "")
}

/// Inverse of [`decode`]: produce the wire JSON for an already decoded value.
pub fn encode(value: &Decoded, schema: &Schema, set: &SchemaSet) -> Result<Value, DecodeError> {
    encode_at(value, schema, set, "")
}

fn decode_at(
    value: &Value,
    schema: &Schema,
    set: &SchemaSet,
    key: &str,
) -> Result<Decoded, DecodeError> {
    let schema = set.resolve(schema)?;

    match (schema, value) {
        (Schema::Any, _) => Ok(Decoded::from(value.clone())),
        (Schema::Null, Value::Null) => Ok(Decoded::Null),
        (Schema::String, Value::String(s)) => Ok(Decoded::String(s.clone())),
        (Schema::Number, Value::Number(n)) => Ok(Decoded::Number(n.clone())),
        (Schema::Boolean, Value::Bool(b)) => Ok(Decoded::Bool(*b)),
        (Schema::Date, Value::Null) => Ok(Decoded::Null),
        (Schema::Date, Value::String(s)) => parse_date(s)
            .map(Decoded::Date)
            .ok_or_else(|| invalid_date(key, excerpt(value))),
        // Numbers could be read as epochs, but the field asked for a date.
        (Schema::Date, _) => Err(invalid_date(key, excerpt(value))),
        (Schema::Enum(cases), _) => {
            if cases.contains(value) {
                Ok(Decoded::from(value.clone()))
            } else {
                Err(invalid_enum(key, cases, excerpt(value)))
            }
        }
        (Schema::Array(items), Value::Array(values)) => values
            .iter()
            .enumerate()
            .map(|(i, v)| decode_at(v, items, set, &index_key(key, i)))
            .collect::<Result<Vec<_>, _>>()
            .map(Decoded::Array),
        (Schema::Union(members), _) => members
            .iter()
            .find_map(|member| decode_at(value, member, set, key).ok())
            .ok_or_else(|| DecodeError::NoUnionMemberMatched {
                key: key.to_string(),
                actual: excerpt(value),
            }),
        (Schema::Object(object), Value::Object(fields)) => decode_object(object, fields, set, key),
        (Schema::Ref(name), _) => Err(DecodeError::UnknownSchema(name.clone())),
        _ => Err(mismatch(key, schema, excerpt(value))),
    }
}

fn decode_object(
    object: &ObjectSchema,
    fields: &Map<String, Value>,
    set: &SchemaSet,
    key: &str,
) -> Result<Decoded, DecodeError> {
    let mut out = BTreeMap::new();

    for prop in &object.props {
        let child = field_key(key, &prop.json);
        match fields.get(&prop.json) {
            Some(v) => {
                out.insert(prop.field.clone(), decode_at(v, &prop.schema, set, &child)?);
            }
            None => require_absent_ok(&prop.schema, set, &child)?,
        }
    }

    for (name, v) in fields {
        if object.by_json(name).is_some() {
            continue;
        }
        let child = field_key(key, name);
        // `"latitude"` next to `"lat"` would land on the same decoded name.
        if let Some(prop) = object.by_field(name) {
            return Err(DecodeError::NameClash { key: child, declared: prop.json.clone() });
        }
        out.insert(name.clone(), decode_at(v, &object.additional, set, &child)?);
    }

    Ok(Decoded::Object(out))
}

fn encode_at(
    value: &Decoded,
    schema: &Schema,
    set: &SchemaSet,
    key: &str,
) -> Result<Value, DecodeError> {
    let schema = set.resolve(schema)?;

    match (schema, value) {
        (Schema::Any, _) => Ok(Value::from(value.clone())),
        (Schema::Null, Decoded::Null) => Ok(Value::Null),
        (Schema::String, Decoded::String(s)) => Ok(Value::String(s.clone())),
        (Schema::Number, Decoded::Number(n)) => Ok(Value::Number(n.clone())),
        (Schema::Boolean, Decoded::Bool(b)) => Ok(Value::Bool(*b)),
        (Schema::Date, Decoded::Null) => Ok(Value::Null),
        (Schema::Date, Decoded::Date(d)) => Ok(Value::String(d.to_rfc3339())),
        (Schema::Date, Decoded::String(s)) => parse_date(s)
            .map(|d| Value::String(d.to_rfc3339()))
            .ok_or_else(|| invalid_date(key, value.excerpt())),
        (Schema::Date, _) => Err(invalid_date(key, value.excerpt())),
        (Schema::Enum(cases), _) => {
            let raw = Value::from(value.clone());
            if cases.contains(&raw) {
                Ok(raw)
            } else {
                Err(invalid_enum(key, cases, excerpt(&raw)))
            }
        }
        (Schema::Array(items), Decoded::Array(values)) => values
            .iter()
            .enumerate()
            .map(|(i, v)| encode_at(v, items, set, &index_key(key, i)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (Schema::Union(members), _) => members
            .iter()
            .find_map(|member| encode_at(value, member, set, key).ok())
            .ok_or_else(|| DecodeError::NoUnionMemberMatched {
                key: key.to_string(),
                actual: value.excerpt(),
            }),
        (Schema::Object(object), Decoded::Object(fields)) => encode_object(object, fields, set, key),
        (Schema::Ref(name), _) => Err(DecodeError::UnknownSchema(name.clone())),
        _ => Err(mismatch(key, schema, value.excerpt())),
    }
}

fn encode_object(
    object: &ObjectSchema,
    fields: &BTreeMap<String, Decoded>,
    set: &SchemaSet,
    key: &str,
) -> Result<Value, DecodeError> {
    let mut out = Map::new();

    for prop in &object.props {
        let child = field_key(key, &prop.field);
        match fields.get(&prop.field) {
            Some(v) => {
                out.insert(prop.json.clone(), encode_at(v, &prop.schema, set, &child)?);
            }
            None => require_absent_ok(&prop.schema, set, &child)?,
        }
    }

    for (name, v) in fields {
        if object.by_field(name).is_some() {
            continue;
        }
        let child = field_key(key, name);
        if let Some(prop) = object.by_json(name) {
            return Err(DecodeError::NameClash { key: child, declared: prop.field.clone() });
        }
        out.insert(name.clone(), encode_at(v, &object.additional, set, &child)?);
    }

    Ok(Value::Object(out))
}

/// A declared field may only be left out when its schema takes anything.
fn require_absent_ok(schema: &Schema, set: &SchemaSet, key: &str) -> Result<(), DecodeError> {
    match set.resolve(schema)? {
        Schema::Any => Ok(()),
        _ => Err(mismatch(key, schema, "missing".to_string())),
    }
}

/// Parse the date spellings upstream APIs commonly use. Values without an
/// offset are taken as UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }

    const NAIVE_FORMATS: [&str; 4] =
        ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

fn field_key(parent: &str, name: &str) -> String {
    if parent.is_empty() { name.to_string() } else { format!("{parent}.{name}") }
}

fn index_key(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

fn mismatch(key: &str, expected: &Schema, actual: String) -> DecodeError {
    DecodeError::TypeMismatch { key: key.to_string(), expected: expected.describe(), actual }
}

fn invalid_date(key: &str, actual: String) -> DecodeError {
    DecodeError::InvalidDate { key: key.to_string(), actual }
}

fn invalid_enum(key: &str, cases: &[Value], actual: String) -> DecodeError {
    DecodeError::InvalidEnumValue {
        key: key.to_string(),
        allowed: Value::Array(cases.to_vec()).to_string(),
        actual,
    }
}

fn excerpt(value: &Value) -> String {
    const MAX: usize = 80;
    let text = value.to_string();
    if text.chars().count() > MAX {
        format!("{}...", text.chars().take(MAX).collect::<String>())
    } else {
        text
    }
}
