//! Helpers for reading plain key/value trees (`serde_json::Value`).
//!
//! Every accessor names the field it failed on so callers can surface a
//! precise `DecodeError`.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::errors::DecodeError;

pub type Object = Map<String, Value>;

/// Decode an enum from its serde wire name; unknown names are reported against `field`.
pub(crate) fn tag<T: DeserializeOwned>(field: &str, value: &str) -> Result<T, DecodeError> {
    serde_json::from_value(Value::String(value.to_string()))
        .map_err(|_| DecodeError::unknown(field, value))
}

pub(crate) fn as_object<'a>(value: &'a Value, field: &str) -> Result<&'a Object, DecodeError> {
    value
        .as_object()
        .ok_or_else(|| DecodeError::NotAnObject(field.to_string()))
}

pub(crate) fn required<'a>(obj: &'a Object, field: &str) -> Result<&'a Value, DecodeError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(DecodeError::MissingField(field.to_string())),
        Some(value) => Ok(value),
    }
}

pub(crate) fn required_str<'a>(obj: &'a Object, field: &str) -> Result<&'a str, DecodeError> {
    required(obj, field)?
        .as_str()
        .ok_or_else(|| DecodeError::invalid(field, "expected a string"))
}

pub(crate) fn optional_str<'a>(obj: &'a Object, field: &str) -> Result<Option<&'a str>, DecodeError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(DecodeError::invalid(field, "expected a string or null")),
    }
}

pub(crate) fn required_object<'a>(obj: &'a Object, field: &str) -> Result<&'a Object, DecodeError> {
    as_object(required(obj, field)?, field)
}

/// Absent or null maps decode as empty; anything else must be an object.
pub(crate) fn optional_object(obj: &Object, field: &str) -> Result<Object, DecodeError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(Object::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(DecodeError::NotAnObject(field.to_string())),
    }
}

pub(crate) fn timestamp(obj: &Object, field: &str) -> Result<DateTime<Utc>, DecodeError> {
    let raw = required_str(obj, field)?;
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DecodeError::invalid(field, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_counts_as_missing() {
        let v = json!({"sender": null});
        let obj = as_object(&v, "envelope").unwrap();
        assert_eq!(
            required_str(obj, "sender").unwrap_err(),
            DecodeError::MissingField("sender".into())
        );
    }

    #[test]
    fn wrong_type_names_field() {
        let v = json!({"metadata": 3});
        let obj = as_object(&v, "message").unwrap();
        let err = optional_object(obj, "metadata").unwrap_err();
        assert_eq!(err.field(), "metadata");
    }

    #[test]
    fn timestamp_must_be_rfc3339() {
        let v = json!({"timestamp": "yesterday"});
        let obj = as_object(&v, "envelope").unwrap();
        assert!(matches!(
            timestamp(obj, "timestamp"),
            Err(DecodeError::InvalidField { field, .. }) if field == "timestamp"
        ));
    }
}
