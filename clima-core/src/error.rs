//! Error types shared by the decoder, the fetch adapter and the views.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a schema-driven decode or encode. Decoding is all-or-nothing:
/// no partial value is ever returned alongside one of these.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("{}expected {expected} but got {actual}", at(.key))]
    TypeMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    #[error("{}{actual} is not one of {allowed}", at(.key))]
    InvalidEnumValue {
        key: String,
        allowed: String,
        actual: String,
    },

    #[error("{}{actual} matches none of the union members", at(.key))]
    NoUnionMemberMatched { key: String, actual: String },

    #[error("{}{actual} is not a valid date", at(.key))]
    InvalidDate { key: String, actual: String },

    #[error("{}name is taken by the declared field \"{declared}\"", at(.key))]
    NameClash { key: String, declared: String },

    #[error("no schema named '{0}'")]
    UnknownSchema(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn at(key: &str) -> String {
    if key.is_empty() {
        String::new()
    } else {
        format!("invalid value for \"{key}\": ")
    }
}

impl DecodeError {
    /// Path of the offending field, when the error is tied to one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::TypeMismatch { key, .. }
            | Self::InvalidEnumValue { key, .. }
            | Self::NoUnionMemberMatched { key, .. }
            | Self::InvalidDate { key, .. }
            | Self::NameClash { key, .. } => Some(key.as_str()),
            Self::UnknownSchema(_) | Self::Json(_) => None,
        }
    }
}

/// The request to the upstream API did not produce a usable body.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("upstream request failed with status {status}: {message}")]
    Upstream {
        status: StatusCode,
        /// Upstream error code from the `{"error": {...}}` payload, if any.
        code: Option<i64>,
        message: String,
    },

    #[error("upstream returned a body that is not JSON: {0}")]
    InvalidBody(#[source] serde_json::Error),
}

/// A navigation target that cannot be understood as a path or URL.
#[derive(Error, Debug)]
#[error("invalid navigation target '{target}': {source}")]
pub struct RouteError {
    pub target: String,
    #[source]
    pub source: url::ParseError,
}

/// Anything that can keep a result view from showing weather.
#[derive(Error, Debug)]
pub enum WeatherError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("weather response did not match the schema: {0}")]
    Decode(#[from] DecodeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_message_names_key() {
        let err = DecodeError::TypeMismatch {
            key: "current.temp_c".into(),
            expected: "number".into(),
            actual: "\"warm\"".into(),
        };

        let msg = err.to_string();
        assert!(msg.contains("current.temp_c"));
        assert!(msg.contains("expected number"));
        assert_eq!(err.key(), Some("current.temp_c"));
    }

    #[test]
    fn root_errors_have_no_key_prefix() {
        let err = DecodeError::TypeMismatch {
            key: String::new(),
            expected: "object".into(),
            actual: "[]".into(),
        };

        assert_eq!(err.to_string(), "expected object but got []");
    }

    #[test]
    fn upstream_error_display() {
        let err = FetchError::Upstream {
            status: StatusCode::BAD_REQUEST,
            code: Some(1006),
            message: "No matching location found.".into(),
        };

        let msg = err.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("No matching location found."));
    }
}
