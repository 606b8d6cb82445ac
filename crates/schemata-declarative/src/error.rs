//! # Declarative Dialect Errors
//!
//! `FieldError` is a single field's load failure; `LoadError` and
//! `DumpError` are whole-schema failures. None of these leave the crate
//! through the protocol: [`into_validation`] wraps them as
//! [`ValidationError`] with the original kept as `source`.

use std::collections::BTreeMap;

use schemata_core::{CoercionError, SchemaError, ValidationError};
use thiserror::Error;

use crate::config::ConfigError;

/// Why one field's input was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("Missing data for required field.")]
    Required,

    #[error("Field may not be null.")]
    Null,

    /// The input could not be read as the field's kind.
    #[error("Not a valid {expected}.")]
    Invalid {
        /// Human-readable kind name.
        expected: &'static str,
    },

    /// A declared constraint rejected the value.
    #[error("{0}")]
    Constraint(String),

    #[error("Unknown field.")]
    Unknown,

    /// A mapping entry failed its key or value field.
    #[error("{key}: {error}")]
    Entry {
        /// Rendered entry key.
        key: String,
        /// The entry's failure.
        error: Box<FieldError>,
    },
}

/// Loading a payload failed.
#[derive(Error, Debug)]
pub enum LoadError {
    /// One or more fields were rejected; messages are collected per field.
    #[error("invalid input: {}", render_field_errors(.errors))]
    Fields {
        /// Field name to its error messages.
        errors: BTreeMap<String, Vec<String>>,
    },

    #[error("malformed JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, found {found}")]
    NotAnObject {
        /// JSON kind found instead.
        found: &'static str,
    },

    /// The input broke the generated JSON Schema.
    #[error("input does not conform to the schema's JSON Schema: {}", .violations.join("; "))]
    JsonSchema {
        /// One line per violation, prefixed by its instance path.
        violations: Vec<String>,
    },

    #[error("payload is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Payload of the wrong shape for the source representation.
    #[error("{representation} input must be {expected}")]
    PayloadKind {
        /// Source representation name.
        representation: &'static str,
        /// Expected payload description.
        expected: &'static str,
    },
}

impl LoadError {
    /// First offending field, for errors attributable to fields.
    pub fn first_field(&self) -> Option<&str> {
        match self {
            LoadError::Fields { errors } => errors.keys().next().map(String::as_str),
            _ => None,
        }
    }
}

fn render_field_errors(errors: &BTreeMap<String, Vec<String>>) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Dumping an object failed.
#[derive(Error, Debug)]
pub enum DumpError {
    /// A field value could not be serialized as the field's kind.
    #[error("cannot dump field '{field}': {source}")]
    Field {
        /// Field name.
        field: String,
        /// Underlying conversion failure.
        #[source]
        source: CoercionError,
    },

    #[error("cannot encode JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Wrap a dialect error as a protocol [`SchemaError::Validation`].
pub fn into_validation<E>(element: Option<&str>, err: E) -> SchemaError
where
    E: std::error::Error + Send + Sync + 'static,
{
    SchemaError::Validation(ValidationError::new(element, err.to_string()).with_source(err))
}

impl From<LoadError> for SchemaError {
    fn from(err: LoadError) -> Self {
        let element = err.first_field().map(str::to_owned);
        into_validation(element.as_deref(), err)
    }
}

impl From<DumpError> for SchemaError {
    fn from(err: DumpError) -> Self {
        let element = match &err {
            DumpError::Field { field, .. } => Some(field.clone()),
            DumpError::Json(_) => None,
        };
        into_validation(element.as_deref(), err)
    }
}

impl From<ConfigError> for SchemaError {
    fn from(err: ConfigError) -> Self {
        into_validation(None, err)
    }
}
