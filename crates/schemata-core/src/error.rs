//! # Error Types — Protocol Error Taxonomy
//!
//! Defines the error surface shared by every schema dialect. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Representation checks fail before any conversion work starts.
//! - Validation errors name the offending element and keep the triggering
//!   error as a chained `source`.
//! - Dialect-internal error types never cross the protocol boundary; dialects
//!   wrap them into [`ValidationError`] before returning.

use thiserror::Error;

use crate::representation::{Representation, RepresentationSet};

/// Boxed error used as the chained cause of a [`ValidationError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for every schema protocol operation.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The requested representation is not in the schema's supported set, or
    /// streaming I/O was requested from a schema that cannot stream.
    #[error("{}", unsupported_representation_message(.requested, .supported, .streaming))]
    UnsupportedRepresentation {
        /// Representation the caller asked for.
        requested: Representation,
        /// Representations the schema accepts.
        supported: RepresentationSet,
        /// Whether the rejection is about streaming rather than the kind itself.
        streaming: bool,
    },

    /// A value failed required-ness, coercion, or dialect load/dump checks.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Translation met a native type the target dialect cannot represent.
    #[error("element '{element}' has type {native_type} with no counterpart in the {dialect} dialect")]
    UnsupportedType {
        /// Name of the foreign element.
        element: String,
        /// Rendered native type of the foreign element.
        native_type: String,
        /// Target dialect that rejected it.
        dialect: &'static str,
    },

    /// An optional protocol operation the dialect does not implement.
    #[error("operation '{operation}' is not supported by the {dialect} dialect")]
    UnsupportedOperation {
        /// Name of the rejected operation.
        operation: &'static str,
        /// Dialect that rejected it.
        dialect: &'static str,
    },

    /// A native shape could not be built from the given field list.
    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),
}

fn unsupported_representation_message(
    requested: &Representation,
    supported: &RepresentationSet,
    streaming: &bool,
) -> String {
    if *streaming {
        format!("streaming I/O for representation '{requested}' is not supported (supported: {supported})")
    } else {
        format!("representation '{requested}' is not supported (supported: {supported})")
    }
}

/// A value did not satisfy its schema.
///
/// Carries the offending element's name (when the failure is attributable to
/// one element) and the original triggering error as `source`.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ValidationError {
    element: Option<String>,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl ValidationError {
    /// Create a validation error with a message and no cause.
    pub fn new(element: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            element: element.map(str::to_owned),
            message: message.into(),
            source: None,
        }
    }

    /// The element is required but no value (and no default) was supplied.
    pub fn required(element: &str) -> Self {
        Self::new(
            Some(element),
            format!("required element {element} must be supplied"),
        )
    }

    /// The element's value could not be coerced into its native type.
    pub fn coercion(element: &str, cause: CoercionError) -> Self {
        Self::new(Some(element), format!("element {element}: {cause}")).with_source(cause)
    }

    /// Attach the triggering error as the chained cause.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Name of the offending element, if the failure is attributable to one.
    pub fn element(&self) -> Option<&str> {
        self.element.as_deref()
    }

    /// Human-readable description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A value could not be converted into a native base type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    /// The value's kind has no conversion into the target type.
    #[error("cannot convert {found} to {expected}")]
    Incompatible {
        /// Target type name.
        expected: &'static str,
        /// Kind of the offending value.
        found: &'static str,
    },

    /// A textual literal could not be parsed into the target type.
    #[error("invalid {expected} literal {input:?}: {reason}")]
    InvalidLiteral {
        /// Target type name.
        expected: &'static str,
        /// The rejected input text.
        input: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The value is of a convertible kind but does not fit the target type.
    #[error("{value} is out of range for {expected}")]
    OutOfRange {
        /// Target type name.
        expected: &'static str,
        /// Rendered offending value.
        value: String,
    },
}

/// Native shape construction or instantiation failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// Two fields share a name.
    #[error("shape '{shape}' declares field '{field}' more than once")]
    DuplicateField {
        /// Shape name.
        shape: String,
        /// Duplicated field name.
        field: String,
    },

    /// A positional shape lists a field without a default after one with a default.
    #[error("shape '{shape}': field '{field}' without a default follows a field with a default")]
    NonDefaultAfterDefault {
        /// Shape name.
        shape: String,
        /// The misplaced field.
        field: String,
    },

    /// An argument names no field of the shape.
    #[error("shape '{shape}' has no field '{argument}'")]
    UnknownArgument {
        /// Shape name.
        shape: String,
        /// The unknown argument name.
        argument: String,
    },

    /// A field without a default received no argument.
    #[error("shape '{shape}' is missing a value for field '{field}'")]
    MissingArgument {
        /// Shape name.
        shape: String,
        /// The field left without a value.
        field: String,
    },

    /// More positional arguments than fields.
    #[error("shape '{shape}' takes {expected} positional arguments but {given} were given")]
    TooManyPositional {
        /// Shape name.
        shape: String,
        /// Number of fields.
        expected: usize,
        /// Number of supplied arguments.
        given: usize,
    },

    /// The shape-level invariant rejected the constructed record.
    #[error("shape '{shape}' invariant violated: {reason}")]
    InvariantViolated {
        /// Shape name.
        shape: String,
        /// Reason reported by the invariant.
        reason: String,
    },
}
