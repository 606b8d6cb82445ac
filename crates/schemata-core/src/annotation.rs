//! # Type Annotations — Required / Default / Metadata Bundle
//!
//! ## Invariant
//!
//! A [`TypeAnnotation`] never carries both `required == true` and a default.
//! The fields are private and every constructor normalizes toward that rule,
//! so the invariant holds for every value that exists.

use std::fmt;
use std::sync::Arc;

use crate::error::ValidationError;
use crate::value::Value;

/// Free-form, namespaced third-party payload. Never interpreted by the engine.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Deferred default: evaluated each time a default is needed.
#[derive(Clone)]
pub struct DefaultFactory(Arc<dyn Fn() -> Value + Send + Sync>);

impl DefaultFactory {
    pub fn new(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Produce a fresh default value.
    pub fn call(&self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for DefaultFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DefaultFactory(..)")
    }
}

impl PartialEq for DefaultFactory {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Default of an element: absent (the MISSING sentinel), a literal, or a factory.
///
/// `Literal(Value::Null)` is a real default and is distinct from `Absent`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DefaultValue {
    #[default]
    Absent,
    Literal(Value),
    Factory(DefaultFactory),
}

impl DefaultValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, DefaultValue::Absent)
    }

    pub fn is_factory(&self) -> bool {
        matches!(self, DefaultValue::Factory(_))
    }

    /// The concrete default, evaluating a factory. `None` when absent.
    pub fn resolve(&self) -> Option<Value> {
        match self {
            DefaultValue::Absent => None,
            DefaultValue::Literal(v) => Some(v.clone()),
            DefaultValue::Factory(f) => Some(f.call()),
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(v: Value) -> Self {
        DefaultValue::Literal(v)
    }
}

/// Signature of a per-element validation override.
pub type ValidatorFn =
    dyn Fn(&str, Option<&Value>) -> Result<Option<Value>, ValidationError> + Send + Sync;

/// Replaces the shared element validation algorithm for one element.
///
/// Receives the element name and the raw value (`None` when absent) and
/// returns the validated value (`None` to leave it absent).
#[derive(Clone)]
pub struct ValidatorOverride(Arc<ValidatorFn>);

impl ValidatorOverride {
    pub fn new(
        f: impl Fn(&str, Option<&Value>) -> Result<Option<Value>, ValidationError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, element: &str, raw: Option<&Value>) -> Result<Option<Value>, ValidationError> {
        (self.0)(element, raw)
    }
}

impl fmt::Debug for ValidatorOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValidatorOverride(..)")
    }
}

/// The required/default/metadata/behavior bundle attached to an element.
#[derive(Debug, Clone, Default)]
pub struct TypeAnnotation {
    required: bool,
    default: DefaultValue,
    metadata: Metadata,
    validator: Option<ValidatorOverride>,
}

impl TypeAnnotation {
    /// Required, no default.
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    /// Optional, no default: an absent value stays absent.
    pub fn optional() -> Self {
        Self::default()
    }

    /// Optional with a literal default.
    pub fn with_default(value: impl Into<Value>) -> Self {
        Self {
            default: DefaultValue::Literal(value.into()),
            ..Self::default()
        }
    }

    /// Optional with a deferred default.
    pub fn with_factory(factory: DefaultFactory) -> Self {
        Self {
            default: DefaultValue::Factory(factory),
            ..Self::default()
        }
    }

    /// Build from raw parts. A present default makes the element optional.
    pub fn from_parts(required: bool, default: DefaultValue) -> Self {
        Self {
            required: required && default.is_absent(),
            default,
            ..Self::default()
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_validator(mut self, validator: ValidatorOverride) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> &DefaultValue {
        &self.default
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn validator(&self) -> Option<&ValidatorOverride> {
        self.validator.as_ref()
    }
}
