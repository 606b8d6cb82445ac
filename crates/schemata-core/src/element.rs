//! # Schema Elements — One Named, Typed Slot of a Schema
//!
//! Every dialect exposes its slots through [`SchemaElement`]. The trait is
//! the capability interface other dialects and the translation engine read;
//! no dialect ever inspects another dialect's concrete element type.
//!
//! ## Design
//!
//! - Elements identify their owning schema by [`SchemaId`], never by pointer.
//! - [`validate_element_value`] is the shared per-element validation
//!   algorithm. Dialects override it per element through the annotation's
//!   [`ValidatorOverride`](crate::annotation::ValidatorOverride), not by
//!   reimplementing the trait method.

use std::fmt;

use uuid::Uuid;

use crate::annotation::{DefaultValue, Metadata, TypeAnnotation};
use crate::error::ValidationError;
use crate::types::NativeType;
use crate::value::Value;

/// Identity of a schema instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(Uuid);

impl SchemaId {
    /// Fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SchemaId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Structural projection of an element: what a record type needs to declare a field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub native_type: NativeType,
    pub default: DefaultValue,
    pub metadata: Metadata,
}

impl FieldDescriptor {
    /// Field without a default.
    pub fn new(name: impl Into<String>, native_type: NativeType) -> Self {
        Self {
            name: name.into(),
            native_type,
            default: DefaultValue::Absent,
            metadata: Metadata::new(),
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = DefaultValue::Literal(value.into());
        self
    }

    pub fn with_default_value(mut self, default: DefaultValue) -> Self {
        self.default = default;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn has_default(&self) -> bool {
        !self.default.is_absent()
    }
}

/// One named slot of a schema.
pub trait SchemaElement: fmt::Debug {
    /// Name, unique within the owning schema.
    fn name(&self) -> &str;

    /// Logical value type.
    fn native_type(&self) -> NativeType;

    /// Required/default/metadata bundle. `None` means "required, no default".
    fn annotation(&self) -> Option<TypeAnnotation>;

    /// Id of the owning schema, if the element is bound to one.
    fn owner(&self) -> Option<SchemaId>;

    /// Element-level metadata; empty unless the annotation carries some.
    fn metadata(&self) -> Metadata {
        self.annotation()
            .map(|a| a.metadata().clone())
            .unwrap_or_default()
    }

    /// Whether the element carries validation behavior with no
    /// dialect-neutral counterpart (constraints, format checks).
    fn has_dialect_constraints(&self) -> bool {
        false
    }

    /// The element as a structural field descriptor.
    fn field_descriptor(&self) -> FieldDescriptor {
        let annotation = self.annotation();
        FieldDescriptor {
            name: self.name().to_string(),
            native_type: self.native_type(),
            default: annotation
                .as_ref()
                .map(|a| a.default_value().clone())
                .unwrap_or_default(),
            metadata: annotation.map(|a| a.metadata().clone()).unwrap_or_default(),
        }
    }

    /// Validate a raw value for this element.
    fn validate_value(&self, raw: Option<&Value>) -> Result<Option<Value>, ValidationError> {
        validate_element_value(self, raw)
    }
}

impl<T: SchemaElement + ?Sized> SchemaElement for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn native_type(&self) -> NativeType {
        (**self).native_type()
    }

    fn annotation(&self) -> Option<TypeAnnotation> {
        (**self).annotation()
    }

    fn owner(&self) -> Option<SchemaId> {
        (**self).owner()
    }

    fn metadata(&self) -> Metadata {
        (**self).metadata()
    }

    fn has_dialect_constraints(&self) -> bool {
        (**self).has_dialect_constraints()
    }

    fn field_descriptor(&self) -> FieldDescriptor {
        (**self).field_descriptor()
    }

    fn validate_value(&self, raw: Option<&Value>) -> Result<Option<Value>, ValidationError> {
        (**self).validate_value(raw)
    }
}

/// Shared element validation.
///
/// 1. An empty value (absent or `Null`) takes the default if there is one,
///    fails if the element is required, and otherwise stays empty.
/// 2. Any other value is coerced into the element's base native type;
///    coercion failures are wrapped with the cause chained.
///
/// An annotation-level override replaces both steps. Defaults are returned
/// as declared, without coercion.
pub fn validate_element_value<E>(element: &E, raw: Option<&Value>) -> Result<Option<Value>, ValidationError>
where
    E: SchemaElement + ?Sized,
{
    let name = element.name();
    let annotation = element.annotation();

    if let Some(validator) = annotation.as_ref().and_then(TypeAnnotation::validator) {
        return validator.call(name, raw);
    }

    let value = match raw {
        Some(v) if !v.is_null() => v,
        _ => {
            let Some(annotation) = annotation else {
                return Err(ValidationError::required(name));
            };
            if let Some(default) = annotation.default_value().resolve() {
                tracing::trace!(element = %name, "empty value replaced by default");
                return Ok(Some(default));
            }
            if annotation.is_required() {
                return Err(ValidationError::required(name));
            }
            return Ok(raw.cloned());
        }
    };

    let native_type = element.native_type();
    tracing::trace!(element = %name, native_type = %native_type, "coercing value");
    native_type
        .coerce(value)
        .map(Some)
        .map_err(|e| ValidationError::coercion(name, e))
}
