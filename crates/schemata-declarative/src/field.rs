//! # Declarative Fields
//!
//! A [`Field`] is an explicitly declared slot with its own load (deserialize)
//! and dump (serialize) behavior: a kind, a required flag, a `missing`
//! default, null handling, constraints, and metadata. Fields implement
//! [`SchemaElement`] directly, so other dialects read them through the
//! protocol without knowing this type.
//!
//! ## Load vs. dump
//!
//! - **Load** is lenient per kind (ISO strings become dates, numeric strings
//!   become numbers) and then runs the field's constraints.
//! - **Dump** produces primitive values: temporal kinds become ISO strings,
//!   durations become seconds. A dumped mapping is therefore directly
//!   JSON-encodable, and loading it back restores the typed values.
//!
//! ## Type table
//!
//! [`FIELD_TYPES`] maps field kinds to native base types. The reverse
//! direction takes the last entry per base type, so `Str` (listed after
//! `Email`) is what a foreign `str` element becomes.

use std::fmt;

use schemata_core::{
    BaseType, CoercionError, DefaultFactory, DefaultValue, Metadata, NativeType, SchemaElement, SchemaError,
    SchemaId, TypeAnnotation, TypeTable, ValidationError, ValidatorOverride, Value,
};

use crate::constraint::Constraint;
use crate::error::FieldError;

/// Field kind tag used in the type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldTag {
    Str,
    Email,
    Int,
    Float,
    Bool,
    Date,
    DateTime,
    Time,
    TimeDelta,
    Dict,
    Raw,
}

/// Kind to native base type. `Raw` has no entry: it stands for `Any`, which
/// has no declarative counterpart.
pub const FIELD_TYPES: TypeTable<FieldTag> = TypeTable::new(&[
    (FieldTag::Int, BaseType::Int),
    (FieldTag::Float, BaseType::Float),
    (FieldTag::Bool, BaseType::Bool),
    (FieldTag::Email, BaseType::Str),
    (FieldTag::Str, BaseType::Str),
    (FieldTag::DateTime, BaseType::DateTime),
    (FieldTag::Time, BaseType::Time),
    (FieldTag::Date, BaseType::Date),
    (FieldTag::TimeDelta, BaseType::Duration),
    (FieldTag::Dict, BaseType::Mapping),
]);

/// What a field holds.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Str,
    Email,
    Int,
    Float,
    Bool,
    Date,
    DateTime,
    Time,
    TimeDelta,
    /// Mapping whose keys and values are optionally typed by inner fields.
    Dict {
        keys: Option<Box<Field>>,
        values: Option<Box<Field>>,
    },
    /// Untyped; values pass through.
    Raw,
}

impl FieldKind {
    pub fn tag(&self) -> FieldTag {
        match self {
            FieldKind::Str => FieldTag::Str,
            FieldKind::Email => FieldTag::Email,
            FieldKind::Int => FieldTag::Int,
            FieldKind::Float => FieldTag::Float,
            FieldKind::Bool => FieldTag::Bool,
            FieldKind::Date => FieldTag::Date,
            FieldKind::DateTime => FieldTag::DateTime,
            FieldKind::Time => FieldTag::Time,
            FieldKind::TimeDelta => FieldTag::TimeDelta,
            FieldKind::Dict { .. } => FieldTag::Dict,
            FieldKind::Raw => FieldTag::Raw,
        }
    }

    fn from_tag(tag: FieldTag) -> Self {
        match tag {
            FieldTag::Str => FieldKind::Str,
            FieldTag::Email => FieldKind::Email,
            FieldTag::Int => FieldKind::Int,
            FieldTag::Float => FieldKind::Float,
            FieldTag::Bool => FieldKind::Bool,
            FieldTag::Date => FieldKind::Date,
            FieldTag::DateTime => FieldKind::DateTime,
            FieldTag::Time => FieldKind::Time,
            FieldTag::TimeDelta => FieldKind::TimeDelta,
            FieldTag::Dict => FieldKind::Dict {
                keys: None,
                values: None,
            },
            FieldTag::Raw => FieldKind::Raw,
        }
    }

    /// Name used in "Not a valid ..." messages.
    fn expected(&self) -> &'static str {
        match self {
            FieldKind::Str => "string",
            FieldKind::Email => "email address",
            FieldKind::Int => "integer",
            FieldKind::Float => "number",
            FieldKind::Bool => "boolean",
            FieldKind::Date => "date",
            FieldKind::DateTime => "datetime",
            FieldKind::Time => "time",
            FieldKind::TimeDelta => "period of time",
            FieldKind::Dict { .. } => "mapping type",
            FieldKind::Raw => "value",
        }
    }
}

/// A declared field of a declarative schema.
#[derive(Debug, Clone)]
pub struct Field {
    kind: FieldKind,
    required: bool,
    missing: DefaultValue,
    allow_none: bool,
    constraints: Vec<Constraint>,
    metadata: Metadata,
    name: Option<String>,
    owner: Option<SchemaId>,
}

// ─── Construction ────────────────────────────────────────────────────

impl Field {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            missing: DefaultValue::Absent,
            allow_none: false,
            constraints: Vec::new(),
            metadata: Metadata::new(),
            name: None,
            owner: None,
        }
    }

    pub fn str() -> Self {
        Self::new(FieldKind::Str)
    }

    pub fn email() -> Self {
        Self::new(FieldKind::Email)
    }

    pub fn int() -> Self {
        Self::new(FieldKind::Int)
    }

    pub fn float() -> Self {
        Self::new(FieldKind::Float)
    }

    pub fn boolean() -> Self {
        Self::new(FieldKind::Bool)
    }

    pub fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    pub fn datetime() -> Self {
        Self::new(FieldKind::DateTime)
    }

    pub fn time() -> Self {
        Self::new(FieldKind::Time)
    }

    pub fn timedelta() -> Self {
        Self::new(FieldKind::TimeDelta)
    }

    pub fn raw() -> Self {
        Self::new(FieldKind::Raw)
    }

    /// Mapping with optional key and value fields.
    pub fn dict(keys: Option<Field>, values: Option<Field>) -> Self {
        Self::new(FieldKind::Dict {
            keys: keys.map(Box::new),
            values: values.map(Box::new),
        })
    }

    /// Absent input is an error. Clears any `missing` default.
    pub fn required(mut self) -> Self {
        self.required = true;
        self.missing = DefaultValue::Absent;
        self
    }

    /// Value used when the input lacks this field. `Null` also allows null input.
    pub fn missing(mut self, value: impl Into<Value>) -> Self {
        let value = value.into();
        if value.is_null() {
            self.allow_none = true;
        }
        self.required = false;
        self.missing = DefaultValue::Literal(value);
        self
    }

    /// Deferred `missing` default, evaluated on every load.
    pub fn missing_with(mut self, factory: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.required = false;
        self.missing = DefaultValue::Factory(DefaultFactory::new(factory));
        self
    }

    /// Accept explicit null input.
    pub fn allow_none(mut self) -> Self {
        self.allow_none = true;
        self
    }

    /// Attach a constraint checked on load.
    pub fn validate(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub(crate) fn bind(&mut self, name: &str, owner: SchemaId) {
        self.name = Some(name.to_string());
        self.owner = Some(owner);
    }

    // ─── Accessors ───────────────────────────────────────────────────

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn missing_value(&self) -> &DefaultValue {
        &self.missing
    }

    pub fn allows_none(&self) -> bool {
        self.allow_none
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn field_metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Bound name, once the field belongs to a schema.
    pub fn bound_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

// ─── Load ────────────────────────────────────────────────────────────

impl Field {
    /// Load one input slot (`None` when the key is absent).
    pub fn load_value(&self, raw: Option<&Value>) -> Result<Option<Value>, FieldError> {
        match raw {
            None => {
                if let Some(default) = self.missing.resolve() {
                    Ok(Some(default))
                } else if self.required {
                    Err(FieldError::Required)
                } else {
                    Ok(None)
                }
            }
            Some(Value::Null) if self.allow_none => Ok(Some(Value::Null)),
            Some(Value::Null) => Err(FieldError::Null),
            Some(value) => {
                let loaded = self.deserialize(value)?;
                for constraint in &self.constraints {
                    constraint.check(&loaded).map_err(FieldError::Constraint)?;
                }
                Ok(Some(loaded))
            }
        }
    }

    /// Read a non-null input value as this field's kind.
    pub fn deserialize(&self, value: &Value) -> Result<Value, FieldError> {
        let invalid = || FieldError::Invalid {
            expected: self.kind.expected(),
        };
        match (&self.kind, value) {
            (FieldKind::Raw, v) => Ok(v.clone()),
            (FieldKind::Str, Value::Str(s)) => Ok(Value::Str(s.clone())),
            (FieldKind::Email, Value::Str(s)) if is_email(s) => Ok(Value::Str(s.clone())),
            (FieldKind::Int | FieldKind::Float | FieldKind::TimeDelta, Value::Bool(_)) => {
                Err(invalid())
            }
            (FieldKind::Int, v) => BaseType::Int.coerce(v).map_err(|_| invalid()),
            (FieldKind::Float, v) => BaseType::Float.coerce(v).map_err(|_| invalid()),
            (FieldKind::Bool, v) => BaseType::Bool.coerce(v).map_err(|_| invalid()),
            (FieldKind::Date, Value::Date(_) | Value::Str(_)) => {
                BaseType::Date.coerce(value).map_err(|_| invalid())
            }
            (FieldKind::DateTime, Value::DateTime(_) | Value::Str(_)) => {
                BaseType::DateTime.coerce(value).map_err(|_| invalid())
            }
            (FieldKind::Time, Value::Time(_) | Value::Str(_)) => {
                BaseType::Time.coerce(value).map_err(|_| invalid())
            }
            (FieldKind::TimeDelta, v) => BaseType::Duration.coerce(v).map_err(|_| invalid()),
            (FieldKind::Dict { keys, values }, Value::Map(entries)) => entries
                .iter()
                .map(|(k, v)| {
                    let key = load_entry(keys.as_deref(), k, k)?;
                    let value = load_entry(values.as_deref(), k, v)?;
                    Ok((key, value))
                })
                .collect::<Result<Vec<_>, FieldError>>()
                .map(Value::Map),
            _ => Err(invalid()),
        }
    }
}

fn load_entry(field: Option<&Field>, key: &Value, value: &Value) -> Result<Value, FieldError> {
    let Some(field) = field else {
        return Ok(value.clone());
    };
    field
        .load_value(Some(value))
        .map(|v| v.unwrap_or(Value::Null))
        .map_err(|error| FieldError::Entry {
            key: key.to_string(),
            error: Box::new(error),
        })
}

/// Minimal address shape check: one `@`, non-empty local part, dotted domain.
fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !s.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|part| !part.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

// ─── Dump ────────────────────────────────────────────────────────────

impl Field {
    /// Dump one object slot (`None` when the object lacks it).
    pub fn dump_value(&self, raw: Option<&Value>) -> Result<Option<Value>, CoercionError> {
        match raw {
            None => self.missing.resolve().map(|v| self.serialize(&v)).transpose(),
            Some(v) => self.serialize(v).map(Some),
        }
    }

    /// Convert a value into this field's primitive output form.
    pub fn serialize(&self, value: &Value) -> Result<Value, CoercionError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let primitive = |v: Value| Value::from_json(&v.to_json());
        match &self.kind {
            FieldKind::Raw => Ok(value.clone()),
            FieldKind::Str | FieldKind::Email => BaseType::Str.coerce(value),
            FieldKind::Int => BaseType::Int.coerce(value),
            FieldKind::Float => BaseType::Float.coerce(value),
            FieldKind::Bool => BaseType::Bool.coerce(value),
            FieldKind::Date => BaseType::Date.coerce(value).map(primitive),
            FieldKind::DateTime => BaseType::DateTime.coerce(value).map(primitive),
            FieldKind::Time => BaseType::Time.coerce(value).map(primitive),
            FieldKind::TimeDelta => BaseType::Duration.coerce(value).map(primitive),
            FieldKind::Dict { keys, values } => {
                let Value::Map(entries) = BaseType::Mapping.coerce(value)? else {
                    return Ok(Value::Null);
                };
                entries
                    .iter()
                    .map(|(k, v)| Ok((dump_entry(keys.as_deref(), k)?, dump_entry(values.as_deref(), v)?)))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Map)
            }
        }
    }
}

fn dump_entry(field: Option<&Field>, value: &Value) -> Result<Value, CoercionError> {
    match field {
        Some(field) => field.serialize(value),
        None => Ok(value.clone()),
    }
}

// ─── Protocol ────────────────────────────────────────────────────────

impl Field {
    /// A field with no settings for `native_type`, or `None` if the type has
    /// no declarative kind. Mapping parameters become key/value fields where
    /// they map, and stay untyped otherwise.
    pub fn from_native_type(native_type: &NativeType) -> Option<Field> {
        match native_type {
            NativeType::Mapping { key, value } => Some(Field::dict(
                Field::from_native_type(key),
                Field::from_native_type(value),
            )),
            other => FIELD_TYPES
                .kind_for(other.base())
                .map(|tag| Field::new(FieldKind::from_tag(tag))),
        }
    }

    /// Build a field representing an element of any dialect.
    ///
    /// Type, required flag, default, and metadata carry over; validators and
    /// constraints of the foreign element do not.
    pub fn from_element(element: &dyn SchemaElement) -> Result<Field, SchemaError> {
        let native_type = element.native_type();
        let mut field = Field::from_native_type(&native_type).ok_or_else(|| {
            SchemaError::UnsupportedType {
                element: element.name().to_string(),
                native_type: native_type.to_string(),
                dialect: crate::schema::DECLARATIVE_DIALECT,
            }
        })?;
        let annotation = element.annotation().unwrap_or_else(TypeAnnotation::required);
        field.required = annotation.is_required();
        field.missing = annotation.default_value().clone();
        field.allow_none = matches!(field.missing, DefaultValue::Literal(Value::Null));
        field.metadata = element.metadata();
        field.name = Some(element.name().to_string());
        Ok(field)
    }

    fn validator(&self) -> ValidatorOverride {
        let field = self.clone();
        ValidatorOverride::new(move |name, raw| {
            field
                .load_value(raw)
                .map_err(|e| ValidationError::new(Some(name), format!("{name}: {e}")).with_source(e))
        })
    }
}

impl SchemaElement for Field {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    fn native_type(&self) -> NativeType {
        match &self.kind {
            FieldKind::Dict { keys, values } => NativeType::mapping(
                keys.as_ref().map_or(NativeType::Any, |k| k.native_type()),
                values.as_ref().map_or(NativeType::Any, |v| v.native_type()),
            ),
            kind => FIELD_TYPES
                .native_of(kind.tag())
                .map_or(NativeType::Any, NativeType::from_base),
        }
    }

    fn annotation(&self) -> Option<TypeAnnotation> {
        Some(
            TypeAnnotation::from_parts(self.required, self.missing.clone())
                .with_metadata(self.metadata.clone())
                .with_validator(self.validator()),
        )
    }

    fn owner(&self) -> Option<SchemaId> {
        self.owner
    }

    fn metadata(&self) -> Metadata {
        self.metadata.clone()
    }

    fn has_dialect_constraints(&self) -> bool {
        let inner = match &self.kind {
            FieldKind::Dict { keys, values } => {
                keys.as_ref().is_some_and(|k| k.has_dialect_constraints())
                    || values.as_ref().is_some_and(|v| v.has_dialect_constraints())
            }
            FieldKind::Email => true,
            _ => false,
        };
        inner || !self.constraints.is_empty()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind.tag())?;
        if let Some(name) = &self.name {
            write!(f, "({name})")?;
        }
        Ok(())
    }
}
