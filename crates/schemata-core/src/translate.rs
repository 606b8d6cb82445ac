//! # Translation Engine — Building One Dialect's Schema From Another's
//!
//! `Target::from_schema(&source)` walks the source schema's elements in
//! order, maps each into the target dialect's native field representation,
//! and materializes the target schema (and its native shape) only once the
//! complete field list is known.
//!
//! ## Algorithm
//!
//! 1. Name the result after the source, or synthesize `Schema_<8 hex>`.
//! 2. For each source element: reject deferred defaults the target cannot
//!    keep, note dialect-specific constraints that will be lost, and build
//!    the target field via [`TargetDialect::field_from_element`].
//! 3. If the target constructs positionally, stable-sort the fields so
//!    those without defaults come first ([`defaults_last`]).
//! 4. Materialize the target from the ordered fields.
//!
//! Translation is all-or-nothing: the first failing element aborts it and
//! nothing partially built escapes.

use std::fmt;

use uuid::Uuid;

use crate::annotation::Metadata;
use crate::element::SchemaElement;
use crate::error::SchemaError;
use crate::schema::Schema;
use crate::types::BaseType;

/// Immutable, per-dialect mapping between field kinds and native base types.
///
/// Forward lookups take the first entry for a kind; reverse lookups take the
/// last entry for a base type, so a general kind listed after a specialized
/// one (plain text after e-mail) wins the reverse direction.
#[derive(Debug, Clone, Copy)]
pub struct TypeTable<K: 'static> {
    entries: &'static [(K, BaseType)],
}

impl<K: Copy + PartialEq + 'static> TypeTable<K> {
    pub const fn new(entries: &'static [(K, BaseType)]) -> Self {
        Self { entries }
    }

    /// Native base type of a field kind.
    pub fn native_of(&self, kind: K) -> Option<BaseType> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, base)| *base)
    }

    /// Field kind representing a native base type.
    pub fn kind_for(&self, base: BaseType) -> Option<K> {
        self.entries
            .iter()
            .rev()
            .find(|(_, b)| *b == base)
            .map(|(k, _)| *k)
    }

    pub fn entries(&self) -> &'static [(K, BaseType)] {
        self.entries
    }
}

/// A dialect that can be built by translating another schema.
pub trait TargetDialect: Schema + Sized {
    /// The dialect's native field representation.
    type Field: fmt::Debug;

    const DIALECT: &'static str;

    /// Whether fields with defaults must follow fields without.
    const DEFAULTS_LAST: bool;

    /// Whether the dialect can hold a deferred (factory) default.
    const SUPPORTS_DEFAULT_FACTORY: bool = true;

    /// Map one foreign element to a target field.
    fn field_from_element(element: &dyn SchemaElement) -> Result<Self::Field, SchemaError>;

    fn field_has_default(field: &Self::Field) -> bool;

    /// Build the target schema and its native shape from the ordered fields.
    fn materialize(name: String, metadata: Metadata, fields: Vec<Self::Field>) -> Result<Self, SchemaError>;
}

/// Construct a schema of this dialect from a schema of any dialect.
pub trait FromSchema: Sized {
    fn from_schema(source: &dyn Schema) -> Result<Self, SchemaError>;
}

impl<T: TargetDialect> FromSchema for T {
    fn from_schema(source: &dyn Schema) -> Result<Self, SchemaError> {
        translate::<T>(source)
    }
}

/// Run the translation algorithm for target dialect `T`.
pub fn translate<T: TargetDialect>(source: &dyn Schema) -> Result<T, SchemaError> {
    let name = source
        .name()
        .map(str::to_owned)
        .unwrap_or_else(synthesize_schema_name);
    tracing::debug!(
        schema = %name,
        from = source.dialect(),
        to = T::DIALECT,
        "translating schema"
    );

    let elements = source.elements();
    let mut fields = Vec::with_capacity(elements.len());
    for element in &elements {
        let element: &dyn SchemaElement = &**element;
        let has_factory = element
            .annotation()
            .is_some_and(|a| a.default_value().is_factory());
        if has_factory && !T::SUPPORTS_DEFAULT_FACTORY {
            return Err(SchemaError::UnsupportedType {
                element: element.name().to_string(),
                native_type: format!("{} with deferred default", element.native_type()),
                dialect: T::DIALECT,
            });
        }
        if element.has_dialect_constraints() {
            tracing::warn!(
                schema = %name,
                element = %element.name(),
                from = source.dialect(),
                to = T::DIALECT,
                "dialect-specific constraints have no counterpart and are dropped"
            );
        }
        let field = T::field_from_element(element)?;
        tracing::debug!(element = %element.name(), ?field, "element mapped");
        fields.push(field);
    }

    if T::DEFAULTS_LAST {
        fields = defaults_last(fields, T::field_has_default);
        tracing::debug!(schema = %name, "fields reordered with defaults last");
    }

    let schema = T::materialize(name, source.metadata(), fields)?;
    tracing::debug!(schema = ?schema.name(), to = T::DIALECT, "shape materialized");
    Ok(schema)
}

/// Stable sort: fields without a default first, relative order kept within each group.
pub fn defaults_last<F>(mut fields: Vec<F>, has_default: impl Fn(&F) -> bool) -> Vec<F> {
    fields.sort_by_key(|f| has_default(f));
    fields
}

/// `Schema_` followed by 8 hex characters of a fresh v4 uuid.
pub fn synthesize_schema_name() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("Schema_{}", &hex[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Kind {
        Text,
        Mail,
        Number,
    }

    const TABLE: TypeTable<Kind> = TypeTable::new(&[
        (Kind::Number, BaseType::Int),
        (Kind::Mail, BaseType::Str),
        (Kind::Text, BaseType::Str),
    ]);

    #[test]
    fn test_type_table_forward_and_reverse() {
        assert_eq!(TABLE.native_of(Kind::Mail), Some(BaseType::Str));
        assert_eq!(TABLE.kind_for(BaseType::Str), Some(Kind::Text));
        assert_eq!(TABLE.kind_for(BaseType::Int), Some(Kind::Number));
        assert_eq!(TABLE.kind_for(BaseType::Date), None);
    }

    #[test]
    fn test_defaults_last_example() {
        let fields = vec![("required_a", false), ("defaulted_b", true), ("required_c", false)];
        let ordered = defaults_last(fields, |f| f.1);
        let names: Vec<_> = ordered.iter().map(|f| f.0).collect();
        assert_eq!(names, ["required_a", "required_c", "defaulted_b"]);
    }

    #[test]
    fn test_synthesized_name_format() {
        let name = synthesize_schema_name();
        assert_eq!(name.len(), "Schema_".len() + 8);
        assert!(name.starts_with("Schema_"));
        assert!(name["Schema_".len()..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(name, synthesize_schema_name());
    }
}
