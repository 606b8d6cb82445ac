//! # Structural Schema
//!
//! Wraps a shared [`RecordType`]. Nothing is cached: elements are rebuilt
//! from the shape on every call to `elements()`, so replacing the shape in
//! `add_element` is all it takes to change the schema.

use std::sync::Arc;

use schemata_core::{
    BaseType, ConstructionOrder, DefaultValue, ElementRef, External, FieldDescriptor, Metadata,
    Object, Payload, RecordType, Representation, RepresentationSet, Schema, SchemaElement,
    SchemaError, SchemaId, ShapeError, TargetDialect, TypeTable, ValidationError, Value, ValueMap,
    Writer,
};

use crate::element::StructuralElement;

/// Dialect name reported in errors and logs.
pub const STRUCTURAL_DIALECT: &str = "structural";

/// The structural dialect only handles the in-memory mapping.
pub const STRUCTURAL_REPRESENTATIONS: RepresentationSet =
    RepresentationSet::new(&[Representation::Native]);

/// Record fields carry native types directly; every base type maps to itself.
pub const STRUCTURAL_TYPES: TypeTable<BaseType> = TypeTable::new(&[
    (BaseType::Any, BaseType::Any),
    (BaseType::Bool, BaseType::Bool),
    (BaseType::Int, BaseType::Int),
    (BaseType::Float, BaseType::Float),
    (BaseType::Str, BaseType::Str),
    (BaseType::Date, BaseType::Date),
    (BaseType::DateTime, BaseType::DateTime),
    (BaseType::Time, BaseType::Time),
    (BaseType::Duration, BaseType::Duration),
    (BaseType::Mapping, BaseType::Mapping),
]);

/// Schema of a statically declared record type.
#[derive(Debug, Clone)]
pub struct StructuralSchema {
    id: SchemaId,
    shape: Arc<RecordType>,
    metadata: Metadata,
}

impl StructuralSchema {
    /// Schema describing `shape`.
    pub fn new(shape: impl Into<Arc<RecordType>>) -> Self {
        Self {
            id: SchemaId::new(),
            shape: shape.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The described record type.
    pub fn shape(&self) -> &Arc<RecordType> {
        &self.shape
    }

    fn structural_elements(&self) -> impl Iterator<Item = StructuralElement> + '_ {
        self.shape
            .fields()
            .iter()
            .map(|fd| StructuralElement::new(self.id, fd.clone()))
    }

    /// Validate every field, then rebuild through the shape constructor.
    fn validate_values(&self, values: &ValueMap) -> Result<Object, SchemaError> {
        let mut validated = ValueMap::new();
        for element in self.structural_elements() {
            if let Some(v) = element.validate_value(values.get(element.name()))? {
                validated.insert(element.name().to_string(), v);
            }
        }
        if let Some(extra) = values.keys().find(|k| self.shape.field(k).is_none()) {
            return Err(ValidationError::new(
                Some(extra.as_str()),
                format!("{} has no element {extra}", self.shape.name()),
            )
            .into());
        }
        self.shape
            .instantiate(validated)
            .map(Object::Record)
            .map_err(|e| shape_failure(self.shape.name(), e).into())
    }
}

fn shape_failure(shape: &str, err: ShapeError) -> ValidationError {
    ValidationError::new(None, format!("cannot construct {shape}: {err}")).with_source(err)
}

impl Schema for StructuralSchema {
    fn id(&self) -> SchemaId {
        self.id
    }

    fn dialect(&self) -> &'static str {
        STRUCTURAL_DIALECT
    }

    fn name(&self) -> Option<&str> {
        Some(self.shape.name())
    }

    fn metadata(&self) -> Metadata {
        self.metadata.clone()
    }

    fn supported_representations(&self) -> RepresentationSet {
        STRUCTURAL_REPRESENTATIONS
    }

    fn supports_streaming_io(&self) -> bool {
        false
    }

    fn bound_shape(&self) -> Option<&Arc<RecordType>> {
        Some(&self.shape)
    }

    fn elements(&self) -> Vec<ElementRef<'_>> {
        self.structural_elements()
            .map(|e| Box::new(e) as ElementRef<'_>)
            .collect()
    }

    fn to_external(
        &self,
        obj: &Object,
        destination: Representation,
        writer: Option<Writer<'_>>,
    ) -> Result<Option<Payload>, SchemaError> {
        self.check_representation(destination, writer.is_some())?;
        let validated = self.validate_values(&obj.to_value_map())?;
        Ok(Some(Payload::Native(validated.into_value_map())))
    }

    fn from_external(&self, external: External<'_>, source: Representation) -> Result<Object, SchemaError> {
        self.check_representation(source, external.is_producer())?;
        match external.resolve() {
            Payload::Native(values) => self.validate_values(&values),
            other => Err(ValidationError::new(
                None,
                format!(
                    "native representation expects an in-memory mapping, got {}",
                    payload_kind(&other)
                ),
            )
            .into()),
        }
    }

    fn validate_internal(&self, obj: Object) -> Result<Object, SchemaError> {
        tracing::trace!(schema = %self.shape.name(), "validating object");
        self.validate_values(&obj.into_value_map())
    }

    fn add_element(&mut self, element: &dyn SchemaElement) -> Result<(), SchemaError> {
        let descriptor = Self::field_from_element(element)?;
        let extended = self.shape.with_field(descriptor)?;
        if element.has_dialect_constraints() {
            tracing::warn!(
                schema = %self.shape.name(),
                element = %element.name(),
                to = STRUCTURAL_DIALECT,
                "dialect-specific constraints have no counterpart and are dropped"
            );
        }
        tracing::debug!(
            schema = %self.shape.name(),
            element = %element.name(),
            "element added"
        );
        self.shape = Arc::new(extended);
        Ok(())
    }
}

fn payload_kind(payload: &Payload) -> &'static str {
    match payload {
        Payload::Native(_) => "mapping",
        Payload::Text(_) => "text",
        Payload::Bytes(_) => "bytes",
    }
}

impl TargetDialect for StructuralSchema {
    type Field = FieldDescriptor;

    const DIALECT: &'static str = STRUCTURAL_DIALECT;
    const DEFAULTS_LAST: bool = true;

    fn field_from_element(element: &dyn SchemaElement) -> Result<FieldDescriptor, SchemaError> {
        let native_type = element.native_type();
        if STRUCTURAL_TYPES.kind_for(native_type.base()).is_none() {
            return Err(SchemaError::UnsupportedType {
                element: element.name().to_string(),
                native_type: native_type.to_string(),
                dialect: STRUCTURAL_DIALECT,
            });
        }

        let mut descriptor = element.field_descriptor();
        if let Some(annotation) = element.annotation() {
            if !annotation.is_required() && descriptor.default.is_absent() {
                descriptor.default = DefaultValue::Literal(Value::Null);
            }
            if annotation.validator().is_some() {
                tracing::debug!(
                    element = %element.name(),
                    "per-element validator not carried into structural field"
                );
            }
        }
        Ok(descriptor)
    }

    fn field_has_default(field: &FieldDescriptor) -> bool {
        field.has_default()
    }

    fn materialize(name: String, metadata: Metadata, fields: Vec<FieldDescriptor>) -> Result<Self, SchemaError> {
        let shape = RecordType::new(name, fields, ConstructionOrder::Positional)?;
        Ok(Self::new(shape).with_metadata(metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemata_core::{FromSchema, NativeType};
    use std::error::Error as _;

    fn inventory_shape() -> RecordType {
        RecordType::new(
            "InventoryItem",
            vec![
                FieldDescriptor::new("name", NativeType::Str),
                FieldDescriptor::new("unit_price", NativeType::Float),
                FieldDescriptor::new("quantity_on_hand", NativeType::Int).with_default(0),
            ],
            ConstructionOrder::Positional,
        )
        .unwrap()
    }

    fn map(entries: &[(&str, Value)]) -> ValueMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_elements_follow_declaration_order() {
        let schema = StructuralSchema::new(inventory_shape());
        assert_eq!(schema.element_names(), ["name", "unit_price", "quantity_on_hand"]);
        assert_eq!(schema.name(), Some("InventoryItem"));
        assert!(schema.elements().iter().all(|e| schema.owns(&**e)));
    }

    #[test]
    fn test_validate_coerces_and_defaults() {
        let schema = StructuralSchema::new(inventory_shape());
        let obj = Object::Mapping(map(&[
            ("name", Value::from("widget")),
            ("unit_price", Value::from("2.2")),
        ]));
        let validated = schema.validate_internal(obj).unwrap();
        assert_eq!(validated.get("unit_price"), Some(&Value::Float(2.2)));
        assert_eq!(validated.get("quantity_on_hand"), Some(&Value::Int(0)));
        assert!(validated.as_record().is_some());
    }

    #[test]
    fn test_malformed_number_chains_cause() {
        let schema = StructuralSchema::new(inventory_shape());
        let obj = Object::Mapping(map(&[
            ("name", Value::from("widget")),
            ("unit_price", Value::from("bla")),
        ]));
        let err = schema.validate_internal(obj).unwrap_err();
        let SchemaError::Validation(v) = err else {
            panic!("expected validation error");
        };
        assert_eq!(v.element(), Some("unit_price"));
        assert!(v.source().is_some());
    }

    #[test]
    fn test_invariant_rechecked_on_validation() {
        let shape = inventory_shape().with_invariant(|r| match r.get("quantity_on_hand") {
            Some(Value::Int(n)) if *n < 0 => Err("negative stock".into()),
            _ => Ok(()),
        });
        let schema = StructuralSchema::new(shape);
        let obj = Object::Mapping(map(&[
            ("name", Value::from("widget")),
            ("unit_price", Value::Float(1.0)),
            ("quantity_on_hand", Value::from("-3")),
        ]));
        let err = schema.validate_internal(obj).unwrap_err();
        assert!(err.to_string().contains("negative stock"));
    }

    #[test]
    fn test_only_native_supported() {
        let schema = StructuralSchema::new(inventory_shape());
        let obj = Object::Mapping(map(&[
            ("name", Value::from("widget")),
            ("unit_price", Value::Float(1.0)),
        ]));
        for kind in [Representation::Json, Representation::Xml, Representation::Html] {
            assert!(matches!(
                schema.to_external(&obj, kind, None),
                Err(SchemaError::UnsupportedRepresentation { .. })
            ));
        }
        let native = schema.to_external(&obj, Representation::Native, None).unwrap();
        let Some(Payload::Native(values)) = native else {
            panic!("expected native payload");
        };
        let back = schema
            .from_external(External::Payload(Payload::Native(values)), Representation::Native)
            .unwrap();
        assert_eq!(back.get("name"), Some(&Value::from("widget")));
        assert_eq!(back.get("quantity_on_hand"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_text_payload_rejected() {
        let schema = StructuralSchema::new(inventory_shape());
        let err = schema
            .from_external(External::Payload(Payload::Text("{}".into())), Representation::Native)
            .unwrap_err();
        assert!(matches!(err, SchemaError::Validation(_)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let schema = StructuralSchema::new(inventory_shape());
        let obj = Object::Mapping(map(&[
            ("name", Value::from("widget")),
            ("unit_price", Value::Float(1.0)),
            ("colour", Value::from("red")),
        ]));
        let SchemaError::Validation(v) = schema.validate_internal(obj).unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(v.element(), Some("colour"));
    }

    #[test]
    fn test_add_element_extends_shape() {
        let mut schema = StructuralSchema::new(inventory_shape());
        let other = StructuralSchema::new(
            RecordType::new(
                "Extra",
                vec![
                    FieldDescriptor::new("sku", NativeType::Str).with_default("n/a"),
                    FieldDescriptor::new("weight", NativeType::Float),
                ],
                ConstructionOrder::KeywordOnly,
            )
            .unwrap(),
        );
        let elements = other.elements();
        schema.add_element(&*elements[0]).unwrap();
        assert_eq!(schema.element_names().last().map(String::as_str), Some("sku"));
        // A required field after a defaulted one breaks positional ordering.
        assert!(matches!(
            schema.add_element(&*elements[1]),
            Err(SchemaError::Shape(ShapeError::NonDefaultAfterDefault { .. }))
        ));
        // Duplicate names are refused.
        assert!(schema.add_element(&*elements[0]).is_err());
    }

    #[test]
    fn test_translation_reorders_defaults_last() {
        let source = StructuralSchema::new(
            RecordType::new(
                "Mixed",
                vec![
                    FieldDescriptor::new("required_a", NativeType::Int),
                    FieldDescriptor::new("defaulted_b", NativeType::Int).with_default(1),
                    FieldDescriptor::new("required_c", NativeType::Int),
                ],
                ConstructionOrder::KeywordOnly,
            )
            .unwrap(),
        );
        let target = StructuralSchema::from_schema(&source).unwrap();
        assert_eq!(target.element_names(), ["required_a", "required_c", "defaulted_b"]);
        assert_eq!(target.name(), Some("Mixed"));
        assert_ne!(target.id(), source.id());
        let record = target
            .shape()
            .instantiate_positional(vec![Value::Int(1), Value::Int(3)])
            .unwrap();
        assert_eq!(record.get("defaulted_b"), Some(&Value::Int(1)));
    }
}
