//! # Schema Protocol — The Contract Every Dialect Satisfies
//!
//! A [`Schema`] is an ordered, name-unique collection of
//! [`SchemaElement`]s plus the core operations:
//!
//! - `to_external`: object to a supported representation, optionally streamed
//!   through a writer callback.
//! - `from_external`: the inverse, from a payload or a producer callback.
//! - `validate_internal`: revalidate and coerce an object, returning a
//!   possibly different object.
//! - `elements`: deterministic, restartable iteration.
//!
//! Translation from another dialect lives in [`crate::translate`].
//!
//! ## Design
//!
//! Representation support is a property of the dialect. Implementations call
//! [`Schema::check_representation`] first thing in every conversion so the
//! failure happens before any work is done.

use std::fmt;
use std::sync::Arc;

use crate::annotation::Metadata;
use crate::element::{FieldDescriptor, SchemaElement, SchemaId};
use crate::error::SchemaError;
use crate::factory::{Object, ObjectFactory};
use crate::representation::{Representation, RepresentationSet};
use crate::shape::RecordType;
use crate::types::NativeType;
use crate::value::ValueMap;

/// A materialized external payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// In-memory keyed mapping (`native`).
    Native(ValueMap),
    /// UTF-8 text (`json`).
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

/// Callback producing the external payload on demand.
///
/// Called with `None` to request everything, or with a size hint.
pub type Producer<'a> = Box<dyn FnMut(Option<usize>) -> Payload + 'a>;

/// Input to [`Schema::from_external`].
pub enum External<'a> {
    Payload(Payload),
    Producer(Producer<'a>),
}

impl<'a> External<'a> {
    /// Wrap a producer callback.
    pub fn producer(f: impl FnMut(Option<usize>) -> Payload + 'a) -> Self {
        External::Producer(Box::new(f))
    }

    pub fn is_producer(&self) -> bool {
        matches!(self, External::Producer(_))
    }

    /// The full payload, invoking a producer with request-all semantics.
    pub fn resolve(self) -> Payload {
        match self {
            External::Payload(payload) => payload,
            External::Producer(mut produce) => produce(None),
        }
    }
}

impl fmt::Debug for External<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            External::Payload(p) => f.debug_tuple("Payload").field(p).finish(),
            External::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

impl From<Payload> for External<'_> {
    fn from(payload: Payload) -> Self {
        External::Payload(payload)
    }
}

/// Output callback for streamed externalization; may be called any number of times.
pub type Writer<'a> = &'a mut dyn FnMut(Payload);

/// An element yielded by [`Schema::elements`].
pub type ElementRef<'a> = Box<dyn SchemaElement + 'a>;

/// A dialect-agnostic schema.
pub trait Schema: fmt::Debug + Send + Sync {
    fn id(&self) -> SchemaId;

    /// Name of the dialect implementing this schema.
    fn dialect(&self) -> &'static str;

    fn name(&self) -> Option<&str>;

    /// Schema-level third-party payload. Empty unless the dialect carries one.
    fn metadata(&self) -> Metadata {
        Metadata::new()
    }

    fn supported_representations(&self) -> RepresentationSet;

    fn supports_streaming_io(&self) -> bool;

    /// The native shape objects of this schema are built as, if bound.
    fn bound_shape(&self) -> Option<&Arc<RecordType>>;

    /// Elements in declaration order.
    fn elements(&self) -> Vec<ElementRef<'_>>;

    /// Convert `obj` into `destination`.
    ///
    /// Without a writer the payload is returned. With a writer, output is
    /// handed to it in chunks and `None` is returned.
    fn to_external(
        &self,
        obj: &Object,
        destination: Representation,
        writer: Option<Writer<'_>>,
    ) -> Result<Option<Payload>, SchemaError>;

    /// Build an object from an external payload or producer.
    fn from_external(&self, external: External<'_>, source: Representation) -> Result<Object, SchemaError>;

    /// Revalidate and coerce `obj`. The result need not be the same object.
    fn validate_internal(&self, obj: Object) -> Result<Object, SchemaError>;

    /// Extend the schema with a foreign element.
    fn add_element(&mut self, element: &dyn SchemaElement) -> Result<(), SchemaError> {
        let _ = element;
        Err(SchemaError::UnsupportedOperation {
            operation: "add_element",
            dialect: self.dialect(),
        })
    }

    /// Fail fast unless `kind` (and streaming, if requested) is supported.
    fn check_representation(&self, kind: Representation, streaming: bool) -> Result<(), SchemaError> {
        let supported = self.supported_representations();
        if !supported.contains(kind) {
            return Err(SchemaError::UnsupportedRepresentation {
                requested: kind,
                supported,
                streaming: false,
            });
        }
        if streaming && !self.supports_streaming_io() {
            return Err(SchemaError::UnsupportedRepresentation {
                requested: kind,
                supported,
                streaming: true,
            });
        }
        Ok(())
    }

    fn element(&self, name: &str) -> Option<ElementRef<'_>> {
        self.elements().into_iter().find(|e| e.name() == name)
    }

    fn element_names(&self) -> Vec<String> {
        self.elements().iter().map(|e| e.name().to_string()).collect()
    }

    /// Ordered `(name, native type)` pairs.
    fn annotations(&self) -> Vec<(String, NativeType)> {
        self.elements()
            .iter()
            .map(|e| (e.name().to_string(), e.native_type()))
            .collect()
    }

    /// Elements projected as structural field descriptors.
    fn field_annotations(&self) -> Vec<FieldDescriptor> {
        self.elements().iter().map(|e| e.field_descriptor()).collect()
    }

    /// Whether `element` belongs to this schema.
    fn owns(&self, element: &dyn SchemaElement) -> bool {
        element.owner() == Some(self.id())
    }

    fn factory(&self) -> ObjectFactory {
        ObjectFactory::new(self.bound_shape().cloned())
    }
}

/// A type whose values are described by a schema.
pub trait Schemed {
    fn schema() -> Arc<dyn Schema>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::TypeAnnotation;
    use crate::error::ValidationError;
    use crate::value::Value;

    #[derive(Debug)]
    struct Slot {
        owner: SchemaId,
        name: &'static str,
    }

    impl SchemaElement for Slot {
        fn name(&self) -> &str {
            self.name
        }
        fn native_type(&self) -> NativeType {
            NativeType::Int
        }
        fn annotation(&self) -> Option<TypeAnnotation> {
            Some(TypeAnnotation::required())
        }
        fn owner(&self) -> Option<SchemaId> {
            Some(self.owner)
        }
    }

    #[derive(Debug)]
    struct PairSchema {
        id: SchemaId,
        slots: Vec<Slot>,
    }

    impl PairSchema {
        fn new() -> Self {
            let id = SchemaId::new();
            Self {
                id,
                slots: vec![Slot { owner: id, name: "x" }, Slot { owner: id, name: "y" }],
            }
        }
    }

    impl Schema for PairSchema {
        fn id(&self) -> SchemaId {
            self.id
        }
        fn dialect(&self) -> &'static str {
            "pair"
        }
        fn name(&self) -> Option<&str> {
            Some("Pair")
        }
        fn supported_representations(&self) -> RepresentationSet {
            RepresentationSet::new(&[Representation::Native])
        }
        fn supports_streaming_io(&self) -> bool {
            false
        }
        fn bound_shape(&self) -> Option<&Arc<RecordType>> {
            None
        }
        fn elements(&self) -> Vec<ElementRef<'_>> {
            self.slots.iter().map(|s| Box::new(s) as ElementRef<'_>).collect()
        }
        fn to_external(
            &self,
            obj: &Object,
            destination: Representation,
            writer: Option<Writer<'_>>,
        ) -> Result<Option<Payload>, SchemaError> {
            self.check_representation(destination, writer.is_some())?;
            Ok(Some(Payload::Native(obj.to_value_map())))
        }
        fn from_external(&self, external: External<'_>, source: Representation) -> Result<Object, SchemaError> {
            self.check_representation(source, false)?;
            match external.resolve() {
                Payload::Native(map) => self.validate_internal(Object::Mapping(map)),
                _ => Err(ValidationError::new(None, "expected a mapping").into()),
            }
        }
        fn validate_internal(&self, obj: Object) -> Result<Object, SchemaError> {
            let map = obj.into_value_map();
            let mut out = ValueMap::new();
            for element in self.elements() {
                if let Some(v) = element.validate_value(map.get(element.name()))? {
                    out.insert(element.name().to_string(), v);
                }
            }
            Ok(self.factory().build(out)?)
        }
    }

    #[test]
    fn test_unsupported_representation_fails_before_work() {
        let schema = PairSchema::new();
        let obj = Object::Mapping(ValueMap::new());
        let err = schema.to_external(&obj, Representation::Json, None).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnsupportedRepresentation { requested: Representation::Json, streaming: false, .. }
        ));
    }

    #[test]
    fn test_streaming_rejected_when_unsupported() {
        let schema = PairSchema::new();
        let obj = Object::Mapping(ValueMap::new());
        let mut sink = |_p: Payload| {};
        let err = schema
            .to_external(&obj, Representation::Native, Some(&mut sink))
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedRepresentation { streaming: true, .. }));
    }

    #[test]
    fn test_add_element_unsupported_by_default() {
        let mut schema = PairSchema::new();
        let foreign = Slot { owner: SchemaId::new(), name: "z" };
        let err = schema.add_element(&foreign).unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedOperation { operation: "add_element", .. }));
        assert!(!schema.owns(&foreign));
        assert!(schema.owns(&schema.slots[0]));
    }

    #[test]
    fn test_annotations_in_declaration_order() {
        let schema = PairSchema::new();
        assert_eq!(schema.element_names(), ["x", "y"]);
        assert_eq!(
            schema.annotations(),
            vec![("x".to_string(), NativeType::Int), ("y".to_string(), NativeType::Int)]
        );
        assert_eq!(schema.field_annotations().len(), 2);
        assert!(schema.element("y").is_some());
        assert!(schema.element("q").is_none());
        assert!(schema.metadata().is_empty());
    }

    #[test]
    fn test_producer_invoked_with_request_all() {
        let schema = PairSchema::new();
        let mut calls = Vec::new();
        let obj = schema
            .from_external(
                External::producer(|hint| {
                    calls.push(hint);
                    Payload::Native(
                        [("x".to_string(), Value::from("1")), ("y".to_string(), Value::Int(2))]
                            .into_iter()
                            .collect(),
                    )
                }),
                Representation::Native,
            )
            .unwrap();
        assert_eq!(calls, vec![None]);
        assert_eq!(obj.get("x"), Some(&Value::Int(1)));
    }
}
