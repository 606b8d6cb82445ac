//! # schemata-core — Dialect-Agnostic Schema Protocol
//!
//! This crate defines the contract that independently implemented schema
//! dialects satisfy so they can describe data shapes, validate values,
//! convert between native and external representations, and translate a
//! schema from one dialect into another without knowing each other's
//! implementation.
//!
//! ## Key Design Principles
//!
//! 1. **Closed representation set.** [`Representation`] enumerates every
//!    external kind; each dialect declares its [`RepresentationSet`] and
//!    unsupported requests fail before any conversion work.
//!
//! 2. **Capability interfaces, not reflection.** Dialects expose slots
//!    through [`SchemaElement`] and schemas through [`Schema`]. The
//!    translation engine reads nothing else.
//!
//! 3. **Explicit absence.** A missing default is [`DefaultValue::Absent`],
//!    never a sentinel object, and `Literal(Value::Null)` is a real default.
//!
//! 4. **Immutable translation tables.** Each dialect owns a constant
//!    [`TypeTable`]; there is no shared mutable type registry.
//!
//! 5. **One error surface.** Every protocol operation returns
//!    [`SchemaError`]; dialect-internal failures are wrapped as
//!    [`ValidationError`] with the original as `source`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `schemata-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Logging through `tracing` only; no subscriber is installed here.

pub mod annotation;
pub mod element;
pub mod error;
pub mod factory;
pub mod representation;
pub mod schema;
pub mod shape;
pub mod translate;
pub mod types;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use annotation::{DefaultFactory, DefaultValue, Metadata, TypeAnnotation, ValidatorOverride};
pub use element::{validate_element_value, FieldDescriptor, SchemaElement, SchemaId};
pub use error::{BoxError, CoercionError, SchemaError, ShapeError, ValidationError};
pub use factory::{Object, ObjectFactory};
pub use representation::{Representation, RepresentationSet, UnknownRepresentation};
pub use schema::{ElementRef, External, Payload, Producer, Schema, Schemed, Writer};
pub use shape::{ConstructionOrder, Invariant, Record, RecordType};
pub use translate::{defaults_last, synthesize_schema_name, translate, FromSchema, TargetDialect, TypeTable};
pub use types::{BaseType, NativeType};
pub use value::{value_map_from_json, value_map_to_json, Value, ValueMap};
