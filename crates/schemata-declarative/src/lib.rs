//! # schemata-declarative — Explicitly Declared Field Schemas
//!
//! The declarative dialect builds a schema from named [`Field`]s, each with
//! its own load and dump behavior. It supports the native mapping and JSON
//! text representations, streams JSON output through a writer callback, and
//! can export a JSON Schema document describing its JSON form.
//!
//! ## Behavior
//!
//! - **Loading** is lenient per field kind (numeric strings become numbers,
//!   ISO strings become dates) and then runs the field's constraints. All
//!   failures are collected into one error.
//!
//! - **Unknown keys** follow [`UnknownPolicy`]: raise (default), exclude, or
//!   include.
//!
//! - **Translation target**: declaration order is kept and defaults stay
//!   where they are. A keyword-constructed shape is generated for the result.
//!   Foreign elements of type `Any` have no field kind and are rejected.
//!
//! - **Translation source**: e-mail checks and constraints have no
//!   dialect-neutral form; translating away from this dialect drops them and
//!   logs a warning.
//!
//! - **Configuration**: [`DeclarativeConfig`] is plain serde data and can be
//!   read from YAML.

pub mod config;
pub mod constraint;
pub mod error;
pub mod field;
pub mod json_schema;
pub mod schema;

pub use config::{ConfigError, DeclarativeConfig, UnknownPolicy};
pub use constraint::Constraint;
pub use error::{DumpError, FieldError, LoadError};
pub use field::{Field, FieldKind, FieldTag, FIELD_TYPES};
pub use schema::{
    DeclarativeSchema, DeclarativeSchemaBuilder, DECLARATIVE_DIALECT, DECLARATIVE_REPRESENTATIONS,
};
