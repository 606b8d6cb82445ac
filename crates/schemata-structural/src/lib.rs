//! # schemata-structural — Schemas Reflected From Record Types
//!
//! The structural dialect describes a statically declared [`RecordType`]:
//! its elements are the shape's fields, derived on every iteration, and its
//! only representation is the in-memory native mapping.
//!
//! ## Behavior
//!
//! - **Validation** (`validate_internal`) applies the shared element
//!   algorithm to every field, then re-invokes the shape's constructor, so
//!   shape-level invariants are re-checked along with field coercion.
//!
//! - **Translation target**: the shape is positional, so translated fields
//!   with defaults are moved after fields without. Elements that are
//!   optional without a default get `Null` as their default.
//!
//! - **Extension**: `add_element` appends a field by rebuilding the shape and
//!   refuses additions that would break positional ordering.
//!
//! [`RecordType`]: schemata_core::RecordType

pub mod element;
pub mod schema;

pub use element::StructuralElement;
pub use schema::{StructuralSchema, STRUCTURAL_DIALECT, STRUCTURAL_REPRESENTATIONS, STRUCTURAL_TYPES};
