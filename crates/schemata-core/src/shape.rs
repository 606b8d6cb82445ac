//! # Native Shapes — Record Types and Their Instances
//!
//! A [`RecordType`] is the concrete structure a schema describes: a name, an
//! ordered field list, and a construction discipline. Instances are
//! [`Record`]s. Shapes are immutable once built and are shared as
//! `Arc<RecordType>` between a schema, its object factory, and every record.
//!
//! ## Construction order
//!
//! - `Positional` shapes can be built from an argument list, so every field
//!   with a default must follow every field without one. `RecordType::new`
//!   rejects field lists that break this.
//! - `KeywordOnly` shapes are only built by name and accept any order.
//!
//! ## Invariant checks
//!
//! An optional shape-level invariant runs on every instantiation, so
//! re-instantiating a record re-checks it.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::element::FieldDescriptor;
use crate::error::ShapeError;
use crate::value::{Value, ValueMap};

/// How instances of a shape may be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionOrder {
    Positional,
    KeywordOnly,
}

/// Shape-level check run on every instantiation.
pub type Invariant = Arc<dyn Fn(&Record) -> Result<(), String> + Send + Sync>;

/// A named record type with ordered fields.
#[derive(Clone)]
pub struct RecordType {
    name: String,
    fields: Vec<FieldDescriptor>,
    order: ConstructionOrder,
    invariant: Option<Invariant>,
}

impl RecordType {
    /// Build a shape, checking name uniqueness and positional ordering.
    pub fn new(
        name: impl Into<String>,
        fields: Vec<FieldDescriptor>,
        order: ConstructionOrder,
    ) -> Result<Self, ShapeError> {
        let name = name.into();
        let mut seen = HashSet::new();
        let mut default_seen = false;
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ShapeError::DuplicateField {
                    shape: name,
                    field: field.name.clone(),
                });
            }
            if order == ConstructionOrder::Positional {
                if field.has_default() {
                    default_seen = true;
                } else if default_seen {
                    return Err(ShapeError::NonDefaultAfterDefault {
                        shape: name,
                        field: field.name.clone(),
                    });
                }
            }
        }
        Ok(Self {
            name,
            fields,
            order,
            invariant: None,
        })
    }

    /// Attach a shape-level invariant.
    pub fn with_invariant(
        mut self,
        check: impl Fn(&Record) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.invariant = Some(Arc::new(check));
        self
    }

    /// A new shape with `field` appended; the invariant carries over.
    pub fn with_field(&self, field: FieldDescriptor) -> Result<Self, ShapeError> {
        let mut fields = self.fields.clone();
        fields.push(field);
        let mut extended = Self::new(self.name.clone(), fields, self.order)?;
        extended.invariant = self.invariant.clone();
        Ok(extended)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn order(&self) -> ConstructionOrder {
        self.order
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Construct an instance from named arguments.
    ///
    /// Fields without an argument take their default; a field with neither
    /// is an error, as is an argument naming no field.
    pub fn instantiate(self: &Arc<Self>, mut args: ValueMap) -> Result<Record, ShapeError> {
        if let Some(unknown) = args.keys().find(|k| self.index_of(k).is_none()) {
            return Err(ShapeError::UnknownArgument {
                shape: self.name.clone(),
                argument: unknown.clone(),
            });
        }
        let values = self
            .fields
            .iter()
            .map(|field| {
                args.remove(&field.name)
                    .or_else(|| field.default.resolve())
                    .ok_or_else(|| ShapeError::MissingArgument {
                        shape: self.name.clone(),
                        field: field.name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.finish(values)
    }

    /// Construct an instance from positional arguments.
    pub fn instantiate_positional(self: &Arc<Self>, args: Vec<Value>) -> Result<Record, ShapeError> {
        if args.len() > self.fields.len() {
            return Err(ShapeError::TooManyPositional {
                shape: self.name.clone(),
                expected: self.fields.len(),
                given: args.len(),
            });
        }
        let mut args = args.into_iter();
        let values = self
            .fields
            .iter()
            .map(|field| {
                args.next()
                    .or_else(|| field.default.resolve())
                    .ok_or_else(|| ShapeError::MissingArgument {
                        shape: self.name.clone(),
                        field: field.name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.finish(values)
    }

    fn finish(self: &Arc<Self>, values: Vec<Value>) -> Result<Record, ShapeError> {
        let record = Record {
            shape: Arc::clone(self),
            values,
        };
        if let Some(check) = &self.invariant {
            check(&record).map_err(|reason| ShapeError::InvariantViolated {
                shape: self.name.clone(),
                reason,
            })?;
        }
        Ok(record)
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("order", &self.order)
            .field("invariant", &self.invariant.is_some())
            .finish()
    }
}

/// An instance of a [`RecordType`].
#[derive(Debug, Clone)]
pub struct Record {
    shape: Arc<RecordType>,
    values: Vec<Value>,
}

impl Record {
    pub fn shape(&self) -> &Arc<RecordType> {
        &self.shape
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.shape.index_of(name).map(|i| &self.values[i])
    }

    /// Overwrite one field. Does not run the shape invariant.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), ShapeError> {
        let index = self
            .shape
            .index_of(name)
            .ok_or_else(|| ShapeError::UnknownArgument {
                shape: self.shape.name.clone(),
                argument: name.to_string(),
            })?;
        self.values[index] = value;
        Ok(())
    }

    /// Field values in declaration order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn to_value_map(&self) -> ValueMap {
        self.shape
            .field_names()
            .map(str::to_owned)
            .zip(self.values.iter().cloned())
            .collect()
    }

    pub fn into_value_map(self) -> ValueMap {
        let names: Vec<String> = self.shape.field_names().map(str::to_owned).collect();
        names.into_iter().zip(self.values).collect()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.shape.name == other.shape.name && self.to_value_map() == other.to_value_map()
    }
}
