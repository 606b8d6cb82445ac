//! # Object Factory — Materializing Schema-Described Values
//!
//! After internalization or validation a dialect holds a flat mapping of
//! field name to value. The factory turns that mapping into an [`Object`]:
//! a [`Record`] of the bound shape when there is one, or the mapping itself
//! when the schema transports data without a concrete shape.

use std::sync::Arc;

use crate::error::ShapeError;
use crate::shape::{Record, RecordType};
use crate::value::{Value, ValueMap};

/// A value described by a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Instance of the schema's bound shape.
    Record(Record),
    /// Plain keyed mapping, for schemas without a bound shape.
    Mapping(ValueMap),
}

impl Object {
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Object::Record(record) => record.get(name),
            Object::Mapping(map) => map.get(name),
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Object::Record(record) => Some(record),
            Object::Mapping(_) => None,
        }
    }

    pub fn to_value_map(&self) -> ValueMap {
        match self {
            Object::Record(record) => record.to_value_map(),
            Object::Mapping(map) => map.clone(),
        }
    }

    pub fn into_value_map(self) -> ValueMap {
        match self {
            Object::Record(record) => record.into_value_map(),
            Object::Mapping(map) => map,
        }
    }
}

impl From<Record> for Object {
    fn from(record: Record) -> Self {
        Object::Record(record)
    }
}

impl From<ValueMap> for Object {
    fn from(map: ValueMap) -> Self {
        Object::Mapping(map)
    }
}

/// Builds objects of an optionally bound shape from keyed mappings.
#[derive(Debug, Clone, Default)]
pub struct ObjectFactory {
    shape: Option<Arc<RecordType>>,
}

impl ObjectFactory {
    pub fn new(shape: Option<Arc<RecordType>>) -> Self {
        Self { shape }
    }

    pub fn shape(&self) -> Option<&Arc<RecordType>> {
        self.shape.as_ref()
    }

    /// Construct via the shape's by-name constructor, or pass the mapping through.
    pub fn build(&self, values: ValueMap) -> Result<Object, ShapeError> {
        match &self.shape {
            Some(shape) => shape.instantiate(values).map(Object::Record),
            None => Ok(Object::Mapping(values)),
        }
    }
}
