//! # JSON Schema Export
//!
//! Generates a Draft 2020-12 document describing the JSON form a
//! [`DeclarativeSchema`] dumps and loads, and checks JSON input against it.
//!
//! The document describes the *dumped* form: temporal kinds are strings with
//! a `format`, durations are numbers of seconds. Constraints with a JSON
//! Schema counterpart are carried (`enum`, bounds, lengths); predicates are
//! not.

use serde_json::{json, Map, Value as Json};

use schemata_core::{DefaultValue, Schema, SchemaElement};

use crate::config::UnknownPolicy;
use crate::constraint::Constraint;
use crate::error::LoadError;
use crate::field::{Field, FieldKind};
use crate::schema::DeclarativeSchema;

const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

impl DeclarativeSchema {
    /// JSON Schema for this schema's JSON representation.
    pub fn to_json_schema(&self) -> Json {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in self.fields() {
            properties.insert(field.name().to_string(), field_schema(field));
            if field.is_required() {
                required.push(Json::String(field.name().to_string()));
            }
        }

        let mut doc = Map::new();
        doc.insert("$schema".into(), json!(DRAFT_2020_12));
        if let Some(name) = self.name() {
            doc.insert("title".into(), json!(name));
        }
        doc.insert("type".into(), json!("object"));
        doc.insert("properties".into(), Json::Object(properties));
        if !required.is_empty() {
            doc.insert("required".into(), Json::Array(required));
        }
        doc.insert(
            "additionalProperties".into(),
            json!(self.config().unknown != UnknownPolicy::Raise),
        );
        Json::Object(doc)
    }

    /// Check `instance` against [`to_json_schema`](Self::to_json_schema).
    pub fn check_json_schema(&self, instance: &Json) -> Result<(), LoadError> {
        let schema = self.to_json_schema();
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        let validator = opts.build(&schema).map_err(|e| LoadError::JsonSchema {
            violations: vec![format!("generated schema rejected: {e}")],
        })?;

        let violations: Vec<String> = validator
            .iter_errors(instance)
            .map(|e| format!("{}: {}", e.instance_path, e))
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            tracing::debug!(schema = ?self.name(), violations = violations.len(), "json schema check failed");
            Err(LoadError::JsonSchema { violations })
        }
    }
}

fn field_schema(field: &Field) -> Json {
    let mut schema = kind_schema(field.kind());
    for constraint in field.constraints() {
        apply_constraint(&mut schema, field.kind(), constraint);
    }
    if let DefaultValue::Literal(default) = field.missing_value() {
        if let Ok(Some(dumped)) = field.dump_value(Some(default)) {
            schema.insert("default".into(), dumped.to_json());
        }
    }
    for (key, value) in field.field_metadata() {
        if matches!(key.as_str(), "title" | "description" | "examples" | "deprecated") {
            schema.insert(key.clone(), value.clone());
        }
    }
    if field.allows_none() {
        if let Some(ty) = schema.get("type").cloned() {
            schema.insert("type".into(), json!([ty, "null"]));
        }
    }
    Json::Object(schema)
}

fn kind_schema(kind: &FieldKind) -> Map<String, Json> {
    let (ty, format) = match kind {
        FieldKind::Str => ("string", None),
        FieldKind::Email => ("string", Some("email")),
        FieldKind::Int => ("integer", None),
        FieldKind::Float | FieldKind::TimeDelta => ("number", None),
        FieldKind::Bool => ("boolean", None),
        FieldKind::Date => ("string", Some("date")),
        FieldKind::DateTime => ("string", Some("date-time")),
        FieldKind::Time => ("string", Some("time")),
        FieldKind::Dict { values, .. } => {
            let mut map = Map::new();
            map.insert("type".into(), json!("object"));
            if let Some(values) = values {
                map.insert("additionalProperties".into(), field_schema(values));
            }
            return map;
        }
        FieldKind::Raw => return Map::new(),
    };
    let mut map = Map::new();
    map.insert("type".into(), json!(ty));
    if let Some(format) = format {
        map.insert("format".into(), json!(format));
    }
    map
}

fn apply_constraint(schema: &mut Map<String, Json>, kind: &FieldKind, constraint: &Constraint) {
    match constraint {
        Constraint::OneOf(choices) => {
            schema.insert(
                "enum".into(),
                Json::Array(choices.iter().map(|c| c.to_json()).collect()),
            );
        }
        Constraint::Range { min, max } => {
            if let Some(min) = min {
                schema.insert("minimum".into(), json!(min));
            }
            if let Some(max) = max {
                schema.insert("maximum".into(), json!(max));
            }
        }
        Constraint::Length { min, max } => {
            let (lo, hi) = match kind {
                FieldKind::Dict { .. } => ("minProperties", "maxProperties"),
                _ => ("minLength", "maxLength"),
            };
            if let Some(min) = min {
                schema.insert(lo.into(), json!(min));
            }
            if let Some(max) = max {
                schema.insert(hi.into(), json!(max));
            }
        }
        Constraint::Predicate { name, .. } => {
            tracing::trace!(predicate = %name, "predicate has no JSON Schema form");
        }
    }
}
