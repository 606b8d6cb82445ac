//! # Declarative Schema — Explicit Fields, Native and JSON Representations
//!
//! A [`DeclarativeSchema`] is an ordered list of named [`Field`]s plus an
//! object factory. Loading turns raw input into typed values; dumping turns
//! typed values into primitives. Both directions are field-driven, so the
//! schema works the same whether or not a native shape is bound.
//!
//! ## Design
//!
//! - Fields are bound (name and owner) when the schema is built. The builder
//!   rejects duplicate names.
//! - `load` collects every field failure before reporting, so callers see
//!   all problems with a payload at once.
//! - JSON output can be streamed: with a writer, the encoded text is handed
//!   over in chunks of at most `stream_chunk_size` bytes, split on character
//!   boundaries.

use std::collections::BTreeMap;
use std::sync::Arc;

use schemata_core::{
    synthesize_schema_name, value_map_from_json, ConstructionOrder, DefaultValue, ElementRef,
    External, FieldDescriptor, Metadata, Object, ObjectFactory, Payload, RecordType,
    Representation, RepresentationSet, Schema, SchemaElement, SchemaError, SchemaId, ShapeError,
    TargetDialect, Value, ValueMap, Writer,
};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::config::{DeclarativeConfig, UnknownPolicy};
use crate::error::{into_validation, DumpError, FieldError, LoadError};
use crate::field::Field;

/// Dialect name reported in errors and logs.
pub const DECLARATIVE_DIALECT: &str = "declarative";

pub const DECLARATIVE_REPRESENTATIONS: RepresentationSet =
    RepresentationSet::new(&[Representation::Native, Representation::Json]);

/// Schema built from explicitly declared fields.
#[derive(Debug, Clone)]
pub struct DeclarativeSchema {
    id: SchemaId,
    name: Option<String>,
    fields: Vec<Field>,
    factory: ObjectFactory,
    context: Metadata,
    config: DeclarativeConfig,
}

/// Collects fields and options for a [`DeclarativeSchema`].
#[derive(Debug, Default)]
pub struct DeclarativeSchemaBuilder {
    name: Option<String>,
    fields: Vec<(String, Field)>,
    shape: Option<Arc<RecordType>>,
    derive_shape: bool,
    context: Metadata,
    config: DeclarativeConfig,
}

impl DeclarativeSchemaBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declare a field. Declaration order is element order.
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    /// Schema-level context, exposed as the schema's metadata.
    pub fn context(mut self, context: Metadata) -> Self {
        self.context = context;
        self
    }

    pub fn config(mut self, config: DeclarativeConfig) -> Self {
        self.config = config;
        self
    }

    /// Bind an existing shape; loaded objects are built through it.
    pub fn shape(mut self, shape: impl Into<Arc<RecordType>>) -> Self {
        self.shape = Some(shape.into());
        self.derive_shape = false;
        self
    }

    /// Bind a keyword-constructed shape generated from the declared fields.
    pub fn derive_shape(mut self) -> Self {
        self.shape = None;
        self.derive_shape = true;
        self
    }

    pub fn build(self) -> Result<DeclarativeSchema, SchemaError> {
        self.config.validate()?;
        let id = SchemaId::new();
        let mut fields = Vec::with_capacity(self.fields.len());
        for (name, mut field) in self.fields {
            if fields.iter().any(|f: &Field| f.name() == name) {
                return Err(ShapeError::DuplicateField {
                    shape: self.name.clone().unwrap_or_default(),
                    field: name,
                }
                .into());
            }
            field.bind(&name, id);
            fields.push(field);
        }

        let shape = match (self.shape, self.derive_shape) {
            (Some(shape), _) => Some(shape),
            (None, true) => {
                let shape_name = self.name.clone().unwrap_or_else(synthesize_schema_name);
                Some(Arc::new(derived_shape(shape_name, &fields)?))
            }
            (None, false) => None,
        };

        let schema = DeclarativeSchema {
            id,
            name: self.name,
            fields,
            factory: ObjectFactory::new(shape),
            context: self.context,
            config: self.config,
        };
        tracing::debug!(
            schema = ?schema.name(),
            fields = schema.fields.len(),
            bound = schema.factory.shape().is_some(),
            "declarative schema built"
        );
        Ok(schema)
    }
}

/// Keyword shape mirroring `fields`. Optional fields without a `missing`
/// default get `Null` so the shape can always be constructed from a load.
fn derived_shape(name: String, fields: &[Field]) -> Result<RecordType, ShapeError> {
    let descriptors = fields
        .iter()
        .map(|field| {
            let mut fd = field.field_descriptor();
            if !field.is_required() && fd.default.is_absent() {
                fd.default = DefaultValue::Literal(Value::Null);
            }
            fd
        })
        .collect::<Vec<FieldDescriptor>>();
    RecordType::new(name, descriptors, ConstructionOrder::KeywordOnly)
}

impl DeclarativeSchema {
    pub fn builder() -> DeclarativeSchemaBuilder {
        DeclarativeSchemaBuilder::default()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn config(&self) -> &DeclarativeConfig {
        &self.config
    }

    pub fn context(&self) -> &Metadata {
        &self.context
    }

    // ─── Load ────────────────────────────────────────────────────────

    /// Load raw input into typed values.
    ///
    /// Every declared field is loaded; absent optional fields without a
    /// default are left out. Keys naming no field follow the configured
    /// [`UnknownPolicy`].
    pub fn load(&self, input: &ValueMap) -> Result<ValueMap, LoadError> {
        let mut loaded = ValueMap::new();
        let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for field in &self.fields {
            let name = field.name();
            match field.load_value(input.get(name)) {
                Ok(Some(value)) => {
                    loaded.insert(name.to_string(), value);
                }
                Ok(None) => {}
                Err(err) => errors.entry(name.to_string()).or_default().push(err.to_string()),
            }
        }

        for (key, value) in input {
            if self.field(key).is_some() {
                continue;
            }
            match self.config.unknown {
                UnknownPolicy::Raise => errors
                    .entry(key.clone())
                    .or_default()
                    .push(FieldError::Unknown.to_string()),
                UnknownPolicy::Exclude => {
                    tracing::trace!(key = %key, "unknown key excluded");
                }
                UnknownPolicy::Include => {
                    loaded.insert(key.clone(), value.clone());
                }
            }
        }

        if errors.is_empty() {
            Ok(loaded)
        } else {
            tracing::debug!(schema = ?self.name(), failed = errors.len(), "load rejected");
            Err(LoadError::Fields { errors })
        }
    }

    /// Parse a JSON document and load it.
    pub fn loads(&self, text: &str) -> Result<ValueMap, LoadError> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        if self.config.enforce_json_schema {
            self.check_json_schema(&json)?;
        }
        let input = value_map_from_json(&json).ok_or(LoadError::NotAnObject {
            found: json_kind(&json),
        })?;
        self.load(&input)
    }

    // ─── Dump ────────────────────────────────────────────────────────

    /// Dump typed values into primitives. Only declared fields are written.
    pub fn dump(&self, values: &ValueMap) -> Result<ValueMap, DumpError> {
        let mut dumped = ValueMap::new();
        for field in &self.fields {
            let name = field.name();
            let value = field
                .dump_value(values.get(name))
                .map_err(|source| DumpError::Field {
                    field: name.to_string(),
                    source,
                })?;
            if let Some(value) = value {
                dumped.insert(name.to_string(), value);
            }
        }
        Ok(dumped)
    }

    /// Dump to a JSON document. Keys follow field declaration order.
    pub fn dumps(&self, values: &ValueMap) -> Result<String, DumpError> {
        let mut dumped = self.dump(values)?;
        let json = DeclaredOrder(
            self.fields
                .iter()
                .filter_map(|field| {
                    let name = field.name();
                    dumped.remove(name).map(|v| (name.to_string(), v.to_json()))
                })
                .collect(),
        );
        let text = if self.config.pretty_json {
            serde_json::to_string_pretty(&json)?
        } else {
            serde_json::to_string(&json)?
        };
        Ok(text)
    }

    fn build_object(&self, values: ValueMap) -> Result<Object, SchemaError> {
        self.factory
            .build(values)
            .map_err(|e| into_validation(None, e))
    }
}

/// Top-level JSON object whose entries serialize in insertion order.
struct DeclaredOrder(Vec<(String, serde_json::Value)>);

impl Serialize for DeclaredOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Hand `text` to `writer` in chunks of at most `chunk_size` bytes. A chunk
/// is extended to the next character boundary when it would split one.
fn stream_text(text: &str, chunk_size: usize, writer: Writer<'_>) -> usize {
    let mut rest = text;
    let mut chunks = 0;
    while !rest.is_empty() {
        let mut end = chunk_size.max(1).min(rest.len());
        while !rest.is_char_boundary(end) {
            end += 1;
        }
        writer(Payload::Text(rest[..end].to_string()));
        rest = &rest[end..];
        chunks += 1;
    }
    chunks
}

impl Schema for DeclarativeSchema {
    fn id(&self) -> SchemaId {
        self.id
    }

    fn dialect(&self) -> &'static str {
        DECLARATIVE_DIALECT
    }

    fn name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or_else(|| self.factory.shape().map(|s| s.name()))
    }

    fn metadata(&self) -> Metadata {
        self.context.clone()
    }

    fn supported_representations(&self) -> RepresentationSet {
        DECLARATIVE_REPRESENTATIONS
    }

    fn supports_streaming_io(&self) -> bool {
        true
    }

    fn bound_shape(&self) -> Option<&Arc<RecordType>> {
        self.factory.shape()
    }

    fn elements(&self) -> Vec<ElementRef<'_>> {
        self.fields
            .iter()
            .map(|f| Box::new(f) as ElementRef<'_>)
            .collect()
    }

    fn to_external(
        &self,
        obj: &Object,
        destination: Representation,
        writer: Option<Writer<'_>>,
    ) -> Result<Option<Payload>, SchemaError> {
        self.check_representation(destination, writer.is_some())?;
        let values = obj.to_value_map();
        let payload = match destination {
            Representation::Json => Payload::Text(self.dumps(&values)?),
            _ => Payload::Native(self.dump(&values)?),
        };
        let Some(writer) = writer else {
            return Ok(Some(payload));
        };
        match payload {
            Payload::Text(text) => {
                let chunks = stream_text(&text, self.config.stream_chunk_size, writer);
                tracing::trace!(schema = ?self.name(), chunks, "json streamed");
            }
            other => writer(other),
        }
        Ok(None)
    }

    fn from_external(&self, external: External<'_>, source: Representation) -> Result<Object, SchemaError> {
        self.check_representation(source, external.is_producer())?;
        let loaded = match (source, external.resolve()) {
            (Representation::Json, Payload::Text(text)) => self.loads(&text)?,
            (Representation::Json, Payload::Bytes(bytes)) => {
                let text = String::from_utf8(bytes).map_err(LoadError::from)?;
                self.loads(&text)?
            }
            (Representation::Json, _) => {
                return Err(LoadError::PayloadKind {
                    representation: "json",
                    expected: "text or bytes",
                }
                .into())
            }
            (_, Payload::Native(values)) => self.load(&values)?,
            (_, _) => {
                return Err(LoadError::PayloadKind {
                    representation: "native",
                    expected: "an in-memory mapping",
                }
                .into())
            }
        };
        self.build_object(loaded)
    }

    fn validate_internal(&self, obj: Object) -> Result<Object, SchemaError> {
        tracing::trace!(schema = ?self.name(), "validating object");
        let dumped = self.dump(&obj.into_value_map())?;
        let loaded = self.load(&dumped)?;
        self.build_object(loaded)
    }
}

impl TargetDialect for DeclarativeSchema {
    type Field = Field;

    const DIALECT: &'static str = DECLARATIVE_DIALECT;
    const DEFAULTS_LAST: bool = false;

    fn field_from_element(element: &dyn SchemaElement) -> Result<Field, SchemaError> {
        Field::from_element(element)
    }

    fn field_has_default(field: &Field) -> bool {
        !field.missing_value().is_absent()
    }

    fn materialize(name: String, metadata: Metadata, fields: Vec<Field>) -> Result<Self, SchemaError> {
        fields
            .into_iter()
            .fold(DeclarativeSchema::builder().name(name), |builder, field| {
                let field_name = field.name().to_string();
                builder.field(field_name, field)
            })
            .context(metadata)
            .derive_shape()
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Constraint;
    use chrono::NaiveDate;
    use schemata_core::{FromSchema, NativeType};
    use std::error::Error as _;

    fn person() -> DeclarativeSchema {
        DeclarativeSchema::builder()
            .name("Person")
            .field("name", Field::str().required())
            .field("age", Field::int().validate(Constraint::range(Some(0.0), Some(150.0))))
            .field("email", Field::email().missing(Value::Null))
            .field("gender", Field::str().validate(Constraint::one_of(["m", "f", "o", "?"])).missing("?"))
            .field("birthday", Field::date())
            .field(
                "schools",
                Field::dict(Some(Field::str()), Some(Field::date())).missing_with(|| Value::Map(Vec::new())),
            )
            .build()
            .unwrap()
    }

    fn input(entries: &[(&str, Value)]) -> ValueMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_load_applies_defaults_and_coercion() {
        let schema = person();
        let loaded = schema
            .load(&input(&[
                ("name", Value::from("Ann")),
                ("age", Value::from("34")),
                ("birthday", Value::from("1990-05-01")),
            ]))
            .unwrap();
        assert_eq!(loaded.get("age"), Some(&Value::Int(34)));
        assert_eq!(loaded.get("email"), Some(&Value::Null));
        assert_eq!(loaded.get("gender"), Some(&Value::from("?")));
        assert_eq!(
            loaded.get("birthday"),
            Some(&Value::Date(NaiveDate::from_ymd_opt(1990, 5, 1).unwrap()))
        );
        assert_eq!(loaded.get("schools"), Some(&Value::Map(Vec::new())));
    }

    #[test]
    fn test_load_collects_all_errors() {
        let schema = person();
        let err = schema
            .load(&input(&[("age", Value::Int(200)), ("gender", Value::from("x"))]))
            .unwrap_err();
        let LoadError::Fields { errors } = &err else {
            panic!("expected field errors");
        };
        assert_eq!(errors["name"], ["Missing data for required field."]);
        assert_eq!(errors["age"], ["Must be between 0 and 150."]);
        assert_eq!(errors["gender"], ["Must be one of: m, f, o, ?."]);
    }

    #[test]
    fn test_unknown_policy() {
        let raw = input(&[("name", Value::from("Ann")), ("colour", Value::from("red"))]);
        let err = person().load(&raw).unwrap_err();
        assert_eq!(err.first_field(), Some("colour"));

        let exclude = DeclarativeSchema::builder()
            .field("name", Field::str())
            .config(DeclarativeConfig {
                unknown: UnknownPolicy::Exclude,
                ..DeclarativeConfig::default()
            })
            .build()
            .unwrap();
        assert!(!exclude.load(&raw).unwrap().contains_key("colour"));

        let include = DeclarativeSchema::builder()
            .field("name", Field::str())
            .config(DeclarativeConfig {
                unknown: UnknownPolicy::Include,
                ..DeclarativeConfig::default()
            })
            .build()
            .unwrap();
        assert_eq!(include.load(&raw).unwrap().get("colour"), Some(&Value::from("red")));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = DeclarativeSchema::builder()
            .field("x", Field::int())
            .field("x", Field::str())
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::Shape(ShapeError::DuplicateField { .. })));
    }

    #[test]
    fn test_zero_chunk_size_rejected_at_build() {
        let err = DeclarativeSchema::builder()
            .config(DeclarativeConfig {
                stream_chunk_size: 0,
                ..DeclarativeConfig::default()
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::Validation(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let schema = person();
        let obj = schema
            .from_external(
                External::Payload(Payload::Text(
                    r#"{"name":"Ann","age":34,"schools":{"Gymnasium":"1981-09-01"}}"#.into(),
                )),
                Representation::Json,
            )
            .unwrap();
        let Some(Payload::Text(text)) = schema.to_external(&obj, Representation::Json, None).unwrap() else {
            panic!("expected text");
        };
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["schools"]["Gymnasium"], "1981-09-01");
        assert_eq!(json["email"], serde_json::Value::Null);
        assert!(json.get("birthday").is_none());
    }

    #[test]
    fn test_bytes_payload_decoded() {
        let schema = person();
        let obj = schema
            .from_external(
                External::Payload(Payload::Bytes(br#"{"name":"Ann"}"#.to_vec())),
                Representation::Json,
            )
            .unwrap();
        assert_eq!(obj.get("name"), Some(&Value::from("Ann")));

        let err = schema
            .from_external(External::Payload(Payload::Bytes(vec![0xff, 0xfe])), Representation::Json)
            .unwrap_err();
        assert!(err.source().is_some_and(|s| s.is::<LoadError>()));
    }

    #[test]
    fn test_malformed_json_and_non_object() {
        let schema = person();
        assert!(matches!(schema.loads("{"), Err(LoadError::Json(_))));
        assert!(matches!(
            schema.loads("[1]"),
            Err(LoadError::NotAnObject { found: "array" })
        ));
    }

    #[test]
    fn test_native_payload_required_for_native() {
        let err = person()
            .from_external(External::Payload(Payload::Text("{}".into())), Representation::Native)
            .unwrap_err();
        assert!(matches!(err, SchemaError::Validation(_)));
    }

    #[test]
    fn test_xml_unsupported() {
        let schema = person();
        let obj = Object::Mapping(input(&[("name", Value::from("Ann"))]));
        assert!(matches!(
            schema.to_external(&obj, Representation::Xml, None),
            Err(SchemaError::UnsupportedRepresentation { requested: Representation::Xml, .. })
        ));
    }

    #[test]
    fn test_streaming_writer_receives_chunks() {
        let schema = DeclarativeSchema::builder()
            .field("name", Field::str())
            .config(DeclarativeConfig {
                stream_chunk_size: 4,
                ..DeclarativeConfig::default()
            })
            .build()
            .unwrap();
        let obj = Object::Mapping(input(&[("name", Value::from("Zoë Ångström"))]));
        let mut chunks = Vec::new();
        let mut sink = |p: Payload| {
            if let Payload::Text(t) = p {
                chunks.push(t);
            }
        };
        let out = schema
            .to_external(&obj, Representation::Json, Some(&mut sink))
            .unwrap();
        assert!(out.is_none());
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| !c.is_empty()));
        assert_eq!(chunks.concat(), r#"{"name":"Zoë Ångström"}"#);
    }

    #[test]
    fn test_producer_is_called_once() {
        let schema = person();
        let mut calls = 0;
        let obj = schema
            .from_external(
                External::producer(|hint| {
                    calls += 1;
                    assert_eq!(hint, None);
                    Payload::Text(r#"{"name":"Ann"}"#.into())
                }),
                Representation::Json,
            )
            .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(obj.get("name"), Some(&Value::from("Ann")));
    }

    #[test]
    fn test_derived_shape_builds_records() {
        let schema = DeclarativeSchema::builder()
            .name("Point")
            .field("x", Field::int().required())
            .field("y", Field::int())
            .derive_shape()
            .build()
            .unwrap();
        let obj = schema
            .from_external(
                External::Payload(Payload::Native(input(&[("x", Value::from("3"))]))),
                Representation::Native,
            )
            .unwrap();
        let record = obj.as_record().unwrap();
        assert_eq!(record.shape().name(), "Point");
        assert_eq!(record.get("x"), Some(&Value::Int(3)));
        assert_eq!(record.get("y"), Some(&Value::Null));
    }

    #[test]
    fn test_validate_internal_coerces() {
        let schema = person();
        let obj = Object::Mapping(input(&[("name", Value::from("Ann")), ("age", Value::Float(34.0))]));
        let validated = schema.validate_internal(obj).unwrap();
        assert_eq!(validated.get("age"), Some(&Value::Int(34)));
    }

    #[test]
    fn test_elements_are_owned_fields() {
        let schema = person();
        assert_eq!(
            schema.element_names(),
            ["name", "age", "email", "gender", "birthday", "schools"]
        );
        assert!(schema.elements().iter().all(|e| schema.owns(&**e)));
        assert_eq!(
            schema.element("schools").map(|e| e.native_type()),
            Some(NativeType::mapping(NativeType::Str, NativeType::Date))
        );
    }

    #[test]
    fn test_add_element_unsupported() {
        let mut schema = person();
        let other = person();
        let foreign = other.field("name").unwrap();
        assert!(matches!(
            schema.add_element(foreign),
            Err(SchemaError::UnsupportedOperation { operation: "add_element", .. })
        ));
    }

    #[test]
    fn test_from_declarative_keeps_order_and_name() {
        let source = person();
        let copy = DeclarativeSchema::from_schema(&source).unwrap();
        assert_eq!(copy.element_names(), source.element_names());
        assert_eq!(copy.name(), Some("Person"));
        assert!(copy.bound_shape().is_some());
        assert!(copy.field("gender").unwrap().constraints().is_empty());
    }

    #[test]
    fn test_dumps_writes_keys_in_declaration_order() {
        let schema = person();
        let text = schema
            .dumps(&input(&[("age", Value::Int(34)), ("name", Value::from("Ann"))]))
            .unwrap();
        assert_eq!(
            text,
            r#"{"name":"Ann","age":34,"email":null,"gender":"?","schools":{}}"#
        );
    }

    #[test]
    fn test_translation_logs_dropped_constraints() {
        #[derive(Clone, Default)]
        struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

        impl std::io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            DeclarativeSchema::from_schema(&person()).unwrap();
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"), "{output}");
        for element in ["age", "email", "gender"] {
            assert!(output.contains(&format!("element={element} ")), "{output}");
        }
        assert!(!output.contains("element=name "), "{output}");
        assert!(!output.contains("element=birthday "), "{output}");
    }
}
