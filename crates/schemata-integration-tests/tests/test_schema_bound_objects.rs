//! # Schema-Bound Objects, Reflection, and Extension
//!
//! Types expose their schema through `Schemed`; schemas expose their
//! elements through `annotations()` / `field_annotations()`; the structural
//! dialect can be extended with elements borrowed from another dialect.

use std::sync::{Arc, Mutex, OnceLock};

use schemata_core::{
    ConstructionOrder, DefaultValue, FieldDescriptor, NativeType, Object, RecordType, Schema,
    SchemaError, Schemed, Value, ValueMap,
};
use schemata_declarative::{Constraint, DeclarativeSchema, Field};
use schemata_structural::StructuralSchema;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::util::SubscriberInitExt;

struct InventoryItem;

impl Schemed for InventoryItem {
    fn schema() -> Arc<dyn Schema> {
        static SCHEMA: OnceLock<Arc<dyn Schema>> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                let shape = RecordType::new(
                    "InventoryItem",
                    vec![
                        FieldDescriptor::new("name", NativeType::Str),
                        FieldDescriptor::new("unit_price", NativeType::Float),
                        FieldDescriptor::new("quantity_on_hand", NativeType::Int).with_default(0),
                    ],
                    ConstructionOrder::Positional,
                )
                .unwrap_or_else(|e| panic!("inventory shape: {e}"));
                Arc::new(StructuralSchema::new(shape))
            })
            .clone()
    }
}

struct Contact;

impl Schemed for Contact {
    fn schema() -> Arc<dyn Schema> {
        static SCHEMA: OnceLock<Arc<dyn Schema>> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                let schema = DeclarativeSchema::builder()
                    .name("Contact")
                    .field("email", Field::email().required())
                    .field("priority", Field::int().missing(1).validate(Constraint::range(Some(1.0), Some(5.0))))
                    .derive_shape()
                    .build()
                    .unwrap_or_else(|e| panic!("contact schema: {e}"));
                Arc::new(schema)
            })
            .clone()
    }
}

fn values(entries: &[(&str, Value)]) -> ValueMap {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// 1. Schema-bound types
// ---------------------------------------------------------------------------

#[test]
fn schemed_accessor_returns_one_shared_schema() {
    let a = InventoryItem::schema();
    let b = InventoryItem::schema();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.id(), b.id());
    assert_eq!(a.dialect(), "structural");
}

#[test]
fn factory_builds_records_of_bound_shape() {
    let schema = InventoryItem::schema();
    let obj = schema
        .factory()
        .build(values(&[("name", Value::from("widget")), ("unit_price", Value::Float(2.5))]))
        .unwrap();
    let record = obj.as_record().unwrap();
    assert_eq!(record.shape().name(), "InventoryItem");
    assert_eq!(record.get("quantity_on_hand"), Some(&Value::Int(0)));
    assert!(Arc::ptr_eq(record.shape(), schema.bound_shape().unwrap()));
}

#[test]
fn schemas_of_both_dialects_behave_alike_behind_the_trait() {
    for (schema, raw) in [
        (
            InventoryItem::schema(),
            values(&[("name", Value::from("widget")), ("unit_price", Value::from("1.5"))]),
        ),
        (Contact::schema(), values(&[("email", Value::from("mgf@acm.org"))])),
    ] {
        let obj = schema.validate_internal(Object::Mapping(raw)).unwrap();
        assert!(obj.as_record().is_some(), "{}", schema.dialect());
        let again = schema.validate_internal(obj.clone()).unwrap();
        assert_eq!(again, obj);
    }
}

#[test]
fn declarative_constraint_enforced_through_trait() {
    let err = Contact::schema()
        .validate_internal(Object::Mapping(values(&[
            ("email", Value::from("mgf@acm.org")),
            ("priority", Value::Int(9)),
        ])))
        .unwrap_err();
    let SchemaError::Validation(v) = err else {
        panic!("expected validation error");
    };
    assert_eq!(v.element(), Some("priority"));
}

// ---------------------------------------------------------------------------
// 2. Reflection
// ---------------------------------------------------------------------------

#[test]
fn annotations_are_ordered_name_type_pairs() {
    assert_eq!(
        InventoryItem::schema().annotations(),
        vec![
            ("name".to_string(), NativeType::Str),
            ("unit_price".to_string(), NativeType::Float),
            ("quantity_on_hand".to_string(), NativeType::Int),
        ]
    );
    assert_eq!(
        Contact::schema().annotations(),
        vec![("email".to_string(), NativeType::Str), ("priority".to_string(), NativeType::Int)]
    );
}

#[test]
fn field_annotations_project_defaults() {
    let fields = Contact::schema().field_annotations();
    assert_eq!(fields[0].default, DefaultValue::Absent);
    assert_eq!(fields[1].default, DefaultValue::Literal(Value::Int(1)));
}

#[test]
fn elements_iterate_restartably() {
    let schema = Contact::schema();
    let first: Vec<String> = schema.elements().iter().map(|e| e.name().to_string()).collect();
    let second = schema.element_names();
    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// 3. Extension
// ---------------------------------------------------------------------------

#[test]
fn structural_schema_accepts_declarative_element() {
    let mut schema = StructuralSchema::new(
        RecordType::new(
            "Ticket",
            vec![FieldDescriptor::new("title", NativeType::Str)],
            ConstructionOrder::Positional,
        )
        .unwrap(),
    );
    let contact = Contact::schema();
    let priority = contact.element("priority").unwrap();
    schema.add_element(&*priority).unwrap();

    assert_eq!(schema.element_names(), ["title", "priority"]);
    assert!(schema.owns(&*schema.element("priority").unwrap()));
    let obj = schema
        .validate_internal(Object::Mapping(values(&[("title", Value::from("Broken"))])))
        .unwrap();
    assert_eq!(obj.get("priority"), Some(&Value::Int(1)));
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn extension_with_constrained_element_logs_dropped_constraints() {
    let log = CapturedLog::default();
    let writer = log.clone();
    let _guard = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(LevelFilter::WARN)
        .set_default();

    let mut schema = StructuralSchema::new(
        RecordType::new(
            "Ticket",
            vec![FieldDescriptor::new("title", NativeType::Str).with_default("untitled")],
            ConstructionOrder::Positional,
        )
        .unwrap(),
    );
    let contact = Contact::schema();
    schema.add_element(&*contact.element("email").unwrap()).unwrap_err();
    schema.add_element(&*contact.element("priority").unwrap()).unwrap();

    let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("WARN"), "{output}");
    assert!(output.contains("element=priority "), "{output}");
    assert!(!output.contains("element=email "), "{output}");
}

#[test]
fn declarative_schema_refuses_extension() {
    let mut schema = DeclarativeSchema::builder()
        .name("Ticket")
        .field("title", Field::str())
        .build()
        .unwrap();
    let inventory = InventoryItem::schema();
    let name = inventory.element("name").unwrap();
    let err = schema.add_element(&*name).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::UnsupportedOperation { operation: "add_element", dialect: "declarative" }
    ));
}
