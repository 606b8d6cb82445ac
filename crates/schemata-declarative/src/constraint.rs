//! Load-time value constraints attached to declarative fields.
//!
//! Constraints run after a value has been deserialized into its field kind.
//! They have no dialect-neutral counterpart, so translating a constrained
//! field into another dialect drops them.

use std::fmt;
use std::sync::Arc;

use schemata_core::Value;

/// Predicate over a deserialized value.
pub type PredicateFn = dyn Fn(&Value) -> bool + Send + Sync;

/// A declared restriction on a field's values.
#[derive(Clone)]
pub enum Constraint {
    /// The value must equal one of the choices.
    OneOf(Vec<Value>),
    /// Numeric bounds, inclusive.
    Range { min: Option<f64>, max: Option<f64> },
    /// Length bounds (characters for text, entries for mappings and lists), inclusive.
    Length { min: Option<usize>, max: Option<usize> },
    /// Named custom check.
    Predicate { name: String, check: Arc<PredicateFn> },
}

impl Constraint {
    pub fn one_of<V: Into<Value>>(choices: impl IntoIterator<Item = V>) -> Self {
        Constraint::OneOf(choices.into_iter().map(Into::into).collect())
    }

    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Constraint::Range { min, max }
    }

    pub fn length(min: Option<usize>, max: Option<usize>) -> Self {
        Constraint::Length { min, max }
    }

    pub fn predicate(
        name: impl Into<String>,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Constraint::Predicate {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Check `value`; the error is the user-facing message.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            Constraint::OneOf(choices) => {
                if choices.contains(value) {
                    Ok(())
                } else {
                    let rendered: Vec<String> = choices.iter().map(Value::to_string).collect();
                    Err(format!("Must be one of: {}.", rendered.join(", ")))
                }
            }
            Constraint::Range { min, max } => {
                let Some(n) = value.as_f64() else {
                    return Err("Must be a number.".to_string());
                };
                if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
                    Err(bounds_message("", *min, *max))
                } else {
                    Ok(())
                }
            }
            Constraint::Length { min, max } => {
                let len = match value {
                    Value::Str(s) => s.chars().count(),
                    Value::Map(entries) => entries.len(),
                    Value::List(items) => items.len(),
                    _ => return Err("Must have a length.".to_string()),
                };
                if min.is_some_and(|m| len < m) || max.is_some_and(|m| len > m) {
                    Err(bounds_message(
                        "Length ",
                        min.map(|m| m as f64),
                        max.map(|m| m as f64),
                    ))
                } else {
                    Ok(())
                }
            }
            Constraint::Predicate { name, check } => {
                if check(value) {
                    Ok(())
                } else {
                    Err(format!("Invalid value ({name})."))
                }
            }
        }
    }
}

fn bounds_message(subject: &str, min: Option<f64>, max: Option<f64>) -> String {
    let prefix = if subject.is_empty() { "Must be" } else { "must be" };
    match (min, max) {
        (Some(lo), Some(hi)) => format!("{subject}{prefix} between {lo} and {hi}."),
        (Some(lo), None) => format!("{subject}{prefix} at least {lo}."),
        (None, Some(hi)) => format!("{subject}{prefix} at most {hi}."),
        (None, None) => format!("{subject}{prefix} unbounded."),
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::OneOf(choices) => f.debug_tuple("OneOf").field(choices).finish(),
            Constraint::Range { min, max } => f
                .debug_struct("Range")
                .field("min", min)
                .field("max", max)
                .finish(),
            Constraint::Length { min, max } => f
                .debug_struct("Length")
                .field("min", min)
                .field("max", max)
                .finish(),
            Constraint::Predicate { name, .. } => {
                f.debug_struct("Predicate").field("name", name).finish()
            }
        }
    }
}
