//! # Native Types — Logical Value Types and Constructor-Style Coercion
//!
//! A [`NativeType`] describes the logical type of a schema element: a
//! primitive, a key/value-parameterized mapping, or the opaque `Any`.
//! Validation never looks at type parameters; it resolves the unparameterized
//! [`BaseType`] and coerces the raw value into it, the way calling the type's
//! constructor would.
//!
//! ## Coercion table
//!
//! | Base | Accepts |
//! |------|---------|
//! | `int` | ints, integral floats, bools, decimal strings |
//! | `float` | floats, ints, bools, numeric strings |
//! | `str` | strings, any scalar (rendered) |
//! | `bool` | bools, `0`/`1`, `true`/`false`/`yes`/`no` strings |
//! | `date` | dates, `YYYY-MM-DD` strings |
//! | `datetime` | datetimes, dates (midnight), ISO-8601 / RFC 3339 strings |
//! | `time` | times, `HH:MM[:SS[.f]]` strings |
//! | `timedelta` | durations, numbers and numeric strings (seconds) |
//! | `mapping` | mappings, lists of two-element lists |
//! | `Any` | everything, unchanged |

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::CoercionError;
use crate::value::Value;

/// Unparameterized base of a [`NativeType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Any,
    Bool,
    Int,
    Float,
    Str,
    Date,
    DateTime,
    Time,
    Duration,
    Mapping,
}

impl BaseType {
    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            BaseType::Any => "Any",
            BaseType::Bool => "bool",
            BaseType::Int => "int",
            BaseType::Float => "float",
            BaseType::Str => "str",
            BaseType::Date => "date",
            BaseType::DateTime => "datetime",
            BaseType::Time => "time",
            BaseType::Duration => "timedelta",
            BaseType::Mapping => "Mapping",
        }
    }

    /// Coerce `value` into this base type.
    ///
    /// `Null` is never coerced; callers resolve emptiness (defaults,
    /// required-ness) before reaching this step.
    pub fn coerce(&self, value: &Value) -> Result<Value, CoercionError> {
        match self {
            BaseType::Any => Ok(value.clone()),
            BaseType::Bool => coerce_bool(value),
            BaseType::Int => coerce_int(value),
            BaseType::Float => coerce_float(value),
            BaseType::Str => coerce_str(value),
            BaseType::Date => coerce_date(value),
            BaseType::DateTime => coerce_datetime(value),
            BaseType::Time => coerce_time(value),
            BaseType::Duration => coerce_duration(value),
            BaseType::Mapping => coerce_mapping(value),
        }
    }

    fn incompatible(&self, value: &Value) -> CoercionError {
        CoercionError::Incompatible {
            expected: self.type_name(),
            found: value.kind_name(),
        }
    }

    fn invalid_literal(&self, input: &str, reason: impl fmt::Display) -> CoercionError {
        CoercionError::InvalidLiteral {
            expected: self.type_name(),
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Logical value type of a schema element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeType {
    Any,
    Bool,
    Int,
    Float,
    Str,
    Date,
    DateTime,
    Time,
    Duration,
    /// Keyed container parameterized by key and value types.
    Mapping {
        key: Box<NativeType>,
        value: Box<NativeType>,
    },
}

impl NativeType {
    /// `Mapping[key, value]`.
    pub fn mapping(key: NativeType, value: NativeType) -> Self {
        NativeType::Mapping {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// The unparameterized base type.
    pub fn base(&self) -> BaseType {
        match self {
            NativeType::Any => BaseType::Any,
            NativeType::Bool => BaseType::Bool,
            NativeType::Int => BaseType::Int,
            NativeType::Float => BaseType::Float,
            NativeType::Str => BaseType::Str,
            NativeType::Date => BaseType::Date,
            NativeType::DateTime => BaseType::DateTime,
            NativeType::Time => BaseType::Time,
            NativeType::Duration => BaseType::Duration,
            NativeType::Mapping { .. } => BaseType::Mapping,
        }
    }

    /// The type with no parameters for `base` (`Mapping[Any, Any]` for mappings).
    pub fn from_base(base: BaseType) -> Self {
        match base {
            BaseType::Any => NativeType::Any,
            BaseType::Bool => NativeType::Bool,
            BaseType::Int => NativeType::Int,
            BaseType::Float => NativeType::Float,
            BaseType::Str => NativeType::Str,
            BaseType::Date => NativeType::Date,
            BaseType::DateTime => NativeType::DateTime,
            BaseType::Time => NativeType::Time,
            BaseType::Duration => NativeType::Duration,
            BaseType::Mapping => NativeType::mapping(NativeType::Any, NativeType::Any),
        }
    }

    /// Coerce `value` via the base type; parameters are not applied.
    pub fn coerce(&self, value: &Value) -> Result<Value, CoercionError> {
        self.base().coerce(value)
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeType::Mapping { key, value } => write!(f, "Mapping[{key}, {value}]"),
            other => f.write_str(other.base().type_name()),
        }
    }
}

// ─── Coercions ───────────────────────────────────────────────────────

fn coerce_bool(value: &Value) -> Result<Value, CoercionError> {
    let ty = BaseType::Bool;
    match value {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Int(0) => Ok(Value::Bool(false)),
        Value::Int(1) => Ok(Value::Bool(true)),
        Value::Int(n) => Err(CoercionError::OutOfRange {
            expected: ty.type_name(),
            value: n.to_string(),
        }),
        Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(ty.invalid_literal(s, "expected true/false")),
        },
        other => Err(ty.incompatible(other)),
    }
}

fn coerce_int(value: &Value) -> Result<Value, CoercionError> {
    let ty = BaseType::Int;
    match value {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(x) => float_to_int(*x),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| ty.invalid_literal(s, e)),
        other => Err(ty.incompatible(other)),
    }
}

fn float_to_int(x: f64) -> Result<Value, CoercionError> {
    if !x.is_finite() || x.fract() != 0.0 || x < i64::MIN as f64 || x >= i64::MAX as f64 {
        return Err(CoercionError::OutOfRange {
            expected: BaseType::Int.type_name(),
            value: format!("{x:?}"),
        });
    }
    Ok(Value::Int(x as i64))
}

fn coerce_float(value: &Value) -> Result<Value, CoercionError> {
    let ty = BaseType::Float;
    match value {
        Value::Float(x) => Ok(Value::Float(*x)),
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| ty.invalid_literal(s, e)),
        other => Err(ty.incompatible(other)),
    }
}

fn coerce_str(value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::Str(s) => Ok(Value::Str(s.clone())),
        Value::Null | Value::Map(_) | Value::List(_) => Err(BaseType::Str.incompatible(value)),
        scalar => Ok(Value::Str(scalar.to_string())),
    }
}

fn coerce_date(value: &Value) -> Result<Value, CoercionError> {
    let ty = BaseType::Date;
    match value {
        Value::Date(d) => Ok(Value::Date(*d)),
        Value::Str(s) => parse_date(s.trim())
            .map(Value::Date)
            .map_err(|e| ty.invalid_literal(s, e)),
        other => Err(ty.incompatible(other)),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
}

fn coerce_datetime(value: &Value) -> Result<Value, CoercionError> {
    let ty = BaseType::DateTime;
    match value {
        Value::DateTime(dt) => Ok(Value::DateTime(*dt)),
        Value::Date(d) => Ok(Value::DateTime(d.and_time(NaiveTime::MIN))),
        Value::Str(s) => parse_datetime(s.trim())
            .map(Value::DateTime)
            .map_err(|e| ty.invalid_literal(s, e)),
        other => Err(ty.incompatible(other)),
    }
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| chrono::DateTime::parse_from_rfc3339(s).map(|dt| dt.naive_utc()))
        .or_else(|err| parse_date(s).map(|d| d.and_time(NaiveTime::MIN)).map_err(|_| err))
}

fn coerce_time(value: &Value) -> Result<Value, CoercionError> {
    let ty = BaseType::Time;
    match value {
        Value::Time(t) => Ok(Value::Time(*t)),
        Value::DateTime(dt) => Ok(Value::Time(dt.time())),
        Value::Str(s) => {
            let trimmed = s.trim();
            NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f")
                .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
                .map(Value::Time)
                .map_err(|e| ty.invalid_literal(s, e))
        }
        other => Err(ty.incompatible(other)),
    }
}

fn coerce_duration(value: &Value) -> Result<Value, CoercionError> {
    let ty = BaseType::Duration;
    match value {
        Value::Duration(d) => Ok(Value::Duration(*d)),
        Value::Int(n) => chrono::Duration::try_seconds(*n)
            .map(Value::Duration)
            .ok_or_else(|| CoercionError::OutOfRange {
                expected: ty.type_name(),
                value: n.to_string(),
            }),
        Value::Float(x) => seconds_to_duration(*x),
        Value::Str(s) => {
            let secs = s
                .trim()
                .parse::<f64>()
                .map_err(|e| ty.invalid_literal(s, e))?;
            seconds_to_duration(secs)
        }
        other => Err(ty.incompatible(other)),
    }
}

fn seconds_to_duration(secs: f64) -> Result<Value, CoercionError> {
    let micros = secs * 1_000_000.0;
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return Err(CoercionError::OutOfRange {
            expected: BaseType::Duration.type_name(),
            value: format!("{secs:?}"),
        });
    }
    Ok(Value::Duration(chrono::Duration::microseconds(
        micros.round() as i64
    )))
}

fn coerce_mapping(value: &Value) -> Result<Value, CoercionError> {
    let ty = BaseType::Mapping;
    match value {
        Value::Map(entries) => Ok(Value::Map(entries.clone())),
        Value::List(items) => items
            .iter()
            .map(|item| match item {
                Value::List(pair) if pair.len() == 2 => Ok((pair[0].clone(), pair[1].clone())),
                other => Err(ty.incompatible(other)),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Map),
        other => Err(ty.incompatible(other)),
    }
}
