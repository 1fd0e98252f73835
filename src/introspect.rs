//! Introspection contract for structured model components.
//!
//! A component describes itself as an ordered list of named fields. Each
//! field carries the type name the domain model declares for it and a value
//! that is already discriminated into one of a closed set of shapes, so the
//! projector never has to guess what it is looking at.

use std::fmt;

/// Field name that is promoted into a component's title
pub const ID_FIELD: &str = "id";

/// Declared-type prefix of physical quantities carrying a unit
pub const QUANTITY_TYPE_PREFIX: &str = "Nml2Quantity";

/// A structured object that can enumerate its own fields.
pub trait Introspectable {
    /// Runtime type name, used in section titles
    fn type_name(&self) -> &str;

    /// Fields in declaration order
    fn describe(&self) -> Vec<(String, FieldDescriptor<'_>)>;
}

/// One field of an introspection result
#[derive(Clone)]
pub struct FieldDescriptor<'a> {
    pub declared_type: String,
    pub value: FieldValue<'a>,
}

impl<'a> FieldDescriptor<'a> {
    pub fn new(declared_type: impl Into<String>, value: FieldValue<'a>) -> Self {
        Self {
            declared_type: declared_type.into(),
            value,
        }
    }
}

/// Closed set of value shapes a field can hold
#[derive(Clone)]
pub enum FieldValue<'a> {
    Empty,
    Scalar(Scalar),
    Component(&'a dyn Introspectable),
    ComponentList(Vec<&'a dyn Introspectable>),
}

impl FieldValue<'_> {
    /// Null, empty text, numeric zero and empty lists carry nothing to show
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Scalar(scalar) => scalar.is_zero(),
            FieldValue::Component(_) => false,
            FieldValue::ComponentList(items) => items.is_empty(),
        }
    }
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => write!(f, "Empty"),
            FieldValue::Scalar(s) => write!(f, "Scalar({s:?})"),
            FieldValue::Component(c) => write!(f, "Component({})", c.type_name()),
            FieldValue::ComponentList(items) => write!(f, "ComponentList(len={})", items.len()),
        }
    }
}

impl fmt::Debug for FieldDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("declared_type", &self.declared_type)
            .field("value", &self.value)
            .finish()
    }
}

/// Scalar field value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl Scalar {
    /// Empty text or a numeric zero
    pub fn is_zero(&self) -> bool {
        match self {
            Scalar::Text(s) => s.is_empty(),
            Scalar::Integer(i) => *i == 0,
            Scalar::Float(x) => *x == 0.0,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Integer(i) => write!(f, "{i}"),
            // integral floats keep their ".0" so 2.0 never reads as an integer
            Scalar::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => {
                write!(f, "{x:.1}")
            }
            Scalar::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}
