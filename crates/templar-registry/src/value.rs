//! Dynamic value model.
//!
//! [`Value`] is the single runtime representation for template arguments,
//! instance fields, and member results. Unlike a VM slot it is always
//! cloneable and hashable: floats go through [`OrderedFloat`], templates
//! compare by identity, instantiations and instances compare structurally.

use std::fmt;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use templar_core::{ParamKind, TypeHash, hash_constants};

use crate::instance::Instance;
use crate::instantiation::InstantiationRef;
use crate::template::TemplateRef;

/// A dynamically typed value.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub enum Value {
    /// Absent value
    #[default]
    None,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value (hashable)
    Float(OrderedFloat<f64>),
    /// String value (owned)
    Str(String),
    /// Ordered sequence
    List(Vec<Value>),
    /// Reference to a template type
    Template(TemplateRef),
    /// Canonical instantiation
    Instantiation(InstantiationRef),
    /// Instance produced by an instantiation
    Instance(Arc<Instance>),
}

impl Value {
    /// Get the runtime kind of this value.
    pub fn kind(&self) -> ParamKind {
        match self {
            Value::None => ParamKind::None,
            Value::Bool(_) => ParamKind::Bool,
            Value::Int(_) => ParamKind::Int,
            Value::Float(_) => ParamKind::Float,
            Value::Str(_) => ParamKind::Str,
            Value::List(_) => ParamKind::List,
            Value::Template(_) => ParamKind::Template,
            Value::Instantiation(_) => ParamKind::Instantiation,
            Value::Instance(_) => ParamKind::Instance,
        }
    }

    /// Get a human-readable name for this value's kind.
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Check if this value is `None`.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get a float, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(f.0),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_template(&self) -> Option<&TemplateRef> {
        match self {
            Value::Template(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_instantiation(&self) -> Option<&InstantiationRef> {
        match self {
            Value::Instantiation(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(i) => Some(i),
            _ => None,
        }
    }

    /// Deterministic content hash.
    ///
    /// Equal values always produce equal hashes; this feeds instantiation
    /// identity through [`TypeHash::from_template_instance`].
    pub fn content_hash(&self) -> TypeHash {
        match self {
            Value::None => TypeHash::from_bytes(&[0]),
            Value::Bool(b) => TypeHash::from_bytes(&[1, *b as u8]),
            Value::Int(n) => tagged_bytes(2, &n.to_le_bytes()),
            Value::Float(f) => tagged_bytes(3, &canonical_float_bits(f.0).to_le_bytes()),
            Value::Str(s) => tagged_bytes(4, s.as_bytes()),
            Value::List(items) => {
                let parts: Vec<TypeHash> = items.iter().map(Value::content_hash).collect();
                TypeHash::chain(hash_constants::VALUE ^ 5, &parts)
            }
            Value::Template(t) => t.type_hash(),
            Value::Instantiation(i) => i.type_hash(),
            Value::Instance(i) => i.content_hash(),
        }
    }
}

fn tagged_bytes(tag: u8, bytes: &[u8]) -> TypeHash {
    let mut buf = Vec::with_capacity(bytes.len() + 1);
    buf.push(tag);
    buf.extend_from_slice(bytes);
    TypeHash::from_bytes(&buf)
}

// OrderedFloat treats every NaN as equal and 0.0 == -0.0
fn canonical_float_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0
    } else {
        f.to_bits()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(v) => write!(f, "Bool({})", v),
            Value::Int(v) => write!(f, "Int({})", v),
            Value::Float(v) => write!(f, "Float({})", v.0),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Template(t) => write!(f, "Template({})", t.name()),
            Value::Instantiation(i) => write!(f, "Instantiation({})", i),
            Value::Instance(i) => write!(f, "Instance({})", i),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:?}", v.0),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Template(t) => write!(f, "{}", t.name()),
            Value::Instantiation(i) => write!(f, "{}", i),
            Value::Instance(i) => write!(f, "{}", i),
        }
    }
}

// === Conversions ===

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(OrderedFloat(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<TemplateRef> for Value {
    fn from(v: TemplateRef) -> Self {
        Value::Template(v)
    }
}

impl From<InstantiationRef> for Value {
    fn from(v: InstantiationRef) -> Self {
        Value::Instantiation(v)
    }
}

impl From<Instance> for Value {
    fn from(v: Instance) -> Self {
        Value::Instance(Arc::new(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::None, Into::into)
    }
}
