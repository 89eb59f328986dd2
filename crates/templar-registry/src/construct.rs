//! Construction flow.
//!
//! Two call layers:
//! - indexing a template reduces it to its canonical instantiation
//! - calling an instantiation builds an instance
//!
//! A template can never produce an instance directly.

use std::sync::Arc;

use templar_core::{ConstructionError, LookupError, ParamKind, TemplarResult};

use crate::args::Args;
use crate::instantiation::InstantiationRef;
use crate::template::TemplateRef;
use crate::value::Value;

impl Value {
    /// `Template[args]`: the canonical instantiation, from the global cache.
    pub fn index(&self, args: impl Into<Args>) -> TemplarResult<Value> {
        match self {
            Value::Template(template) => template.instantiate(args).map(Value::Instantiation),
            other => Err(LookupError::UnsupportedOperator {
                operator: "[]",
                lhs: other.to_string(),
                rhs: String::new(),
            }
            .into()),
        }
    }

    /// `Instantiation(args)`: build an instance.
    ///
    /// # Errors
    ///
    /// - [`ConstructionError::UninstantiatedTemplate`] for a bare template
    /// - [`ConstructionError::NotConstructible`] for any other non-instantiation
    pub fn construct(&self, args: &[Value]) -> TemplarResult<Value> {
        match self {
            Value::Instantiation(inst) => inst.call(args).map(|instance| Value::Instance(Arc::new(instance))),
            Value::Template(template) => Err(ConstructionError::UninstantiatedTemplate {
                template: template.name().to_string(),
            }
            .into()),
            other => Err(ConstructionError::NotConstructible {
                kind: other.type_name(),
            }
            .into()),
        }
    }
}

/// What [`parent`] returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parent {
    /// The owning instantiation of an instance.
    Instantiation(InstantiationRef),
    /// The template an instantiation binds.
    Template(TemplateRef),
    /// The value's own kind, for values outside the template system.
    Kind(ParamKind),
}

/// The owner of a value.
///
/// For an instance, its instantiation. For an instantiation, its template.
/// Anything else falls back to its own kind.
pub fn parent(value: &Value) -> Parent {
    match value {
        Value::Instance(instance) => Parent::Instantiation(Arc::clone(instance.parent())),
        Value::Instantiation(inst) => Parent::Template(Arc::clone(inst.template())),
        other => Parent::Kind(other.kind()),
    }
}
