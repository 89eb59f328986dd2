//! Parameter schema extraction.
//!
//! A template declares an ordered list of [`FieldDecl`]s. Walking the
//! ancestry oldest-first and merging those declarations yields the
//! [`ParamSchema`]: an ordered `name -> (kind, default)` mapping.
//!
//! Merge rules:
//! - Only declarations with [`FieldRole::Parameter`] and a declared kind
//!   contribute. Plain instance fields never enter the schema.
//! - A descendant redeclaring a name overrides its kind and default but keeps
//!   the position where an ancestor first introduced it.
//! - Names starting with the reserved prefix are rejected.

use std::fmt;

use indexmap::IndexMap;
use templar_core::{ParamKind, SchemaError, check_param_name};

use crate::value::Value;

/// Role of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    /// Template parameter, stored once per instantiation.
    Parameter,
    /// Plain per-instance field.
    Instance,
}

/// One field declaration as written by the template author.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    /// Declared kind. `None` means the declaration contributes nothing to the schema.
    pub kind: Option<ParamKind>,
    pub default: Option<Value>,
    pub role: FieldRole,
}

impl FieldDecl {
    /// Declare a template parameter.
    pub fn parameter(name: impl Into<String>, kind: ParamKind, default: Option<Value>) -> Self {
        Self {
            name: name.into(),
            kind: Some(kind),
            default,
            role: FieldRole::Parameter,
        }
    }

    /// Declare a plain instance field.
    pub fn instance(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            default: None,
            role: FieldRole::Instance,
        }
    }

    /// Check if this declaration enters the parameter schema.
    pub fn is_schema_entry(&self) -> bool {
        self.role == FieldRole::Parameter && self.kind.is_some()
    }
}

/// Kind and optional default of one schema entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub kind: ParamKind,
    pub default: Option<Value>,
}

impl ParamSpec {
    /// Check if the parameter must be supplied at instantiation time.
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Ordered parameter schema of a template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
    entries: IndexMap<String, ParamSpec>,
}

impl ParamSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract the schema from an ancestry, oldest declarations first.
    pub fn extract<'a, I>(template: &str, ancestry: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = &'a [FieldDecl]>,
    {
        let mut entries: IndexMap<String, ParamSpec> = IndexMap::new();
        for decls in ancestry {
            for decl in decls.iter().filter(|d| d.is_schema_entry()) {
                check_param_name(template, &decl.name)?;
                let spec = ParamSpec {
                    kind: decl.kind.unwrap_or_default(),
                    default: decl.default.clone(),
                };
                // IndexMap::insert keeps the original slot for existing keys
                entries.insert(decl.name.clone(), spec);
            }
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.entries.get(name)
    }

    /// Position of a parameter in declaration order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.get_index_of(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterate `(name, spec)` in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamSpec)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parameter names in schema order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entry at a schema position.
    pub fn get_index(&self, index: usize) -> Option<(&str, &ParamSpec)> {
        self.entries.get_index(index).map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for ParamSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (name, spec)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, spec.kind)?;
            if let Some(default) = &spec.default {
                write!(f, " = {:?}", default)?;
            }
        }
        write!(f, "]")
    }
}
