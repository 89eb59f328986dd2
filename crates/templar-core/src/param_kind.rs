//! Declared kinds for template parameters and runtime kinds for values.
//!
//! A kind is descriptive only: binding never checks or coerces an argument
//! against the declared kind of its parameter.

use std::fmt;

/// Kind of a template parameter or of a runtime value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamKind {
    /// Accepts anything; the default when a declaration names no kind.
    #[default]
    Any,
    None,
    Bool,
    Int,
    Float,
    Str,
    List,
    /// A template type reference.
    Template,
    /// A bound instantiation.
    Instantiation,
    /// An instance produced by an instantiation.
    Instance,
}

impl ParamKind {
    /// Get the display name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            ParamKind::Any => "any",
            ParamKind::None => "none",
            ParamKind::Bool => "bool",
            ParamKind::Int => "int",
            ParamKind::Float => "float",
            ParamKind::Str => "str",
            ParamKind::List => "list",
            ParamKind::Template => "template",
            ParamKind::Instantiation => "instantiation",
            ParamKind::Instance => "instance",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
