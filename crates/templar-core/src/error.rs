//! Unified error types for templar.
//!
//! Every error here is a usage error surfaced synchronously to the caller of
//! the failing operation. Nothing is retried internally.
//!
//! ## Error Hierarchy
//!
//! ```text
//! TemplarError (top-level wrapper)
//! ├── SchemaError        - Reserved-prefix parameter declarations
//! ├── BindingError       - Missing/unknown arguments, shadowed parameters
//! ├── ConstructionError  - Instances requested from something that is not an instantiation
//! ├── LookupError        - Attribute resolution failures
//! ├── CallError          - Failures raised by template-supplied members
//! ├── RegistrationError  - Template registry failures
//! └── SerializationError - Save/restore failures
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use templar_core::TemplarResult;
//!
//! fn build(grid: &TemplateRef) -> TemplarResult<Instance> {
//!     let inst = grid.instantiate(Args::positional([3.into()]))?; // BindingError -> TemplarError
//!     let cell = inst.call(&[6.into()])?;                          // CallError -> TemplarError
//!     Ok(cell)
//! }
//! ```

use thiserror::Error;

// ============================================================================
// Schema Errors
// ============================================================================

/// Errors detected while finalizing a template's parameter schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A parameter name starts with the reserved prefix.
    #[error("template '{template}': parameter '{name}' may not begin with '{prefix}'")]
    ReservedName {
        /// The template being declared or instantiated.
        template: String,
        /// The offending parameter name.
        name: String,
        /// The reserved prefix.
        prefix: &'static str,
    },

    /// A parameter or member was declared twice on the same template.
    #[error("template '{template}': '{name}' is declared more than once")]
    DuplicateDeclaration {
        /// The template being declared.
        template: String,
        /// The duplicated name.
        name: String,
    },
}

// ============================================================================
// Binding Errors
// ============================================================================

/// Errors that occur while binding arguments to a parameter schema or
/// writing instance fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// A required parameter has no default and was not supplied.
    #[error("{template}: missing required template parameter '{name}'")]
    MissingParameter {
        /// The template being instantiated.
        template: String,
        /// The unresolved parameter.
        name: String,
    },

    /// More positional arguments than schema entries.
    #[error("{template}: takes {expected} template parameter(s) but {given} were given")]
    TooManyArguments {
        /// The template being instantiated.
        template: String,
        /// Number of schema entries.
        expected: usize,
        /// Number of positional arguments supplied.
        given: usize,
    },

    /// A named argument does not match any schema entry.
    #[error("{template}: unexpected template parameter '{name}'")]
    UnknownParameter {
        /// The template being instantiated.
        template: String,
        /// The unknown name.
        name: String,
    },

    /// A parameter received both a positional and a named value.
    #[error("{template}: template parameter '{name}' given more than once")]
    DuplicateArgument {
        /// The template being instantiated.
        template: String,
        /// The doubly-bound name.
        name: String,
    },

    /// An instance field would shadow a template parameter.
    #[error("{template}: instance field '{name}' shadows a template parameter")]
    ShadowedParameter {
        /// The template owning the schema.
        template: String,
        /// The shadowing field name.
        name: String,
    },
}

// ============================================================================
// Construction Errors
// ============================================================================

/// Errors raised when something other than an instantiation is asked to
/// produce an instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// A template type was invoked directly; it must be instantiated first.
    #[error("template '{template}' cannot be constructed directly; instantiate it with parameters first")]
    UninstantiatedTemplate {
        /// The template that was invoked.
        template: String,
    },

    /// The value has no construction protocol at all.
    #[error("value of kind '{kind}' is not constructible")]
    NotConstructible {
        /// Runtime kind of the value.
        kind: &'static str,
    },
}

// ============================================================================
// Lookup Errors
// ============================================================================

/// Attribute resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The name begins with the reserved prefix and is never proxied.
    #[error("'{owner}' refuses reserved attribute '{name}'")]
    ReservedAttribute {
        /// Rendering of the receiver.
        owner: String,
        /// The requested name.
        name: String,
    },

    /// The name matches no field, parameter, or member.
    #[error("'{owner}' has no attribute '{name}'")]
    NoAttribute {
        /// Rendering of the receiver.
        owner: String,
        /// The requested name.
        name: String,
    },

    /// The operator has no parent-level overload for these operands.
    #[error("unsupported operand for '{operator}': '{lhs}' and '{rhs}'")]
    UnsupportedOperator {
        /// Operator symbol.
        operator: &'static str,
        /// Rendering of the left operand.
        lhs: String,
        /// Rendering of the right operand.
        rhs: String,
    },

    /// A property was called like a method.
    #[error("'{owner}.{name}' is a property, not a method")]
    NotCallable {
        /// Rendering of the receiver.
        owner: String,
        /// The member name.
        name: String,
    },

    /// A method was read where a value was expected.
    #[error("'{owner}.{name}' is a method; call it instead of reading it")]
    NotAValue {
        /// Rendering of the receiver.
        owner: String,
        /// The member name.
        name: String,
    },
}

// ============================================================================
// Call Errors
// ============================================================================

/// Errors raised from inside template-supplied members and initializers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// Wrong number of call arguments.
    #[error("{member}: expected {expected} argument(s), got {given}")]
    ArgumentCount {
        /// The member being invoked.
        member: String,
        /// Expected number of arguments.
        expected: usize,
        /// Number supplied.
        given: usize,
    },

    /// An argument had the wrong runtime kind.
    #[error("{member}: argument {index} must be {expected}, got {found}")]
    ArgumentKind {
        /// The member being invoked.
        member: String,
        /// Zero-based argument position.
        index: usize,
        /// The expected kind.
        expected: &'static str,
        /// The kind that was supplied.
        found: &'static str,
    },

    /// Free-form failure reported by the member itself.
    #[error("{member}: {message}")]
    Failed {
        /// The member being invoked.
        member: String,
        /// Description of the failure.
        message: String,
    },
}

impl CallError {
    /// Create a free-form member failure.
    pub fn failed(member: impl Into<String>, message: impl Into<String>) -> Self {
        CallError::Failed {
            member: member.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Template registry failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A template with this name is already registered.
    #[error("duplicate template: {0}")]
    DuplicateTemplate(String),

    /// No template with this name is registered.
    #[error("template not found: {0}")]
    TemplateNotFound(String),
}

// ============================================================================
// Serialization Errors
// ============================================================================

/// Save/restore failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    /// The encoded form could not be read or written.
    #[error("malformed saved data: {0}")]
    Malformed(String),

    /// A template reference could not be resolved by the restoring registry.
    #[error("saved data references unknown template '{0}'")]
    UnresolvedTemplate(String),
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        SerializationError::Malformed(err.to_string())
    }
}

// ============================================================================
// Top-level Error
// ============================================================================

/// Top-level error wrapping every phase-specific error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplarError {
    /// A schema error.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A binding error.
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// A construction error.
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    /// A lookup error.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// A member call error.
    #[error(transparent)]
    Call(#[from] CallError),

    /// A registration error.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// A serialization error.
    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

impl From<serde_json::Error> for TemplarError {
    fn from(err: serde_json::Error) -> Self {
        TemplarError::Serialization(err.into())
    }
}

impl TemplarError {
    /// Check if this is a schema error.
    pub fn is_schema(&self) -> bool {
        matches!(self, TemplarError::Schema(_))
    }

    /// Check if this is a binding error.
    pub fn is_binding(&self) -> bool {
        matches!(self, TemplarError::Binding(_))
    }

    /// Check if this is a construction error.
    pub fn is_construction(&self) -> bool {
        matches!(self, TemplarError::Construction(_))
    }

    /// Check if this is a lookup error.
    pub fn is_lookup(&self) -> bool {
        matches!(self, TemplarError::Lookup(_))
    }

    /// Check if this is a serialization error.
    pub fn is_serialization(&self) -> bool {
        matches!(self, TemplarError::Serialization(_))
    }
}

/// Result alias used throughout templar.
pub type TemplarResult<T> = Result<T, TemplarError>;
