//! templar: class templates for a dynamic object model.
//!
//! A template declares template parameters (constants bound once per
//! instantiation) next to ordinary instance fields. Indexing a template with
//! concrete arguments yields its canonical instantiation; calling the
//! instantiation yields instances that read parameters through their parent.
//!
//! ```
//! use templar::prelude::*;
//!
//! let a = TemplateBuilder::new("A")
//!     .param_with_default("x", ParamKind::Str, "default")
//!     .field("y")
//!     .build()?;
//!
//! let custom = a.instantiate(Args::positional(["custom"]))?;
//! let obj = custom.call(&[Value::from(5)])?;
//!
//! assert_eq!(obj.get("y")?.into_value()?, Value::from(5));
//! assert_eq!(obj.get("x")?.into_value()?, Value::from("custom"));
//! assert!(std::sync::Arc::ptr_eq(&custom, &a.instantiate(Args::positional(["custom"]))?));
//! # Ok::<(), TemplarError>(())
//! ```

pub use templar_core as core;
pub use templar_registry as registry;

pub use templar_core::{
    BindingError, CallError, ConstructionError, LookupError, MemberFlags, Operator, ParamKind,
    RESERVED_PREFIX, RegistrationError, SchemaError, SerializationError, TemplarError,
    TemplarResult, TypeHash,
};
pub use templar_registry::{
    Args, Instance, Instantiation, InstantiationCache, InstantiationRef, Parent, ParentNamespace,
    Resolved, Restorer, TemplateBuilder, TemplateRef, TemplateRegistry, TemplateType, Value,
    parent, save, to_json,
};

pub mod prelude {
    pub use templar_core::{Operator, ParamKind, TemplarError, TemplarResult};
    pub use templar_registry::{
        Args, Instance, InstantiationCache, InstantiationRef, Parent, ParentNamespace, Restorer,
        TemplateBuilder, TemplateRef, TemplateRegistry, Value, parent,
    };
}
