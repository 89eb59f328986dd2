//! Core types for templar.
//!
//! This crate holds the leaf vocabulary shared by the engine and its
//! consumers:
//!
//! - [`TypeHash`]: deterministic identity for templates, members, and instantiations
//! - [`ParamKind`]: declared kind of a parameter / runtime kind of a value
//! - [`Operator`]: parent-level operator overloads
//! - [`MemberFlags`]: dispatch flags for declared members
//! - The error taxonomy rooted at [`TemplarError`]

pub mod error;
pub mod member_flags;
pub mod names;
pub mod operator;
pub mod param_kind;
pub mod type_hash;

pub use error::{
    BindingError, CallError, ConstructionError, LookupError, RegistrationError, SchemaError,
    SerializationError, TemplarError, TemplarResult,
};
pub use member_flags::MemberFlags;
pub use names::{RESERVED_PREFIX, check_param_name, is_reserved};
pub use operator::Operator;
pub use param_kind::ParamKind;
pub use type_hash::{TypeHash, hash_constants};
