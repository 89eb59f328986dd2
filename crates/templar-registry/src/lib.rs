//! The templar parameterization engine.
//!
//! Flow, per template:
//!
//! 1. [`TemplateBuilder::build`] extracts the [`ParamSchema`] from the
//!    ancestry and synthesizes the [`InstantiationShape`]
//! 2. [`TemplateType::instantiate`] binds arguments and returns the canonical
//!    [`Instantiation`] from the [`InstantiationCache`]
//! 3. [`Instantiation::call`] builds an [`Instance`] linked back to it
//! 4. attribute reads go through [`Instance::get`] / [`Instantiation::get`]
//!
//! [`TemplateRegistry`] and the [`serialize`] module cover save/restore.

pub mod args;
pub mod cache;
pub mod construct;
pub mod delegate;
pub mod instance;
pub mod instantiation;
pub mod member;
pub mod registry;
pub mod schema;
pub mod serialize;
pub mod shape;
pub mod template;
pub mod value;

pub use args::Args;
pub use cache::InstantiationCache;
pub use construct::{Parent, parent};
pub use delegate::{BoundMethod, Resolved};
pub use instance::Instance;
pub use instantiation::{Instantiation, InstantiationRef};
pub use member::{
    Initializer, InstanceMember, InstanceMethodFn, InstancePropertyFn, InstanceRenderFn, MethodFn,
    OperatorEntry, OperatorFn, ParentMember, ParentMemberKind, ParentNamespace, ParentRenderFn,
    PropertyFn,
};
pub use registry::TemplateRegistry;
pub use schema::{FieldDecl, FieldRole, ParamSchema, ParamSpec};
pub use serialize::{
    Restorer, SavedInstance, SavedInstantiation, SavedTemplate, SavedValue, save, to_json,
};
pub use shape::{InstantiationShape, ParamAccessor};
pub use template::{TemplateBuilder, TemplateId, TemplateRef, TemplateType};
pub use value::Value;
