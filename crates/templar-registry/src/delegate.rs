//! Attribute delegation.
//!
//! Resolution is a pure function of the receiver and the name.
//!
//! On an instantiation:
//! 1. reserved names are refused
//! 2. parameters, through the shape's accessors
//! 3. parent-level members: properties evaluate with the instantiation as
//!    receiver, methods come back bound to it
//!
//! On an instance:
//! 1. the instance's own fields
//! 2. reserved names are refused
//! 3. instance-level members
//! 4. parameters, read through the parent link
//! 5. parent-level members, with the parent instantiation as receiver
//!
//! Instance-level members therefore take precedence over parent-level members
//! of the same name.

use std::fmt;
use std::sync::Arc;

use templar_core::{LookupError, TemplarResult, is_reserved};

use crate::instance::Instance;
use crate::instantiation::{Instantiation, InstantiationRef};
use crate::member::{InstanceMember, InstanceMethodFn, MethodFn, ParentMemberKind};
use crate::value::Value;

/// Result of resolving an attribute.
#[derive(Debug)]
pub enum Resolved<'a> {
    /// A parameter, field, or evaluated property.
    Value(Value),
    /// A method bound to its receiver, awaiting arguments.
    Method(BoundMethod<'a>),
}

impl<'a> Resolved<'a> {
    /// Take the value, failing if the attribute is a method.
    pub fn into_value(self) -> TemplarResult<Value> {
        match self {
            Resolved::Value(value) => Ok(value),
            Resolved::Method(method) => Err(LookupError::NotAValue {
                owner: method.owner(),
                name: method.name.to_string(),
            }
            .into()),
        }
    }

    /// Take the bound method, if the attribute is one.
    pub fn into_method(self) -> Option<BoundMethod<'a>> {
        match self {
            Resolved::Method(method) => Some(method),
            Resolved::Value(_) => None,
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self, Resolved::Method(_))
    }
}

#[derive(Clone, Copy)]
enum Receiver<'a> {
    Parent(&'a InstantiationRef, &'a MethodFn),
    Instance(&'a Instance, &'a InstanceMethodFn),
}

/// A method with its receiver attached.
pub struct BoundMethod<'a> {
    name: &'a str,
    receiver: Receiver<'a>,
}

impl<'a> BoundMethod<'a> {
    pub fn name(&self) -> &str {
        self.name
    }

    /// Check if the receiver is an instantiation rather than an instance.
    pub fn is_parent_level(&self) -> bool {
        matches!(self.receiver, Receiver::Parent(..))
    }

    fn owner(&self) -> String {
        match self.receiver {
            Receiver::Parent(inst, _) => inst.to_string(),
            Receiver::Instance(instance, _) => instance.to_string(),
        }
    }

    /// Invoke with the receiver prepended.
    pub fn call(&self, args: &[Value]) -> TemplarResult<Value> {
        tracing::trace!(member = self.name, args = args.len(), "calling bound method");
        match self.receiver {
            Receiver::Parent(inst, func) => func(inst, args),
            Receiver::Instance(instance, func) => func(instance, args),
        }
    }
}

impl fmt::Debug for BoundMethod<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundMethod")
            .field("name", &self.name)
            .field("receiver", &self.owner())
            .finish()
    }
}

fn resolve_on_instantiation<'a>(inst: &'a InstantiationRef, name: &'a str) -> TemplarResult<Resolved<'a>> {
    if is_reserved(name) {
        return Err(LookupError::ReservedAttribute {
            owner: inst.to_string(),
            name: name.to_string(),
        }
        .into());
    }
    let shape = inst.template().shape();
    if let Some(value) = shape.accessor(name).and_then(|accessor| accessor.read(inst)) {
        return Ok(Resolved::Value(value.clone()));
    }
    if let Some(member) = shape.member(name) {
        tracing::trace!(member = name, instantiation = %inst, "resolved parent-level member");
        return match &member.kind {
            ParentMemberKind::Property(getter) => getter(inst).map(Resolved::Value),
            ParentMemberKind::Method(func) => Ok(Resolved::Method(BoundMethod {
                name,
                receiver: Receiver::Parent(inst, func),
            })),
        };
    }
    Err(LookupError::NoAttribute {
        owner: inst.to_string(),
        name: name.to_string(),
    }
    .into())
}

fn resolve_on_instance<'a>(instance: &'a Instance, name: &'a str) -> TemplarResult<Resolved<'a>> {
    if let Some(value) = instance.field(name) {
        return Ok(Resolved::Value(value.clone()));
    }
    if is_reserved(name) {
        return Err(LookupError::ReservedAttribute {
            owner: instance.to_string(),
            name: name.to_string(),
        }
        .into());
    }
    if let Some(member) = instance.template().instance_member(name) {
        return match member {
            InstanceMember::Property(getter) => getter(instance).map(Resolved::Value),
            InstanceMember::Method(func) => Ok(Resolved::Method(BoundMethod {
                name,
                receiver: Receiver::Instance(instance, func),
            })),
        };
    }
    let parent = instance.parent();
    let shape = parent.template().shape();
    if shape.accessor(name).is_some() || shape.member(name).is_some() {
        return resolve_on_instantiation(parent, name);
    }
    Err(LookupError::NoAttribute {
        owner: instance.to_string(),
        name: name.to_string(),
    }
    .into())
}

fn not_callable(owner: String, name: &str) -> templar_core::TemplarError {
    LookupError::NotCallable {
        owner,
        name: name.to_string(),
    }
    .into()
}

impl Instantiation {
    /// Resolve an attribute on this instantiation.
    pub fn get<'a>(self: &'a Arc<Self>, name: &'a str) -> TemplarResult<Resolved<'a>> {
        resolve_on_instantiation(self, name)
    }

    /// Resolve and invoke a parent-level method.
    pub fn call_method(self: &Arc<Self>, name: &str, args: &[Value]) -> TemplarResult<Value> {
        match self.get(name)?.into_method() {
            Some(method) => method.call(args),
            None => Err(not_callable(self.to_string(), name)),
        }
    }
}

impl Instance {
    /// Resolve an attribute on this instance.
    pub fn get<'a>(&'a self, name: &'a str) -> TemplarResult<Resolved<'a>> {
        resolve_on_instance(self, name)
    }

    /// Resolve and invoke a method, instance-level first.
    pub fn call_method(&self, name: &str, args: &[Value]) -> TemplarResult<Value> {
        match self.get(name)?.into_method() {
            Some(method) => method.call(args),
            None => Err(not_callable(self.to_string(), name)),
        }
    }
}

impl Value {
    /// Resolve an attribute on any value.
    ///
    /// Only instantiations and instances carry attributes.
    pub fn getattr<'a>(&'a self, name: &'a str) -> TemplarResult<Resolved<'a>> {
        match self {
            Value::Instantiation(inst) => inst.get(name),
            Value::Instance(instance) => instance.get(name),
            other => Err(LookupError::NoAttribute {
                owner: other.to_string(),
                name: name.to_string(),
            }
            .into()),
        }
    }
}
