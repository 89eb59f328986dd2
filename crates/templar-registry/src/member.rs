//! Member declarations attached to a template.
//!
//! Parent-level members run with the instantiation as receiver. Instance-level
//! members run with an instance as receiver. Both are stored as type-erased,
//! `Arc`-shared callables so a finalized template can be shared freely.

use std::fmt;
use std::sync::Arc;

use templar_core::{MemberFlags, Operator, TemplarResult, TypeHash};

use crate::instance::Instance;
use crate::instantiation::{Instantiation, InstantiationRef};
use crate::value::Value;

/// Parent-level property getter.
pub type PropertyFn = Arc<dyn Fn(&InstantiationRef) -> TemplarResult<Value> + Send + Sync>;

/// Parent-level method; the instantiation is prepended as receiver.
pub type MethodFn = Arc<dyn Fn(&InstantiationRef, &[Value]) -> TemplarResult<Value> + Send + Sync>;

/// Parent-level operator overload.
///
/// The second operand is `None` for unary operators. Returning `Ok(None)`
/// declines the operands, letting a reflected overload on the right operand
/// run instead.
pub type OperatorFn =
    Arc<dyn Fn(&InstantiationRef, Option<&Value>) -> TemplarResult<Option<Value>> + Send + Sync>;

/// Custom rendering for instantiations.
pub type ParentRenderFn = Arc<dyn Fn(&Instantiation) -> String + Send + Sync>;

/// Instance-level property getter.
pub type InstancePropertyFn = Arc<dyn Fn(&Instance) -> TemplarResult<Value> + Send + Sync>;

/// Instance-level method.
pub type InstanceMethodFn = Arc<dyn Fn(&Instance, &[Value]) -> TemplarResult<Value> + Send + Sync>;

/// Custom rendering for instances.
pub type InstanceRenderFn = Arc<dyn Fn(&Instance) -> String + Send + Sync>;

/// Instance initializer. Receives a bare instance already linked to its
/// instantiation, plus exactly the arguments passed to the instantiation call.
pub type Initializer = Arc<dyn Fn(&mut Instance, &[Value]) -> TemplarResult<()> + Send + Sync>;

/// How a parent-level member is dispatched.
#[derive(Clone)]
pub enum ParentMemberKind {
    /// Evaluated on read.
    Property(PropertyFn),
    /// Bound on read, invoked later with further arguments.
    Method(MethodFn),
}

/// A parent-level member as stored in an instantiation shape.
#[derive(Clone)]
pub struct ParentMember {
    pub name: String,
    pub hash: TypeHash,
    pub flags: MemberFlags,
    pub kind: ParentMemberKind,
}

impl ParentMember {
    pub(crate) fn new(owner: TypeHash, name: String, flags: MemberFlags, kind: ParentMemberKind) -> Self {
        let dispatch = match &kind {
            ParentMemberKind::Property(_) => MemberFlags::PROPERTY,
            ParentMemberKind::Method(_) => MemberFlags::METHOD,
        };
        Self {
            hash: TypeHash::from_member(owner, &name),
            name,
            flags: flags | dispatch | MemberFlags::PARENT,
            kind,
        }
    }
}

impl fmt::Debug for ParentMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentMember")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// A parent-level operator overload.
#[derive(Clone)]
pub struct OperatorEntry {
    pub operator: Operator,
    pub hash: TypeHash,
    pub flags: MemberFlags,
    pub func: OperatorFn,
}

impl OperatorEntry {
    pub(crate) fn new(owner: TypeHash, operator: Operator, flags: MemberFlags, func: OperatorFn) -> Self {
        Self {
            operator,
            hash: TypeHash::from_operator(owner, operator.method_name()),
            flags: flags | MemberFlags::PARENT | MemberFlags::OPERATOR,
            func,
        }
    }
}

impl fmt::Debug for OperatorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorEntry")
            .field("operator", &self.operator)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// An instance-level member.
#[derive(Clone)]
pub enum InstanceMember {
    Property(InstancePropertyFn),
    Method(InstanceMethodFn),
}

impl fmt::Debug for InstanceMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceMember::Property(_) => write!(f, "InstanceMember::Property"),
            InstanceMember::Method(_) => write!(f, "InstanceMember::Method"),
        }
    }
}

/// A custom instantiation namespace.
///
/// Groups parent-level members, operators, and a renderer under one name. When
/// a template attaches a namespace it replaces the generic instantiation
/// behavior: its renderer is used instead of `Name(x=value, ...)`, and its
/// members and operators become reachable on every instantiation (and, for
/// members, on every instance) of the template.
///
/// # Example
///
/// ```ignore
/// let ns = ParentNamespace::new("CustomBParent")
///     .property("z", |p| Ok(format!("{}_but_good", p.param("x").unwrap()).into()))
///     .operator(Operator::Add, concat_x);
/// ```
#[derive(Clone, Default)]
pub struct ParentNamespace {
    pub(crate) name: String,
    pub(crate) members: Vec<(String, ParentMemberKind)>,
    pub(crate) operators: Vec<(Operator, OperatorFn)>,
    pub(crate) render: Option<ParentRenderFn>,
}

impl ParentNamespace {
    /// Create an empty namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Name of the namespace.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a property evaluated with the instantiation as receiver.
    pub fn property<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&InstantiationRef) -> TemplarResult<Value> + Send + Sync + 'static,
    {
        self.members
            .push((name.into(), ParentMemberKind::Property(Arc::new(f))));
        self
    }

    /// Add a method bound to the instantiation on read.
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&InstantiationRef, &[Value]) -> TemplarResult<Value> + Send + Sync + 'static,
    {
        self.members
            .push((name.into(), ParentMemberKind::Method(Arc::new(f))));
        self
    }

    /// Add an operator overload.
    pub fn operator<F>(mut self, operator: Operator, f: F) -> Self
    where
        F: Fn(&InstantiationRef, Option<&Value>) -> TemplarResult<Option<Value>> + Send + Sync + 'static,
    {
        self.operators.push((operator, Arc::new(f)));
        self
    }

    /// Replace the default instantiation rendering.
    pub fn render<F>(mut self, f: F) -> Self
    where
        F: Fn(&Instantiation) -> String + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for ParentNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentNamespace")
            .field("name", &self.name)
            .field("members", &self.members.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("operators", &self.operators.iter().map(|(o, _)| o).collect::<Vec<_>>())
            .field("render", &self.render.is_some())
            .finish()
    }
}
