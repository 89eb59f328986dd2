//! Template declaration.
//!
//! A [`TemplateType`] is declared once through [`TemplateBuilder`] and is
//! immutable afterwards. Finalization ([`TemplateBuilder::build`]) is the one
//! point where the parameter schema is extracted and the instantiation shape
//! is synthesized.
//!
//! # Example
//!
//! ```ignore
//! let a = TemplateBuilder::new("A")
//!     .param_with_default("x", ParamKind::Str, "default")
//!     .field("y")
//!     .build()?;
//!
//! let inst = a.instantiate(Args::positional(["custom"]))?;
//! let obj = inst.call(&[5.into()])?;
//! assert_eq!(obj.get("x")?.into_value()?, Value::from("custom"));
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use templar_core::{BindingError, ParamKind, SchemaError, TemplarResult, TypeHash};

use crate::args::Args;
use crate::cache::InstantiationCache;
use crate::instance::Instance;
use crate::instantiation::InstantiationRef;
use crate::member::{
    Initializer, InstanceMember, InstanceRenderFn, ParentMemberKind, ParentNamespace,
};
use crate::schema::{FieldDecl, FieldRole, ParamSchema};
use crate::shape::{InstantiationShape, ParentDecls};
use crate::value::Value;

/// Shared handle to a finalized template.
pub type TemplateRef = Arc<TemplateType>;

static NEXT_TEMPLATE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique template identity.
///
/// Two templates declared with the same name are still distinct templates;
/// the canonicalization cache keys on this id, not on the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(u64);

impl TemplateId {
    fn next() -> Self {
        TemplateId(NEXT_TEMPLATE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// A finalized template type.
pub struct TemplateType {
    id: TemplateId,
    name: String,
    type_hash: TypeHash,
    base: Option<TemplateRef>,
    decls: Vec<FieldDecl>,
    schema: ParamSchema,
    shape: InstantiationShape,
    instance_fields: Vec<String>,
    instance_members: IndexMap<String, InstanceMember>,
    initializer: Option<Initializer>,
    instance_render: Option<InstanceRenderFn>,
}

impl TemplateType {
    pub fn id(&self) -> TemplateId {
        self.id
    }

    /// Qualified template name; also the reference used when saving.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    /// Direct base template, if any.
    pub fn base(&self) -> Option<&TemplateRef> {
        self.base.as_ref()
    }

    /// This template's own declarations, excluding ancestors.
    pub fn declarations(&self) -> &[FieldDecl] {
        &self.decls
    }

    /// Merged parameter schema.
    pub fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    /// Synthesized instantiation shape.
    pub fn shape(&self) -> &InstantiationShape {
        &self.shape
    }

    /// Declared instance fields, ancestors first.
    pub fn instance_fields(&self) -> &[String] {
        &self.instance_fields
    }

    pub(crate) fn instance_member(&self, name: &str) -> Option<&InstanceMember> {
        self.instance_members.get(name)
    }

    pub(crate) fn initializer(&self) -> Option<&Initializer> {
        self.initializer.as_ref()
    }

    pub(crate) fn instance_render(&self) -> Option<&InstanceRenderFn> {
        self.instance_render.as_ref()
    }

    /// Ancestors and self, oldest first.
    pub fn ancestry(&self) -> Vec<&TemplateType> {
        let mut chain = vec![self];
        let mut current = self.base.as_deref();
        while let Some(t) = current {
            chain.push(t);
            current = t.base.as_deref();
        }
        chain.reverse();
        chain
    }

    /// Check if `self` is `other` or derives from it.
    pub fn is_subtemplate_of(&self, other: &TemplateType) -> bool {
        self.ancestry().iter().any(|t| t.id == other.id)
    }

    /// Reduce the template to its canonical instantiation for `args`, using
    /// the process-wide cache. This is `Template[args]`.
    pub fn instantiate(self: &Arc<Self>, args: impl Into<Args>) -> TemplarResult<InstantiationRef> {
        InstantiationCache::global().instantiate(self, args.into())
    }

    /// Like [`TemplateType::instantiate`], against an explicit cache.
    pub fn instantiate_in(
        self: &Arc<Self>,
        cache: &InstantiationCache,
        args: impl Into<Args>,
    ) -> TemplarResult<InstantiationRef> {
        cache.instantiate(self, args.into())
    }
}

impl PartialEq for TemplateType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TemplateType {}

impl Hash for TemplateType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateType")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("base", &self.base.as_ref().map(|b| b.name()))
            .field("schema", &self.schema)
            .field("shape", &self.shape)
            .field("instance_fields", &self.instance_fields)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Builder for declaring a template type.
///
/// Collects parameter and field declarations, parent-level members, an
/// optional custom instantiation namespace, and instance-level behavior.
/// Nothing is validated until [`TemplateBuilder::build`].
pub struct TemplateBuilder {
    name: String,
    base: Option<TemplateRef>,
    decls: Vec<FieldDecl>,
    parent: ParentDecls,
    instance_members: Vec<(String, InstanceMember)>,
    initializer: Option<Initializer>,
    instance_render: Option<InstanceRenderFn>,
}

impl TemplateBuilder {
    /// Start declaring a template.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            decls: Vec::new(),
            parent: ParentDecls::default(),
            instance_members: Vec::new(),
            initializer: None,
            instance_render: None,
        }
    }

    /// Derive from a base template. Parameters, fields, and members are inherited.
    pub fn extends(mut self, base: &TemplateRef) -> Self {
        self.base = Some(Arc::clone(base));
        self
    }

    /// Declare a required template parameter.
    pub fn param(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.decls.push(FieldDecl::parameter(name, kind, None));
        self
    }

    /// Declare a template parameter with a default.
    pub fn param_with_default(
        mut self,
        name: impl Into<String>,
        kind: ParamKind,
        default: impl Into<Value>,
    ) -> Self {
        self.decls
            .push(FieldDecl::parameter(name, kind, Some(default.into())));
        self
    }

    /// Declare a plain instance field.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.decls.push(FieldDecl::instance(name));
        self
    }

    /// Declare a parent-level property.
    pub fn parent_property<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&InstantiationRef) -> TemplarResult<Value> + Send + Sync + 'static,
    {
        self.parent
            .members
            .push((name.into(), ParentMemberKind::Property(Arc::new(f))));
        self
    }

    /// Declare a parent-level method.
    pub fn parent_method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&InstantiationRef, &[Value]) -> TemplarResult<Value> + Send + Sync + 'static,
    {
        self.parent
            .members
            .push((name.into(), ParentMemberKind::Method(Arc::new(f))));
        self
    }

    /// Declare a parent-level operator overload.
    pub fn parent_operator<F>(mut self, operator: templar_core::Operator, f: F) -> Self
    where
        F: Fn(&InstantiationRef, Option<&Value>) -> TemplarResult<Option<Value>> + Send + Sync + 'static,
    {
        self.parent.operators.push((operator, Arc::new(f)));
        self
    }

    /// Supply a custom instantiation namespace in place of the generic default.
    pub fn namespace(mut self, namespace: ParentNamespace) -> Self {
        self.parent.namespace = Some(namespace);
        self
    }

    /// Declare an instance-level property.
    pub fn property<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Instance) -> TemplarResult<Value> + Send + Sync + 'static,
    {
        self.instance_members
            .push((name.into(), InstanceMember::Property(Arc::new(f))));
        self
    }

    /// Declare an instance-level method.
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> TemplarResult<Value> + Send + Sync + 'static,
    {
        self.instance_members
            .push((name.into(), InstanceMember::Method(Arc::new(f))));
        self
    }

    /// Set the instance initializer.
    ///
    /// Without one, call arguments are assigned positionally to the declared
    /// instance fields.
    pub fn init<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Instance, &[Value]) -> TemplarResult<()> + Send + Sync + 'static,
    {
        self.initializer = Some(Arc::new(f));
        self
    }

    /// Set the instance renderer.
    pub fn render<F>(mut self, f: F) -> Self
    where
        F: Fn(&Instance) -> String + Send + Sync + 'static,
    {
        self.instance_render = Some(Arc::new(f));
        self
    }

    /// Finalize the template.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::ReservedName`] if a parameter uses the reserved prefix
    /// - [`SchemaError::DuplicateDeclaration`] if a name is declared twice on this level
    /// - [`BindingError::ShadowedParameter`] if an instance field or
    ///   instance member reuses a parameter name
    pub fn build(self) -> TemplarResult<TemplateRef> {
        let type_hash = TypeHash::from_name(&self.name);

        let mut seen = FxHashSet::default();
        for decl in &self.decls {
            if !seen.insert(decl.name.as_str()) {
                return Err(SchemaError::DuplicateDeclaration {
                    template: self.name.clone(),
                    name: decl.name.clone(),
                }
                .into());
            }
        }

        let ancestry: Vec<&TemplateType> = match &self.base {
            Some(base) => base.ancestry(),
            None => Vec::new(),
        };
        let schema = ParamSchema::extract(
            &self.name,
            ancestry
                .iter()
                .map(|t| t.decls.as_slice())
                .chain(std::iter::once(self.decls.as_slice())),
        )?;

        let mut instance_fields: Vec<String> = self
            .base
            .as_ref()
            .map(|b| b.instance_fields.clone())
            .unwrap_or_default();
        for decl in self.decls.iter().filter(|d| d.role == FieldRole::Instance) {
            if !instance_fields.contains(&decl.name) {
                instance_fields.push(decl.name.clone());
            }
        }
        let mut instance_members = self
            .base
            .as_ref()
            .map(|b| b.instance_members.clone())
            .unwrap_or_default();
        for (name, member) in self.instance_members {
            instance_members.insert(name, member);
        }

        let shadowing = instance_fields
            .iter()
            .chain(instance_members.keys())
            .find(|name| schema.contains(name));
        if let Some(name) = shadowing {
            return Err(BindingError::ShadowedParameter {
                template: self.name.clone(),
                name: name.clone(),
            }
            .into());
        }

        let shape = InstantiationShape::synthesize(
            type_hash,
            &schema,
            self.base.as_ref().map(|b| &b.shape),
            &self.parent,
        );

        let initializer = self
            .initializer
            .or_else(|| self.base.as_ref().and_then(|b| b.initializer.clone()));
        let instance_render = self
            .instance_render
            .or_else(|| self.base.as_ref().and_then(|b| b.instance_render.clone()));

        let template = TemplateType {
            id: TemplateId::next(),
            name: self.name,
            type_hash,
            base: self.base,
            decls: self.decls,
            schema,
            shape,
            instance_fields,
            instance_members,
            initializer,
            instance_render,
        };
        tracing::debug!(
            template = %template.name,
            id = template.id.as_u64(),
            schema = %template.schema,
            namespace = ?template.shape.namespace(),
            "finalized template"
        );
        Ok(Arc::new(template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use templar_core::TemplarError;

    #[test]
    fn build_simple_template() {
        let a = TemplateBuilder::new("A")
            .param_with_default("x", ParamKind::Str, "default")
            .field("y")
            .build()
            .unwrap();

        assert_eq!(a.name(), "A");
        assert_eq!(a.type_hash(), TypeHash::from_name("A"));
        assert_eq!(a.schema().len(), 1);
        assert_eq!(a.instance_fields(), &["y".to_string()]);
        assert!(a.base().is_none());
    }

    #[test]
    fn same_name_templates_are_distinct() {
        let a1 = TemplateBuilder::new("A").build().unwrap();
        let a2 = TemplateBuilder::new("A").build().unwrap();
        assert_ne!(a1.id(), a2.id());
        assert_ne!(*a1, *a2);
        assert_eq!(a1.type_hash(), a2.type_hash());
    }

    #[test]
    fn reserved_parameter_fails_at_finalization() {
        let err = TemplateBuilder::new("A")
            .param("_secret", ParamKind::Int)
            .build()
            .unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn duplicate_declaration() {
        let err = TemplateBuilder::new("A")
            .param("x", ParamKind::Int)
            .field("x")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            TemplarError::Schema(SchemaError::DuplicateDeclaration { .. })
        ));
    }

    #[test]
    fn instance_field_shadowing_inherited_parameter() {
        let base = TemplateBuilder::new("Base")
            .param("x", ParamKind::Int)
            .build()
            .unwrap();
        let err = TemplateBuilder::new("Derived")
            .extends(&base)
            .field("x")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            TemplarError::Binding(BindingError::ShadowedParameter { ref name, .. }) if name == "x"
        ));
    }

    #[test]
    fn instance_member_shadowing_parameter() {
        let err = TemplateBuilder::new("A")
            .param("x", ParamKind::Int)
            .property("x", |_| Ok(Value::None))
            .build()
            .unwrap_err();
        assert!(err.is_binding());
    }

    #[test]
    fn ancestry_is_oldest_first() {
        let root = TemplateBuilder::new("Root").param("a", ParamKind::Int).build().unwrap();
        let mid = TemplateBuilder::new("Mid").extends(&root).param("b", ParamKind::Int).build().unwrap();
        let leaf = TemplateBuilder::new("Leaf")
            .extends(&mid)
            .param_with_default("a", ParamKind::Int, 7)
            .field("c")
            .build()
            .unwrap();

        let names: Vec<&str> = leaf.ancestry().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Root", "Mid", "Leaf"]);
        assert_eq!(leaf.schema().names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(leaf.schema().get("a").unwrap().default, Some(Value::from(7)));
        assert!(leaf.is_subtemplate_of(&root));
        assert!(!root.is_subtemplate_of(&leaf));
    }

    #[test]
    fn initializer_is_inherited() {
        let base = TemplateBuilder::new("Base")
            .field("y")
            .init(|inst, _| inst.set("y", 1))
            .build()
            .unwrap();
        let derived = TemplateBuilder::new("Derived").extends(&base).build().unwrap();
        assert!(derived.initializer().is_some());
        assert_eq!(derived.instance_fields(), &["y".to_string()]);
    }
}
