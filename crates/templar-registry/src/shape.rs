//! Instantiation synthesis.
//!
//! Every template gets one [`InstantiationShape`], built once when the
//! template is finalized. Instead of generating a fresh type per template,
//! the shape is a table attached to the single generic [`Instantiation`]
//! representation:
//!
//! - one [`ParamAccessor`] per schema entry
//! - the parent-level members and operators, merged across the ancestry
//! - the renderer: a custom namespace's renderer if one was supplied,
//!   otherwise the generic `Name(x=value, ...)` rendering
//!
//! [`Instantiation`]: crate::Instantiation

use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use templar_core::{MemberFlags, Operator, TypeHash};

use crate::instance::Instance;
use crate::instantiation::Instantiation;
use crate::member::{OperatorEntry, OperatorFn, ParentMember, ParentMemberKind, ParentNamespace, ParentRenderFn};
use crate::schema::ParamSchema;
use crate::value::Value;

/// Generated accessor for one template parameter.
///
/// Reads go to the instantiation's parameter tuple. Reading through an
/// instance follows its back-reference, so instances never hold a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamAccessor {
    index: usize,
}

impl ParamAccessor {
    /// Position of the parameter in the schema.
    pub fn index(self) -> usize {
        self.index
    }

    /// Read the parameter from an instantiation.
    pub fn read(self, inst: &Instantiation) -> Option<&Value> {
        inst.values().get(self.index)
    }

    /// Read the parameter through an instance's back-reference.
    pub fn read_through(self, instance: &Instance) -> Option<&Value> {
        self.read(instance.parent())
    }
}

/// Parent-level declarations of a single template level, before merging.
#[derive(Default, Clone)]
pub(crate) struct ParentDecls {
    pub members: Vec<(String, ParentMemberKind)>,
    pub operators: Vec<(Operator, OperatorFn)>,
    pub namespace: Option<ParentNamespace>,
}

/// Synthesized per-template instantiation behavior.
#[derive(Clone, Default)]
pub struct InstantiationShape {
    accessors: IndexMap<String, ParamAccessor>,
    members: IndexMap<String, ParentMember>,
    operators: FxHashMap<Operator, OperatorEntry>,
    namespace: Option<String>,
    render: Option<ParentRenderFn>,
}

impl InstantiationShape {
    /// Build the shape for a template.
    ///
    /// Precedence, lowest to highest: the base template's shape, the
    /// template's custom namespace, the template's own parent-level members.
    pub(crate) fn synthesize(
        owner: TypeHash,
        schema: &ParamSchema,
        base: Option<&InstantiationShape>,
        decls: &ParentDecls,
    ) -> Self {
        let mut shape = InstantiationShape {
            accessors: schema
                .names()
                .enumerate()
                .map(|(index, name)| (name.to_string(), ParamAccessor { index }))
                .collect(),
            ..Default::default()
        };

        if let Some(base) = base {
            for (name, member) in &base.members {
                let mut inherited = member.clone();
                inherited.flags |= MemberFlags::INHERITED;
                shape.members.insert(name.clone(), inherited);
            }
            for (op, entry) in &base.operators {
                let mut inherited = entry.clone();
                inherited.flags |= MemberFlags::INHERITED;
                shape.operators.insert(*op, inherited);
            }
            shape.namespace = base.namespace.clone();
            shape.render = base.render.clone();
        }

        if let Some(ns) = &decls.namespace {
            for (name, kind) in &ns.members {
                let member = ParentMember::new(owner, name.clone(), MemberFlags::NAMESPACE, kind.clone());
                shape.members.insert(name.clone(), member);
            }
            for (op, func) in &ns.operators {
                let entry = OperatorEntry::new(owner, *op, MemberFlags::NAMESPACE, func.clone());
                shape.operators.insert(*op, entry);
            }
            shape.namespace = Some(ns.name.clone());
            if ns.render.is_some() {
                shape.render = ns.render.clone();
            }
        }

        for (name, kind) in &decls.members {
            let member = ParentMember::new(owner, name.clone(), MemberFlags::empty(), kind.clone());
            shape.members.insert(name.clone(), member);
        }
        for (op, func) in &decls.operators {
            let entry = OperatorEntry::new(owner, *op, MemberFlags::empty(), func.clone());
            shape.operators.insert(*op, entry);
        }

        shape
    }

    /// Accessor for a parameter name.
    pub fn accessor(&self, name: &str) -> Option<ParamAccessor> {
        self.accessors.get(name).copied()
    }

    /// Parent-level member by name.
    pub fn member(&self, name: &str) -> Option<&ParentMember> {
        self.members.get(name)
    }

    /// Parent-level members in declaration order.
    pub fn members(&self) -> impl Iterator<Item = &ParentMember> {
        self.members.values()
    }

    /// Operator overload, if declared.
    pub fn operator(&self, op: Operator) -> Option<&OperatorEntry> {
        self.operators.get(&op)
    }

    /// Name of the custom instantiation namespace in effect, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Render an instantiation using the custom renderer or the generic default.
    pub fn render(&self, inst: &Instantiation) -> String {
        match &self.render {
            Some(render) => render(inst),
            None => default_render(inst),
        }
    }
}

fn default_render(inst: &Instantiation) -> String {
    let binding = inst
        .params()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}({})", inst.template().name(), binding)
}

impl fmt::Debug for InstantiationShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ops: Vec<_> = self.operators.keys().collect();
        ops.sort();
        f.debug_struct("InstantiationShape")
            .field("accessors", &self.accessors.keys().collect::<Vec<_>>())
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .field("operators", &ops)
            .field("namespace", &self.namespace)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDecl;
    use std::sync::Arc;
    use templar_core::ParamKind;

    fn schema() -> ParamSchema {
        let decls = vec![
            FieldDecl::parameter("x", ParamKind::Str, None),
            FieldDecl::parameter("y", ParamKind::Int, None),
        ];
        ParamSchema::extract("T", [decls.as_slice()]).unwrap()
    }

    fn property(v: i64) -> ParentMemberKind {
        ParentMemberKind::Property(Arc::new(
            move |_: &crate::InstantiationRef| -> templar_core::TemplarResult<Value> { Ok(Value::from(v)) },
        ))
    }

    #[test]
    fn one_accessor_per_schema_entry() {
        let shape = InstantiationShape::synthesize(TypeHash::from_name("T"), &schema(), None, &ParentDecls::default());
        assert_eq!(shape.accessor("x").map(ParamAccessor::index), Some(0));
        assert_eq!(shape.accessor("y").map(ParamAccessor::index), Some(1));
        assert!(shape.accessor("z").is_none());
        assert!(shape.namespace().is_none());
    }

    #[test]
    fn own_members_override_namespace_and_base() {
        let owner = TypeHash::from_name("T");
        let base_decls = ParentDecls {
            members: vec![("a".into(), property(1)), ("b".into(), property(1))],
            ..Default::default()
        };
        let base = InstantiationShape::synthesize(TypeHash::from_name("Base"), &schema(), None, &base_decls);

        let decls = ParentDecls {
            members: vec![("c".into(), property(3))],
            operators: Vec::new(),
            namespace: Some(ParentNamespace::new("Custom").property("b", |_| Ok(Value::from(2)))),
        };
        let shape = InstantiationShape::synthesize(owner, &schema(), Some(&base), &decls);

        let a = shape.member("a").unwrap();
        assert!(a.flags.contains(MemberFlags::INHERITED));
        let b = shape.member("b").unwrap();
        assert!(b.flags.contains(MemberFlags::NAMESPACE));
        assert_eq!(b.hash, TypeHash::from_member(owner, "b"));
        let c = shape.member("c").unwrap();
        assert!(!c.flags.contains(MemberFlags::NAMESPACE));
        assert_eq!(shape.namespace(), Some("Custom"));
        assert_eq!(shape.members().count(), 3);
    }

    #[test]
    fn operators_merge() {
        let decls = ParentDecls {
            namespace: Some(ParentNamespace::new("Ns").operator(Operator::Add, |_, _| Ok(None))),
            ..Default::default()
        };
        let shape = InstantiationShape::synthesize(TypeHash::from_name("T"), &schema(), None, &decls);
        assert!(shape.operator(Operator::Add).is_some());
        assert!(shape.operator(Operator::Sub).is_none());
    }
}
