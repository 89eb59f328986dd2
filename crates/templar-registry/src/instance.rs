//! Instances produced by calling an instantiation.

use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use templar_core::{BindingError, TemplarResult, TypeHash, hash_constants};

use crate::instantiation::InstantiationRef;
use crate::template::TemplateRef;
use crate::value::Value;

/// An object built from an instantiation.
///
/// Holds only its own fields plus the link to its instantiation. Parameter
/// reads are delegated through that link and never copied onto the instance.
#[derive(Clone)]
pub struct Instance {
    parent: InstantiationRef,
    fields: IndexMap<String, Value>,
}

impl Instance {
    /// An instance linked to `parent` with no fields set.
    pub(crate) fn bare(parent: InstantiationRef) -> Self {
        Self {
            parent,
            fields: IndexMap::new(),
        }
    }

    /// The owning instantiation. Fixed for the lifetime of the instance.
    pub fn parent(&self) -> &InstantiationRef {
        &self.parent
    }

    pub fn template(&self) -> &TemplateRef {
        self.parent.template()
    }

    /// Read an instance-local field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Instance-local fields in assignment order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Read a template parameter through the parent link.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.template()
            .shape()
            .accessor(name)
            .and_then(|accessor| accessor.read_through(self))
    }

    /// Set an instance-local field.
    ///
    /// # Errors
    ///
    /// [`BindingError::ShadowedParameter`] if `name` is a template parameter.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> TemplarResult<()> {
        let name = name.into();
        if self.template().schema().contains(&name) {
            return Err(BindingError::ShadowedParameter {
                template: self.template().name().to_string(),
                name,
            }
            .into());
        }
        self.fields.insert(name, value.into());
        Ok(())
    }

    /// Content hash over the parent identity and the field set.
    ///
    /// Independent of field assignment order, matching equality.
    pub fn content_hash(&self) -> TypeHash {
        let mut entries: Vec<(&String, &Value)> = self.fields.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut parts = Vec::with_capacity(entries.len() + 1);
        parts.push(self.parent.type_hash());
        parts.extend(
            entries
                .into_iter()
                .map(|(name, value)| TypeHash::from_member(value.content_hash(), name)),
        );
        TypeHash::chain(hash_constants::VALUE ^ 9, &parts)
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent && self.fields == other.fields
    }
}

impl Eq for Instance {}

impl Hash for Instance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.content_hash().as_u64());
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(render) = self.template().instance_render() {
            return write!(f, "{}", render(self));
        }
        write!(f, "<{}", self.parent)?;
        for (name, value) in &self.fields {
            write!(f, " {}={}", name, value)?;
        }
        write!(f, ">")
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("parent", &self.parent)
            .field("fields", &self.fields)
            .finish()
    }
}
