//! TemplateRegistry - name-based template resolution.
//!
//! Saved data refers to templates by name only. A [`TemplateRegistry`] is the
//! receiving side's environment: every template that may appear in saved data
//! must be registered before restoring.
//!
//! # Thread Safety
//!
//! The registry is populated once and read afterwards. Wrap it in
//! `Arc<RwLock<_>>` if it has to be extended while other threads restore.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = TemplateRegistry::new();
//! registry.register(&a)?;
//! assert!(registry.contains("A"));
//! ```

use std::sync::Arc;

use rustc_hash::FxHashMap;
use templar_core::{RegistrationError, TypeHash};

use crate::template::TemplateRef;

/// Templates indexed by name.
#[derive(Debug, Default, Clone)]
pub struct TemplateRegistry {
    /// Templates stored by qualified name (primary storage).
    templates: FxHashMap<String, TemplateRef>,

    /// Reverse index: hash -> name.
    hash_to_name: FxHashMap<TypeHash, String>,
}

impl TemplateRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template under its own name.
    ///
    /// Re-registering the same template is a no-op. Registering a different
    /// template under a taken name is an error.
    pub fn register(&mut self, template: &TemplateRef) -> Result<(), RegistrationError> {
        let name = template.name();
        if let Some(existing) = self.templates.get(name) {
            if Arc::ptr_eq(existing, template) {
                return Ok(());
            }
            return Err(RegistrationError::DuplicateTemplate(name.to_string()));
        }

        self.hash_to_name
            .insert(template.type_hash(), name.to_string());
        self.templates
            .insert(name.to_string(), Arc::clone(template));
        tracing::debug!(template = name, "registered template");
        Ok(())
    }

    /// Register a template together with its ancestry.
    pub fn register_with_bases(&mut self, template: &TemplateRef) -> Result<(), RegistrationError> {
        if let Some(base) = template.base() {
            self.register_with_bases(base)?;
        }
        self.register(template)
    }

    /// Get a template by name.
    pub fn get(&self, name: &str) -> Option<&TemplateRef> {
        self.templates.get(name)
    }

    /// Get a template by name, failing if it is unknown.
    pub fn resolve(&self, name: &str) -> Result<&TemplateRef, RegistrationError> {
        self.templates
            .get(name)
            .ok_or_else(|| RegistrationError::TemplateNotFound(name.to_string()))
    }

    /// Get a template by hash.
    pub fn get_by_hash(&self, hash: TypeHash) -> Option<&TemplateRef> {
        self.hash_to_name
            .get(&hash)
            .and_then(|name| self.templates.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateRef> {
        self.templates.values()
    }
}
