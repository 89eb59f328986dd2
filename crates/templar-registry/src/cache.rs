//! Canonicalization cache.
//!
//! Maps `(template, bound parameter tuple)` to the one canonical
//! [`Instantiation`]. Lookups compare structurally, so any two argument sets
//! that bind to equal tuples (after defaults) reach the same entry and callers
//! get the same `Arc` back.
//!
//! The cache stores only the instantiations themselves; a lookup borrows the
//! requested tuple as a key that hashes and compares like the stored
//! entry, so the tuple is never held twice.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use indexmap::{Equivalent, IndexSet};
use lazy_static::lazy_static;
use rustc_hash::FxBuildHasher;
use templar_core::{BindingError, TemplarResult};

use crate::args::Args;
use crate::instantiation::{Instantiation, InstantiationRef};
use crate::template::{TemplateId, TemplateRef};
use crate::value::Value;

lazy_static! {
    static ref GLOBAL_CACHE: InstantiationCache = InstantiationCache::new();
}

pub(crate) type EntrySet = IndexSet<InstantiationRef, FxBuildHasher>;

/// Borrowed lookup key.
///
/// Must hash exactly like [`Instantiation`]: template id, then the tuple.
#[derive(Hash)]
struct BoundKey<'a> {
    template: TemplateId,
    values: &'a [Value],
}

impl Equivalent<InstantiationRef> for BoundKey<'_> {
    fn equivalent(&self, key: &InstantiationRef) -> bool {
        key.template().id() == self.template && key.values() == self.values
    }
}

/// Cache of canonical instantiations.
///
/// Lookup and insert happen under one lock, so concurrent requests for equal
/// arguments can never produce two distinct instantiations. Entries are
/// strong; see [`InstantiationCache::purge_unused`].
///
/// Cloning yields another handle to the same cache. Every instantiation keeps
/// a weak link back to the cache that created it, so parent-level code can
/// produce siblings in that same cache with
/// [`Instantiation::instantiate_sibling`].
#[derive(Debug, Clone, Default)]
pub struct InstantiationCache {
    entries: Arc<Mutex<EntrySet>>,
}

impl InstantiationCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache used by [`TemplateType::instantiate`](crate::TemplateType::instantiate).
    pub fn global() -> &'static InstantiationCache {
        &GLOBAL_CACHE
    }

    pub(crate) fn downgrade(&self) -> Weak<Mutex<EntrySet>> {
        Arc::downgrade(&self.entries)
    }

    pub(crate) fn upgrade(entries: &Weak<Mutex<EntrySet>>) -> Option<Self> {
        entries.upgrade().map(|entries| Self { entries })
    }

    /// Check if two handles refer to the same cache.
    pub fn same_cache(&self, other: &InstantiationCache) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    // Entries are immutable once inserted, so a poisoned set is still consistent.
    fn lock(&self) -> MutexGuard<'_, EntrySet> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Bind `args` against the template's schema and return the canonical
    /// instantiation for the resulting tuple.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn instantiate(&self, template: &TemplateRef, args: Args) -> TemplarResult<InstantiationRef> {
        let values = args.bind(template.name(), template.schema())?;
        self.get_or_insert(template, values)
    }

    /// Return the canonical instantiation for an already bound tuple.
    ///
    /// The tuple must hold exactly one value per schema entry.
    pub fn get_or_insert(&self, template: &TemplateRef, values: Vec<Value>) -> TemplarResult<InstantiationRef> {
        check_arity(template, &values)?;
        let key = BoundKey {
            template: template.id(),
            values: &values,
        };
        let (inst, inserted) = {
            let mut entries = self.lock();
            match entries.get(&key) {
                Some(existing) => (Arc::clone(existing), false),
                None => {
                    let inst = Instantiation::new(Arc::clone(template), values, self.downgrade());
                    entries.insert(Arc::clone(&inst));
                    (inst, true)
                }
            }
        };
        // rendering may run template code, keep it outside the lock
        if inserted {
            tracing::debug!(template = %template.name(), hash = %inst.type_hash(), "cached new instantiation");
        } else {
            tracing::trace!(template = %template.name(), hash = %inst.type_hash(), "instantiation cache hit");
        }
        Ok(inst)
    }

    /// Look up an existing entry without inserting.
    pub fn get(&self, template: &TemplateRef, values: &[Value]) -> Option<InstantiationRef> {
        let key = BoundKey {
            template: template.id(),
            values,
        };
        self.lock().get(&key).cloned()
    }

    pub fn contains(&self, template: &TemplateRef, values: &[Value]) -> bool {
        let key = BoundKey {
            template: template.id(),
            values,
        };
        self.lock().contains(&key)
    }

    /// Get the number of cached instantiations.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every entry no caller holds anymore.
    ///
    /// Instantiations used as parameters of other cached instantiations stay
    /// alive until their dependents are purged; the sweep repeats until it
    /// removes nothing. Returns the number of removed entries.
    pub fn purge_unused(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        loop {
            let len = entries.len();
            entries.retain(|inst| Arc::strong_count(inst) > 1);
            if entries.len() == len {
                break;
            }
        }
        let removed = before - entries.len();
        drop(entries);
        tracing::debug!(removed, "purged unused instantiations");
        removed
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

fn check_arity(template: &TemplateRef, values: &[Value]) -> TemplarResult<()> {
    let expected = template.schema().len();
    if values.len() > expected {
        return Err(BindingError::TooManyArguments {
            template: template.name().to_string(),
            expected,
            given: values.len(),
        }
        .into());
    }
    if let Some(name) = template.schema().names().nth(values.len()) {
        return Err(BindingError::MissingParameter {
            template: template.name().to_string(),
            name: name.to_string(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateBuilder;
    use templar_core::{ParamKind, TemplarError};

    fn template() -> TemplateRef {
        TemplateBuilder::new("A")
            .param_with_default("x", ParamKind::Str, "default")
            .build()
            .unwrap()
    }

    #[test]
    fn cache_new_is_empty() {
        let cache = InstantiationCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn equal_bindings_share_one_entry() {
        let a = template();
        let cache = InstantiationCache::new();

        let implicit = cache.instantiate(&a, Args::new()).unwrap();
        let positional = cache.instantiate(&a, Args::positional(["default"])).unwrap();
        let named = cache.instantiate(&a, Args::named([("x", "default")])).unwrap();

        assert!(Arc::ptr_eq(&implicit, &positional));
        assert!(Arc::ptr_eq(&implicit, &named));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&a, &[Value::from("default")]));
    }

    #[test]
    fn different_bindings_are_distinct() {
        let a = template();
        let cache = InstantiationCache::new();
        let one = cache.instantiate(&a, Args::positional(["a"])).unwrap();
        let two = cache.instantiate(&a, Args::positional(["b"])).unwrap();
        assert_ne!(one, two);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn same_name_templates_do_not_collide() {
        let cache = InstantiationCache::new();
        let first = cache.instantiate(&template(), Args::new()).unwrap();
        let second = cache.instantiate(&template(), Args::new()).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_ne!(first, second);
    }

    #[test]
    fn binding_errors_leave_cache_untouched() {
        let t = TemplateBuilder::new("T").param("n", ParamKind::Int).build().unwrap();
        let cache = InstantiationCache::new();
        assert!(cache.instantiate(&t, Args::new()).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn purge_keeps_held_entries() {
        let a = template();
        let cache = InstantiationCache::new();
        let held = cache.instantiate(&a, Args::positional(["kept"])).unwrap();
        cache.instantiate(&a, Args::positional(["dropped"])).unwrap();

        assert_eq!(cache.purge_unused(), 1);
        assert_eq!(cache.len(), 1);
        let again = cache.instantiate(&a, Args::positional(["kept"])).unwrap();
        assert!(Arc::ptr_eq(&held, &again));
    }

    #[test]
    fn purge_cascades_through_nested_parameters() {
        let a = template();
        let wrapper = TemplateBuilder::new("W").param("inner", ParamKind::Instantiation).build().unwrap();
        let cache = InstantiationCache::new();
        let inner = cache.instantiate(&a, Args::new()).unwrap();
        cache.instantiate(&wrapper, Args::positional([Value::Instantiation(inner)])).unwrap();

        assert_eq!(cache.purge_unused(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn bound_tuple_must_match_schema() {
        let a = template();
        let cache = InstantiationCache::new();

        let err = cache.get_or_insert(&a, vec![]).unwrap_err();
        assert_eq!(
            err,
            TemplarError::Binding(BindingError::MissingParameter {
                template: "A".into(),
                name: "x".into(),
            })
        );
        let err = cache
            .get_or_insert(&a, vec![Value::from("a"), Value::from("b")])
            .unwrap_err();
        assert!(matches!(
            err,
            TemplarError::Binding(BindingError::TooManyArguments { expected: 1, given: 2, .. })
        ));
        assert!(cache.is_empty());

        let inst = cache.get_or_insert(&a, vec![Value::from("ok")]).unwrap();
        assert_eq!(inst.param("x"), Some(&Value::from("ok")));
        assert!(Arc::ptr_eq(&inst, &cache.instantiate(&a, Args::positional(["ok"])).unwrap()));
    }

    #[test]
    fn instantiations_remember_their_cache() {
        let a = template();
        let cache = InstantiationCache::new();
        let inst = cache.instantiate(&a, Args::positional(["here"])).unwrap();

        assert!(inst.cache().same_cache(&cache));
        assert!(!inst.cache().same_cache(InstantiationCache::global()));
        let sibling = inst.instantiate_sibling(Args::positional(["there"])).unwrap();
        assert!(cache.contains(&a, &[Value::from("there")]));
        assert!(Arc::ptr_eq(&sibling, &cache.get(&a, &[Value::from("there")]).unwrap()));
    }

    #[test]
    fn clones_share_entries() {
        let a = template();
        let cache = InstantiationCache::new();
        let handle = cache.clone();
        let first = cache.instantiate(&a, Args::new()).unwrap();
        let second = handle.instantiate(&a, Args::new()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(handle.len(), 1);
    }

    #[test]
    fn concurrent_instantiation_is_canonical() {
        let a = template();
        let cache = Arc::new(InstantiationCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let a = Arc::clone(&a);
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.instantiate(&a, Args::positional(["shared"])).unwrap())
            })
            .collect();
        let results: Vec<InstantiationRef> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(cache.len(), 1);
    }
}
