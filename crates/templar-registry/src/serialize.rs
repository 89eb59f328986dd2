//! Save and restore.
//!
//! Each entity kind has a plain, serde-derived saved form:
//!
//! | Entity        | Saved as                                      |
//! |---------------|-----------------------------------------------|
//! | Template      | its name, resolved by a [`TemplateRegistry`]  |
//! | Instantiation | template name + ordered parameter tuple       |
//! | Instance      | saved instantiation + instance fields         |
//!
//! Restoring an instantiation always goes back through the
//! [`InstantiationCache`], so a restored instantiation is the canonical one.
//! Restoring an instance links a bare instance to it and sets the saved
//! fields without running the initializer.

use std::sync::Arc;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use templar_core::{SerializationError, TemplarResult};

use crate::args::Args;
use crate::cache::InstantiationCache;
use crate::instance::Instance;
use crate::instantiation::{Instantiation, InstantiationRef};
use crate::registry::TemplateRegistry;
use crate::template::{TemplateRef, TemplateType};
use crate::value::Value;

/// Saved template reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTemplate {
    pub name: String,
}

/// Saved instantiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedInstantiation {
    pub template: SavedTemplate,
    /// Parameter values in schema order.
    pub params: Vec<SavedValue>,
}

/// Saved instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedInstance {
    pub parent: SavedInstantiation,
    pub fields: IndexMap<String, SavedValue>,
}

/// Saved form of any [`Value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SavedValue {
    None,
    Bool(bool),
    Int(i64),
    Float(#[serde(with = "float_repr")] f64),
    Str(String),
    List(Vec<SavedValue>),
    Template(SavedTemplate),
    Instantiation(SavedInstantiation),
    Instance(SavedInstance),
}

/// JSON has no NaN or infinity; those are written as `"nan"`, `"inf"` and
/// `"-inf"`. Finite values stay plain numbers.
mod float_repr {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("nan")
        } else if value.is_sign_positive() {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(text) => match text.as_str() {
                "nan" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(D::Error::custom(format!("invalid float `{other}`"))),
            },
        }
    }
}

impl From<&TemplateType> for SavedTemplate {
    fn from(template: &TemplateType) -> Self {
        Self {
            name: template.name().to_string(),
        }
    }
}

impl From<&Instantiation> for SavedInstantiation {
    fn from(inst: &Instantiation) -> Self {
        Self {
            template: SavedTemplate::from(&**inst.template()),
            params: inst.values().iter().map(SavedValue::from).collect(),
        }
    }
}

impl From<&Instance> for SavedInstance {
    fn from(instance: &Instance) -> Self {
        Self {
            parent: SavedInstantiation::from(&**instance.parent()),
            fields: instance
                .fields()
                .map(|(name, value)| (name.to_string(), SavedValue::from(value)))
                .collect(),
        }
    }
}

impl From<&Value> for SavedValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::None => SavedValue::None,
            Value::Bool(b) => SavedValue::Bool(*b),
            Value::Int(n) => SavedValue::Int(*n),
            Value::Float(f) => SavedValue::Float(f.0),
            Value::Str(s) => SavedValue::Str(s.clone()),
            Value::List(items) => SavedValue::List(items.iter().map(SavedValue::from).collect()),
            Value::Template(t) => SavedValue::Template(SavedTemplate::from(&**t)),
            Value::Instantiation(i) => SavedValue::Instantiation(SavedInstantiation::from(&**i)),
            Value::Instance(i) => SavedValue::Instance(SavedInstance::from(&**i)),
        }
    }
}

/// Save a value.
pub fn save(value: &Value) -> SavedValue {
    SavedValue::from(value)
}

/// Save a value as JSON.
pub fn to_json(value: &Value) -> TemplarResult<String> {
    Ok(serde_json::to_string(&save(value))?)
}

/// Rebuilds values from their saved forms.
pub struct Restorer<'a> {
    registry: &'a TemplateRegistry,
    cache: &'a InstantiationCache,
}

impl<'a> Restorer<'a> {
    /// Restore against the process-wide cache.
    pub fn new(registry: &'a TemplateRegistry) -> Self {
        Self::with_cache(registry, InstantiationCache::global())
    }

    /// Restore against an explicit cache.
    pub fn with_cache(registry: &'a TemplateRegistry, cache: &'a InstantiationCache) -> Self {
        Self { registry, cache }
    }

    pub fn restore(&self, saved: &SavedValue) -> TemplarResult<Value> {
        Ok(match saved {
            SavedValue::None => Value::None,
            SavedValue::Bool(b) => Value::Bool(*b),
            SavedValue::Int(n) => Value::Int(*n),
            SavedValue::Float(f) => Value::Float(OrderedFloat(*f)),
            SavedValue::Str(s) => Value::Str(s.clone()),
            SavedValue::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| self.restore(item))
                    .collect::<TemplarResult<_>>()?,
            ),
            SavedValue::Template(t) => Value::Template(self.restore_template(t)?),
            SavedValue::Instantiation(i) => Value::Instantiation(self.restore_instantiation(i)?),
            SavedValue::Instance(i) => Value::Instance(Arc::new(self.restore_instance(i)?)),
        })
    }

    pub fn restore_template(&self, saved: &SavedTemplate) -> TemplarResult<TemplateRef> {
        self.registry
            .get(&saved.name)
            .cloned()
            .ok_or_else(|| SerializationError::UnresolvedTemplate(saved.name.clone()).into())
    }

    /// Re-enter the cache with the saved parameter tuple.
    pub fn restore_instantiation(&self, saved: &SavedInstantiation) -> TemplarResult<InstantiationRef> {
        let template = self.restore_template(&saved.template)?;
        let params = saved
            .params
            .iter()
            .map(|p| self.restore(p))
            .collect::<TemplarResult<Vec<_>>>()?;
        tracing::trace!(template = %template.name(), params = params.len(), "restoring instantiation");
        self.cache.instantiate(&template, Args::from(params))
    }

    /// Rebuild an instance without running its initializer.
    pub fn restore_instance(&self, saved: &SavedInstance) -> TemplarResult<Instance> {
        let parent = self.restore_instantiation(&saved.parent)?;
        let mut instance = Instance::bare(parent);
        for (name, value) in &saved.fields {
            instance.set(name.as_str(), self.restore(value)?)?;
        }
        Ok(instance)
    }

    /// Restore a value from JSON produced by [`to_json`].
    pub fn restore_json(&self, json: &str) -> TemplarResult<Value> {
        let saved: SavedValue = serde_json::from_str(json)?;
        self.restore(&saved)
    }
}
