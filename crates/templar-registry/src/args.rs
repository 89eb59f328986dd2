//! Template argument binding.
//!
//! Binding resolves a call like `Template[arg, name=value]` against a
//! [`ParamSchema`]: declared defaults are applied first, then positional
//! arguments overlay in schema order, then named arguments overlay by name.
//! The result is the full parameter tuple in schema order, which is what the
//! canonicalization cache keys on.

use templar_core::{BindingError, TemplarResult, check_param_name};

use crate::schema::ParamSchema;
use crate::value::Value;

/// Arguments supplied when instantiating a template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
}

impl Args {
    /// No arguments; every parameter falls back to its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional arguments, bound in schema order.
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            named: Vec::new(),
        }
    }

    /// Named arguments.
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            positional: Vec::new(),
            named: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Append a named argument.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.push((name.into(), value.into()));
        self
    }

    pub fn positional_values(&self) -> &[Value] {
        &self.positional
    }

    pub fn named_values(&self) -> &[(String, Value)] {
        &self.named
    }

    /// Bind against a schema, producing the parameter tuple in schema order.
    pub fn bind(&self, template: &str, schema: &ParamSchema) -> TemplarResult<Vec<Value>> {
        if self.positional.len() > schema.len() {
            return Err(BindingError::TooManyArguments {
                template: template.to_string(),
                expected: schema.len(),
                given: self.positional.len(),
            }
            .into());
        }

        let mut slots: Vec<Option<Value>> = schema.iter().map(|(_, spec)| spec.default.clone()).collect();
        let mut supplied = vec![false; schema.len()];

        for (i, value) in self.positional.iter().enumerate() {
            slots[i] = Some(value.clone());
            supplied[i] = true;
        }

        for (name, value) in &self.named {
            check_param_name(template, name)?;
            let Some(index) = schema.index_of(name) else {
                return Err(BindingError::UnknownParameter {
                    template: template.to_string(),
                    name: name.clone(),
                }
                .into());
            };
            if supplied[index] {
                return Err(BindingError::DuplicateArgument {
                    template: template.to_string(),
                    name: name.clone(),
                }
                .into());
            }
            slots[index] = Some(value.clone());
            supplied[index] = true;
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or_else(|| {
                    let name = schema.get_index(i).map(|(n, _)| n).unwrap_or_default();
                    BindingError::MissingParameter {
                        template: template.to_string(),
                        name: name.to_string(),
                    }
                    .into()
                })
            })
            .collect()
    }
}

impl From<Vec<Value>> for Args {
    fn from(positional: Vec<Value>) -> Self {
        Self {
            positional,
            named: Vec::new(),
        }
    }
}

impl From<Value> for Args {
    fn from(value: Value) -> Self {
        Self::positional([value])
    }
}
