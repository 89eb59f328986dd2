//! Canonical instantiations.
//!
//! An [`Instantiation`] is the single generic representation for every
//! template binding: the template handle plus the bound parameter tuple in
//! schema order. Per-template behavior comes from the template's
//! [`InstantiationShape`](crate::InstantiationShape).
//!
//! Instantiations are only created by the
//! [`InstantiationCache`](crate::InstantiationCache), always behind an `Arc`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Sub};
use std::sync::{Arc, Mutex, Weak};

use templar_core::{CallError, LookupError, Operator, TemplarResult, TypeHash};

use crate::args::Args;
use crate::cache::{EntrySet, InstantiationCache};
use crate::instance::Instance;
use crate::template::TemplateRef;
use crate::value::Value;

/// Shared handle to a canonical instantiation.
pub type InstantiationRef = Arc<Instantiation>;

/// A template bound to concrete parameter values.
pub struct Instantiation {
    this: Weak<Instantiation>,
    cache: Weak<Mutex<EntrySet>>,
    template: TemplateRef,
    values: Vec<Value>,
    hash: TypeHash,
}

impl Instantiation {
    pub(crate) fn new(
        template: TemplateRef,
        values: Vec<Value>,
        cache: Weak<Mutex<EntrySet>>,
    ) -> InstantiationRef {
        let parts: Vec<TypeHash> = values.iter().map(Value::content_hash).collect();
        let hash = TypeHash::from_template_instance(template.type_hash(), &parts);
        Arc::new_cyclic(|this| Instantiation {
            this: this.clone(),
            cache,
            template,
            values,
            hash,
        })
    }

    /// Shared handle to `self`.
    pub fn to_ref(&self) -> InstantiationRef {
        self.this
            .upgrade()
            .unwrap_or_else(|| {
                Instantiation::new(Arc::clone(&self.template), self.values.clone(), self.cache.clone())
            })
    }

    /// The cache that created this instantiation.
    ///
    /// Falls back to the process-wide cache once the owning cache is gone.
    pub fn cache(&self) -> InstantiationCache {
        InstantiationCache::upgrade(&self.cache).unwrap_or_else(|| InstantiationCache::global().clone())
    }

    /// Instantiate this instantiation's template in the same cache.
    ///
    /// Parent-level operators use this to return results that stay canonical
    /// alongside their operands.
    pub fn instantiate_sibling(&self, args: impl Into<Args>) -> TemplarResult<InstantiationRef> {
        self.cache().instantiate(&self.template, args.into())
    }

    /// The template this instantiation binds.
    pub fn template(&self) -> &TemplateRef {
        &self.template
    }

    /// Bound parameter values in schema order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// `(name, value)` pairs in schema order.
    pub fn params(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.template.schema().names().zip(self.values.iter())
    }

    /// Read one parameter.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.template
            .shape()
            .accessor(name)
            .and_then(|accessor| accessor.read(self))
    }

    /// Identity hash over `(template, parameter tuple)`.
    pub fn type_hash(&self) -> TypeHash {
        self.hash
    }

    /// Construct a new instance.
    ///
    /// The instance is linked to `self` before its initializer runs. The
    /// initializer receives exactly `args`; parameters are not re-passed.
    /// Templates without an initializer assign `args` positionally to their
    /// declared instance fields.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn call(self: &Arc<Self>, args: &[Value]) -> TemplarResult<Instance> {
        let mut instance = Instance::bare(Arc::clone(self));
        match self.template.initializer() {
            Some(init) => init(&mut instance, args)?,
            None => {
                let fields = self.template.instance_fields();
                if fields.len() != args.len() {
                    return Err(CallError::ArgumentCount {
                        member: self.to_string(),
                        expected: fields.len(),
                        given: args.len(),
                    }
                    .into());
                }
                for (name, value) in fields.iter().zip(args) {
                    instance.set(name.as_str(), value.clone())?;
                }
            }
        }
        tracing::trace!(instantiation = %self, fields = instance.fields().count(), "constructed instance");
        Ok(instance)
    }

    /// Apply a parent-level operator.
    ///
    /// Binary operators try the left operand's overload first. If it is
    /// missing or declines, the reflected overload of a right-hand
    /// instantiation runs with the operands swapped.
    pub fn apply(&self, op: Operator, rhs: &Value) -> TemplarResult<Value> {
        if op.is_unary() {
            return Err(unsupported(op, &self.to_string(), rhs));
        }
        let this = self.to_ref();
        if let Some(entry) = self.template.shape().operator(op)
            && let Some(result) = (entry.func)(&this, Some(rhs))?
        {
            return Ok(result);
        }
        if let (Some(reflected), Value::Instantiation(other)) = (op.reflected(), rhs)
            && let Some(entry) = other.template.shape().operator(reflected)
            && let Some(result) = (entry.func)(other, Some(&Value::Instantiation(this)))?
        {
            return Ok(result);
        }
        Err(unsupported(op, &self.to_string(), rhs))
    }

    /// Apply the parent-level negation overload.
    pub fn neg(&self) -> TemplarResult<Value> {
        let this = self.to_ref();
        if let Some(entry) = self.template.shape().operator(Operator::Neg)
            && let Some(result) = (entry.func)(&this, None)?
        {
            return Ok(result);
        }
        Err(LookupError::UnsupportedOperator {
            operator: Operator::Neg.symbol(),
            lhs: self.to_string(),
            rhs: String::new(),
        }
        .into())
    }
}

fn unsupported(op: Operator, lhs: &str, rhs: &Value) -> templar_core::TemplarError {
    LookupError::UnsupportedOperator {
        operator: op.symbol(),
        lhs: lhs.to_string(),
        rhs: rhs.to_string(),
    }
    .into()
}

impl Value {
    /// Apply a binary operator to two values.
    ///
    /// Only instantiations carry operator overloads. A non-instantiation left
    /// operand falls through to the reflected overload on the right.
    pub fn apply(&self, op: Operator, rhs: &Value) -> TemplarResult<Value> {
        match (self, rhs) {
            (Value::Instantiation(lhs), _) => lhs.apply(op, rhs),
            (_, Value::Instantiation(other)) => {
                if let Some(reflected) = op.reflected()
                    && let Some(entry) = other.template.shape().operator(reflected)
                    && let Some(result) = (entry.func)(other, Some(self))?
                {
                    return Ok(result);
                }
                Err(unsupported(op, &self.to_string(), rhs))
            }
            _ => Err(unsupported(op, &self.to_string(), rhs)),
        }
    }
}

impl PartialEq for Instantiation {
    fn eq(&self, other: &Self) -> bool {
        self.template.id() == other.template.id() && self.values == other.values
    }
}

impl Eq for Instantiation {}

impl Hash for Instantiation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.template.id().hash(state);
        self.values.hash(state);
    }
}

impl fmt::Display for Instantiation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.template.shape().render(self))
    }
}

impl fmt::Debug for Instantiation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instantiation")
            .field("template", &self.template.name())
            .field("values", &self.values)
            .field("hash", &self.hash)
            .finish()
    }
}

macro_rules! binary_sugar {
    ($($trait:ident :: $method:ident => $op:ident),* $(,)?) => {
        $(
            impl $trait for &Instantiation {
                type Output = TemplarResult<Value>;

                fn $method(self, rhs: Self) -> Self::Output {
                    self.apply(Operator::$op, &Value::Instantiation(rhs.to_ref()))
                }
            }
        )*
    };
}

binary_sugar! {
    Add::add => Add,
    Sub::sub => Sub,
    Mul::mul => Mul,
    Div::div => Div,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateBuilder;
    use templar_core::{ParamKind, TemplarError};

    fn summing(name: &str) -> TemplateRef {
        TemplateBuilder::new(name)
            .param("z", ParamKind::Int)
            .parent_operator(Operator::Add, |lhs, rhs| {
                let Some(Value::Instantiation(rhs)) = rhs else {
                    return Ok(None);
                };
                let (Some(a), Some(b)) = (
                    lhs.param("z").and_then(Value::as_int),
                    rhs.param("z").and_then(Value::as_int),
                ) else {
                    return Ok(None);
                };
                lhs.instantiate_sibling(Args::positional([a + b])).map(|i| Some(i.into()))
            })
            .build()
            .unwrap()
    }

    #[test]
    fn params_follow_schema_order() {
        let t = TemplateBuilder::new("T")
            .param("a", ParamKind::Int)
            .param_with_default("b", ParamKind::Str, "dflt")
            .build()
            .unwrap();
        let cache = InstantiationCache::new();
        let inst = t.instantiate_in(&cache, Args::positional([1])).unwrap();

        let params: Vec<(&str, &Value)> = inst.params().collect();
        assert_eq!(params, vec![("a", &Value::from(1)), ("b", &Value::from("dflt"))]);
        assert_eq!(inst.param("b"), Some(&Value::from("dflt")));
        assert_eq!(inst.param("c"), None);
        assert_eq!(inst.to_string(), "T(a=1, b=dflt)");
    }

    #[test]
    fn operator_sugar_dispatches_parent_add() {
        let b = summing("B");
        let cache = InstantiationCache::new();
        let b3 = b.instantiate_in(&cache, Args::positional([3])).unwrap();
        let b4 = b.instantiate_in(&cache, Args::positional([4])).unwrap();
        let b7 = b.instantiate_in(&cache, Args::positional([7])).unwrap();

        let sum = (&*b3 + &*b4).unwrap();
        assert!(Arc::ptr_eq(sum.as_instantiation().unwrap(), &b7));
        assert_eq!(sum, Value::Instantiation(b7));
        assert!(!InstantiationCache::global().contains(&b, &[Value::from(7)]));
    }

    #[test]
    fn missing_operator_is_lookup_error() {
        let b = summing("B");
        let cache = InstantiationCache::new();
        let b3 = b.instantiate_in(&cache, Args::positional([3])).unwrap();
        let err = (&*b3 - &*b3).unwrap_err();
        assert!(matches!(
            err,
            TemplarError::Lookup(LookupError::UnsupportedOperator { operator: "-", .. })
        ));
        assert!(b3.neg().unwrap_err().is_lookup());
    }

    #[test]
    fn unary_operator_is_not_applied_as_binary() {
        let t = TemplateBuilder::new("N")
            .param("n", ParamKind::Int)
            .parent_operator(Operator::Neg, |this, _| {
                Ok(Some(Value::from(-this.param("n").and_then(Value::as_int).unwrap_or(0))))
            })
            .build()
            .unwrap();
        let cache = InstantiationCache::new();
        let n2 = t.instantiate_in(&cache, Args::positional([2])).unwrap();

        assert_eq!(n2.neg().unwrap(), Value::from(-2));
        let err = n2.apply(Operator::Neg, &Value::from(1)).unwrap_err();
        assert!(matches!(
            err,
            TemplarError::Lookup(LookupError::UnsupportedOperator { operator: "-", .. })
        ));
    }

    #[test]
    fn reflected_operator_runs_when_left_declines() {
        let r = TemplateBuilder::new("R")
            .param("n", ParamKind::Int)
            .parent_operator(Operator::MulR, |this, lhs| {
                let factor = lhs.and_then(Value::as_int).unwrap_or(1);
                let n = this.param("n").and_then(Value::as_int).unwrap_or(0);
                Ok(Some(Value::from(n * factor)))
            })
            .build()
            .unwrap();
        let cache = InstantiationCache::new();
        let r5 = r.instantiate_in(&cache, Args::positional([5])).unwrap();

        let product = Value::from(3).apply(Operator::Mul, &Value::Instantiation(r5)).unwrap();
        assert_eq!(product, Value::from(15));
    }

    #[test]
    fn default_call_assigns_instance_fields() {
        let t = TemplateBuilder::new("T").param("x", ParamKind::Int).field("y").build().unwrap();
        let cache = InstantiationCache::new();
        let inst = t.instantiate_in(&cache, Args::positional([1])).unwrap();

        let obj = inst.call(&[Value::from(5)]).unwrap();
        assert_eq!(obj.field("y"), Some(&Value::from(5)));

        let err = inst.call(&[]).unwrap_err();
        assert!(matches!(
            err,
            TemplarError::Call(CallError::ArgumentCount { expected: 1, given: 0, .. })
        ));
    }

    #[test]
    fn to_ref_returns_the_canonical_handle() {
        let t = TemplateBuilder::new("T").build().unwrap();
        let cache = InstantiationCache::new();
        let inst = t.instantiate_in(&cache, Args::new()).unwrap();
        assert!(Arc::ptr_eq(&inst, &inst.to_ref()));
    }
}
