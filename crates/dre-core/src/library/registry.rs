//! Function Registry
//!
//! Name-keyed registry of host functions layered over the built-in operator
//! set. Registered names shadow operators, so a host can override `EqualTo`
//! and `NotEqualTo` follows along.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::{Arity, FunctionContext, Operator};
use crate::error::{DreError, DreResult};
use crate::value::Value;

/// Host function implementation
pub type FunctionImpl =
    Arc<dyn Fn(&FunctionContext<'_>, &[Value]) -> DreResult<Value> + Send + Sync>;

/// A registered host function
#[derive(Clone)]
pub struct FunctionInfo {
    pub name: String,
    pub arity: Arity,
    implementation: FunctionImpl,
}

impl FunctionInfo {
    pub fn call(&self, ctx: &FunctionContext<'_>, args: &[Value]) -> DreResult<Value> {
        (self.implementation)(ctx, args)
    }
}

impl fmt::Debug for FunctionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionInfo")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Result of resolving a name
#[derive(Debug, Clone, Copy)]
pub enum Callable<'a> {
    Operator(Operator),
    Function(&'a FunctionInfo),
}

impl<'a> Callable<'a> {
    pub fn name(&self) -> &str {
        match self {
            Callable::Operator(op) => op.name(),
            Callable::Function(info) => &info.name,
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Callable::Operator(op) => op.arity(),
            Callable::Function(info) => info.arity,
        }
    }
}

/// Function library shared by every run of a runtime
#[derive(Debug, Default, Clone)]
pub struct Library {
    functions: IndexMap<String, FunctionInfo>,
}

impl Library {
    /// Library with the operator set only
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a host function
    pub fn register<F>(&mut self, name: &str, arity: Arity, implementation: F)
    where
        F: Fn(&FunctionContext<'_>, &[Value]) -> DreResult<Value> + Send + Sync + 'static,
    {
        self.functions.insert(
            name.to_string(),
            FunctionInfo {
                name: name.to_string(),
                arity,
                implementation: Arc::new(implementation),
            },
        );
    }

    /// Remove a host function. Operators cannot be removed.
    pub fn deregister(&mut self, name: &str) -> bool {
        self.functions.shift_remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name) || Operator::from_name(name).is_some()
    }

    /// Registered host function names, in registration order
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Resolve a name. Host functions shadow operators.
    pub fn lookup(&self, name: &str) -> DreResult<Callable<'_>> {
        if let Some(info) = self.functions.get(name) {
            return Ok(Callable::Function(info));
        }
        Operator::from_name(name)
            .map(Callable::Operator)
            .ok_or_else(|| DreError::UnknownFunction(name.to_string()))
    }

    /// Call a function by name after checking its arity
    pub fn invoke(
        &self,
        name: &str,
        ctx: &FunctionContext<'_>,
        args: &[Value],
    ) -> DreResult<Value> {
        let callable = self.lookup(name)?;
        if let Arity::Fixed(expected) = callable.arity() {
            if expected != args.len() {
                return Err(DreError::ArgumentCount {
                    name: name.to_string(),
                    expected,
                    found: args.len(),
                });
            }
        }
        match callable {
            Callable::Function(info) => info.call(ctx, args),
            Callable::Operator(op) => self.apply_operator(op, ctx, args),
        }
    }

    fn apply_operator(
        &self,
        op: Operator,
        ctx: &FunctionContext<'_>,
        args: &[Value],
    ) -> DreResult<Value> {
        match (op, args) {
            (Operator::UnaryMinus, [a]) => a.try_neg(),
            (Operator::Not, [a]) => Ok(Value::Bool(!a.as_bool())),

            (Operator::Add, [a, b]) => a.try_add(b),
            (Operator::Minus, [a, b]) => a.try_sub(b),
            (Operator::Divide, [a, b]) => a.try_div(b),
            (Operator::Multiply, [a, b]) => a.try_mul(b),
            (Operator::Modulo, [a, b]) => a.try_rem(b),

            (Operator::EqualTo, [a, b]) => Ok(Value::Bool(a.equals(b))),
            // Defined through whatever EqualTo currently resolves to
            (Operator::NotEqualTo, [_, _]) => {
                let equal = self.invoke(Operator::EqualTo.name(), ctx, args)?;
                Ok(Value::Bool(!equal.as_bool()))
            }

            (Operator::GreaterThan, [a, b]) => {
                Ok(Value::Bool(a.try_compare(b)? == Some(Ordering::Greater)))
            }
            (Operator::GreaterThanOrEqualTo, [a, b]) => Ok(Value::Bool(matches!(
                a.try_compare(b)?,
                Some(Ordering::Greater | Ordering::Equal)
            ))),
            (Operator::LessThan, [a, b]) => {
                Ok(Value::Bool(a.try_compare(b)? == Some(Ordering::Less)))
            }
            (Operator::LessThanOrEqualTo, [a, b]) => Ok(Value::Bool(matches!(
                a.try_compare(b)?,
                Some(Ordering::Less | Ordering::Equal)
            ))),

            (Operator::And, [a, b]) => Ok(Value::Bool(a.as_bool() && b.as_bool())),
            (Operator::Or, [a, b]) => Ok(Value::Bool(a.as_bool() || b.as_bool())),
            (Operator::Xor, [a, b]) => Ok(Value::Bool(a.as_bool() ^ b.as_bool())),

            _ => Err(DreError::ArgumentCount {
                name: op.name().to_string(),
                expected: match op.arity() {
                    Arity::Fixed(n) => n,
                    Arity::Variadic => args.len(),
                },
                found: args.len(),
            }),
        }
    }
}
