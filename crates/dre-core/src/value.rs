//! Runtime Value Representation
//!
//! Defines the scripted value type and the operators the function library
//! delegates to. Combinations that have no defined meaning are errors rather
//! than silent coercions.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DreError, DreResult};

/// Runtime value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Numeric value (IEEE 754)
    Number(f64),

    /// Text value
    String(String),

    /// Boolean value
    Bool(bool),

    /// Absence of a value
    Null,
}

impl Value {
    /// Returned by variable lookups that miss
    pub const NULL: Value = Value::Null;

    /// Name of the value's tag, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Null => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness. Zero, NaN, the empty string and null are false.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::Null => false,
        }
    }

    /// Display form. Null renders as the empty string.
    pub fn as_string(&self) -> String {
        self.to_string()
    }

    /// The numeric payload, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn try_add(&self, rhs: &Value) -> DreResult<Value> {
        match (self, rhs) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::String(format!("{}{}", self, rhs)))
            }
            _ => Err(mismatch("+", &[self, rhs])),
        }
    }

    pub fn try_sub(&self, rhs: &Value) -> DreResult<Value> {
        let (a, b) = numbers("-", self, rhs)?;
        Ok(Value::Number(a - b))
    }

    pub fn try_mul(&self, rhs: &Value) -> DreResult<Value> {
        let (a, b) = numbers("*", self, rhs)?;
        Ok(Value::Number(a * b))
    }

    pub fn try_div(&self, rhs: &Value) -> DreResult<Value> {
        let (a, b) = numbers("/", self, rhs)?;
        if b == 0.0 {
            return Err(DreError::DivisionByZero);
        }
        Ok(Value::Number(a / b))
    }

    pub fn try_rem(&self, rhs: &Value) -> DreResult<Value> {
        let (a, b) = numbers("%", self, rhs)?;
        if b == 0.0 {
            return Err(DreError::DivisionByZero);
        }
        Ok(Value::Number(a % b))
    }

    pub fn try_neg(&self) -> DreResult<Value> {
        match self {
            Value::Number(n) => Ok(Value::Number(-n)),
            _ => Err(mismatch("unary -", &[self])),
        }
    }

    /// Tag-and-value equality. Values of different tags are never equal.
    pub fn equals(&self, rhs: &Value) -> bool {
        self == rhs
    }

    /// Ordering between two numbers. Any other pairing is a type mismatch.
    /// NaN compares as unordered, which every ordering operator treats as false.
    pub fn try_compare(&self, rhs: &Value) -> DreResult<Option<Ordering>> {
        let (a, b) = numbers("comparison", self, rhs)?;
        Ok(a.partial_cmp(&b))
    }
}

fn numbers(op: &'static str, lhs: &Value, rhs: &Value) -> DreResult<(f64, f64)> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(mismatch(op, &[lhs, rhs])),
    }
}

fn mismatch(op: &'static str, operands: &[&Value]) -> DreError {
    let operands = operands
        .iter()
        .map(|v| v.type_name())
        .collect::<Vec<_>>()
        .join(" and ");
    DreError::TypeMismatch { op, operands }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_concatenation_with_either_side() {
        let a = Value::from("gold: ");
        let b = Value::from(3.0);
        assert_eq!(a.try_add(&b).unwrap(), Value::from("gold: 3"));
        assert_eq!(b.try_add(&a).unwrap(), Value::from("3gold: "));
        assert_eq!(Value::from("x").try_add(&Value::Null).unwrap(), Value::from("x"));
    }

    #[test]
    fn undefined_arithmetic_is_an_error() {
        let t = Value::Bool(true);
        assert!(matches!(t.try_add(&t), Err(DreError::TypeMismatch { .. })));
        assert!(Value::Null.try_mul(&Value::from(2.0)).is_err());
        assert!(Value::from("a").try_neg().is_err());
        assert!(Value::from("a").try_compare(&Value::from("b")).is_err());
    }

    #[test]
    fn division_by_zero_trapped() {
        let one = Value::from(1.0);
        let zero = Value::from(0.0);
        assert!(matches!(one.try_div(&zero), Err(DreError::DivisionByZero)));
        assert!(matches!(one.try_rem(&zero), Err(DreError::DivisionByZero)));
        assert_eq!(Value::from(7.0).try_rem(&Value::from(4.0)).unwrap(), Value::from(3.0));
    }

    #[test]
    fn conversions_are_total() {
        assert!(!Value::Null.as_bool());
        assert_eq!(Value::Null.as_string(), "");
        assert!(!Value::from(f64::NAN).as_bool());
        assert!(Value::from(-1.0).as_bool());
        assert!(!Value::from("").as_bool());
        assert_eq!(Value::from(3.0).as_string(), "3");
        assert_eq!(Value::from(2.5).as_string(), "2.5");
        assert_eq!(Value::Bool(false).as_string(), "false");
    }

    #[test]
    fn equality_is_by_tag() {
        assert!(!Value::from(1.0).equals(&Value::Bool(true)));
        assert!(!Value::from("1").equals(&Value::from(1.0)));
        assert!(Value::Null.equals(&Value::NULL));
    }
}
