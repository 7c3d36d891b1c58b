//! Machine Stack Implementation
//!
//! Expression stack used while evaluating a node.
//! No execution semantics.

use crate::error::{DreError, DreResult};
use crate::value::Value;

/// Machine expression stack
#[derive(Debug)]
pub struct Stack {
    values: Vec<Value>,
    max_size: usize,
}

impl Stack {
    /// Create new stack with maximum size
    pub fn new(max_size: usize) -> Self {
        Stack {
            values: Vec::new(),
            max_size,
        }
    }

    /// Push value onto stack
    pub fn push(&mut self, value: Value) -> DreResult<()> {
        if self.values.len() >= self.max_size {
            return Err(DreError::StackOverflow);
        }
        self.values.push(value);
        Ok(())
    }

    /// Pop value from stack
    pub fn pop(&mut self) -> DreResult<Value> {
        self.values.pop().ok_or(DreError::StackUnderflow)
    }

    /// Pop the top `count` values, returned in push order
    pub fn pop_n(&mut self, count: usize) -> DreResult<Vec<Value>> {
        if count > self.values.len() {
            return Err(DreError::StackUnderflow);
        }
        let at = self.values.len() - count;
        Ok(self.values.split_off(at))
    }

    /// Get current stack size
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Clear stack
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_n_keeps_push_order() {
        let mut stack = Stack::new(8);
        for n in 1..=3 {
            stack.push(Value::from(n)).unwrap();
        }
        let args = stack.pop_n(2).unwrap();
        assert_eq!(args, vec![Value::from(2), Value::from(3)]);
        assert_eq!(stack.size(), 1);
        assert!(matches!(stack.pop_n(2), Err(DreError::StackUnderflow)));
    }

    #[test]
    fn overflow_trapped() {
        let mut stack = Stack::new(1);
        stack.push(Value::Null).unwrap();
        assert!(matches!(stack.push(Value::Null), Err(DreError::StackOverflow)));
    }
}
