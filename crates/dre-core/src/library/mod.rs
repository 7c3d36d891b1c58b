//! Function Library
//!
//! Operators are a closed enum dispatched by `match`; host functions such as
//! `visitCount` live in a name-keyed registry. Both are reached through
//! [`Library::invoke`].

pub mod operator;
pub mod registry;

use std::fmt;

use crate::bytecode::Program;
use crate::runtime::{Logger, VisitCounter};

pub use operator::Operator;
pub use registry::{Callable, FunctionImpl, FunctionInfo, Library};

/// Argument count a function accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many arguments
    Fixed(usize),
    /// Any count; the function validates its own arguments
    Variadic,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Fixed(n) => n == count,
            Arity::Variadic => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{}", n),
            Arity::Variadic => f.write_str("variadic"),
        }
    }
}

/// Runtime state a function may observe while it is being called
#[derive(Clone, Copy)]
pub struct FunctionContext<'a> {
    pub current_node: Option<&'a str>,
    pub program: Option<&'a Program>,
    pub visits: &'a VisitCounter,
    pub logger: &'a Logger,
}

impl<'a> FunctionContext<'a> {
    pub fn node_exists(&self, name: &str) -> bool {
        self.program.map_or(false, |p| p.node(name).is_some())
    }
}
