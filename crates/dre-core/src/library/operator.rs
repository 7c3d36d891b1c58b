//! Built-in operators
//!
//! The closed set of arithmetic, comparison and logical operators the
//! compiler emits as `CallFunc` targets. Names match the compiler's token
//! names and are stable.

use std::fmt;

use super::Arity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Minus,
    UnaryMinus,
    Divide,
    Multiply,
    Modulo,
    EqualTo,
    NotEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
    And,
    Or,
    Xor,
    Not,
}

impl Operator {
    pub const ALL: [Operator; 16] = [
        Operator::Add,
        Operator::Minus,
        Operator::UnaryMinus,
        Operator::Divide,
        Operator::Multiply,
        Operator::Modulo,
        Operator::EqualTo,
        Operator::NotEqualTo,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqualTo,
        Operator::LessThan,
        Operator::LessThanOrEqualTo,
        Operator::And,
        Operator::Or,
        Operator::Xor,
        Operator::Not,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operator::Add => "Add",
            Operator::Minus => "Minus",
            Operator::UnaryMinus => "UnaryMinus",
            Operator::Divide => "Divide",
            Operator::Multiply => "Multiply",
            Operator::Modulo => "Modulo",
            Operator::EqualTo => "EqualTo",
            Operator::NotEqualTo => "NotEqualTo",
            Operator::GreaterThan => "GreaterThan",
            Operator::GreaterThanOrEqualTo => "GreaterThanOrEqualTo",
            Operator::LessThan => "LessThan",
            Operator::LessThanOrEqualTo => "LessThanOrEqualTo",
            Operator::And => "And",
            Operator::Or => "Or",
            Operator::Xor => "Xor",
            Operator::Not => "Not",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == name)
    }

    pub fn arity(self) -> Arity {
        match self {
            Operator::UnaryMinus | Operator::Not => Arity::Fixed(1),
            _ => Arity::Fixed(2),
        }
    }

    /// Source-level symbol, used by the disassembler
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Minus | Operator::UnaryMinus => "-",
            Operator::Divide => "/",
            Operator::Multiply => "*",
            Operator::Modulo => "%",
            Operator::EqualTo => "==",
            Operator::NotEqualTo => "!=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqualTo => ">=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqualTo => "<=",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Xor => "^",
            Operator::Not => "!",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
