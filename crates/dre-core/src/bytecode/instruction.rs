//! Bytecode Instruction Representation
//!
//! Defines the instruction format for dialogue programs.
//! This layer contains no execution semantics.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::opcode::{OpCode, OperandKind};
use crate::error::{DreError, DreResult};

/// A literal operand embedded in an instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    String(String),
    Number(f64),
    Bool(bool),
}

impl Operand {
    pub fn kind(&self) -> OperandKind {
        match self {
            Operand::String(_) => OperandKind::String,
            Operand::Number(_) => OperandKind::Number,
            Operand::Bool(_) => OperandKind::Bool,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::String(s) => write!(f, "\"{}\"", s),
            Operand::Number(n) => write!(f, "{}", n),
            Operand::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::String(s.to_string())
    }
}

impl From<f64> for Operand {
    fn from(n: f64) -> Self {
        Operand::Number(n)
    }
}

impl From<bool> for Operand {
    fn from(b: bool) -> Self {
        Operand::Bool(b)
    }
}

/// Bytecode instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: OpCode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operands: Vec<Operand>,
}

impl Instruction {
    /// Create an instruction with no operand
    pub fn new(opcode: OpCode) -> Self {
        Instruction {
            opcode,
            operands: Vec::new(),
        }
    }

    /// Create an instruction with a single operand
    pub fn with_operand(opcode: OpCode, operand: impl Into<Operand>) -> Self {
        Instruction {
            opcode,
            operands: vec![operand.into()],
        }
    }

    /// Create an instruction with two operands
    pub fn with_operands(opcode: OpCode, a: impl Into<Operand>, b: impl Into<Operand>) -> Self {
        Instruction {
            opcode,
            operands: vec![a.into(), b.into()],
        }
    }

    /// Check the operands against the shape the opcode requires
    pub fn validate(&self) -> DreResult<()> {
        let expected = self.opcode.operand_kinds();
        let matches = expected.len() == self.operands.len()
            && expected.iter().zip(&self.operands).all(|(k, o)| *k == o.kind());
        if matches {
            Ok(())
        } else {
            Err(DreError::MalformedProgram(format!(
                "{:?} expects operands {:?}, found {:?}",
                self.opcode, expected, self.operands
            )))
        }
    }

    pub fn string_operand(&self, index: usize) -> DreResult<&str> {
        match self.operands.get(index) {
            Some(Operand::String(s)) => Ok(s),
            _ => Err(self.operand_error(index)),
        }
    }

    pub fn number_operand(&self, index: usize) -> DreResult<f64> {
        match self.operands.get(index) {
            Some(Operand::Number(n)) => Ok(*n),
            _ => Err(self.operand_error(index)),
        }
    }

    pub fn bool_operand(&self, index: usize) -> DreResult<bool> {
        match self.operands.get(index) {
            Some(Operand::Bool(b)) => Ok(*b),
            _ => Err(self.operand_error(index)),
        }
    }

    fn operand_error(&self, index: usize) -> DreError {
        DreError::MalformedProgram(format!("{:?} has no valid operand {}", self.opcode, index))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.opcode)?;
        for operand in &self.operands {
            write!(f, " {}", operand)?;
        }
        Ok(())
    }
}
