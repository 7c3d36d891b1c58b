//! Bytecode Opcode Definitions
//!
//! Defines the raw opcode set for dialogue programs.
//! This file contains no execution semantics.
//! Opcode values are part of the binary program format.

use serde::{Deserialize, Serialize};

/// Shape of a single operand slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    String,
    Number,
    Bool,
}

/// Bytecode opcodes (v1)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpCode {
    // Control flow
    JumpTo      = 0x01,
    Jump        = 0x02,
    JumpIfFalse = 0x03,

    // Presentation
    RunLine     = 0x10,
    RunCommand  = 0x11,
    AddOption   = 0x12,
    ShowOptions = 0x13,

    // Stack operations
    PushString = 0x20,
    PushNumber = 0x21,
    PushBool   = 0x22,
    PushNull   = 0x23,
    Pop        = 0x24,

    // Functions
    CallFunc = 0x30,

    // Variables
    PushVariable  = 0x40,
    StoreVariable = 0x41,

    // Node transitions
    RunNode = 0xF0,
    Stop    = 0xFF,
}

impl OpCode {
    pub const ALL: [OpCode; 17] = [
        OpCode::JumpTo,
        OpCode::Jump,
        OpCode::JumpIfFalse,
        OpCode::RunLine,
        OpCode::RunCommand,
        OpCode::AddOption,
        OpCode::ShowOptions,
        OpCode::PushString,
        OpCode::PushNumber,
        OpCode::PushBool,
        OpCode::PushNull,
        OpCode::Pop,
        OpCode::CallFunc,
        OpCode::PushVariable,
        OpCode::StoreVariable,
        OpCode::RunNode,
        OpCode::Stop,
    ];

    /// Convert raw byte to opcode
    pub fn from_u8(byte: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| *op as u8 == byte)
    }

    /// Operands every instruction with this opcode carries, in order
    pub fn operand_kinds(self) -> &'static [OperandKind] {
        use OperandKind::*;
        match self {
            OpCode::JumpTo | OpCode::JumpIfFalse => &[String],
            OpCode::RunLine | OpCode::RunCommand => &[String],
            OpCode::AddOption => &[String, String],
            OpCode::PushString => &[String],
            OpCode::PushNumber => &[Number],
            OpCode::PushBool => &[Bool],
            OpCode::CallFunc => &[String],
            OpCode::PushVariable | OpCode::StoreVariable => &[String],
            OpCode::Jump
            | OpCode::ShowOptions
            | OpCode::PushNull
            | OpCode::Pop
            | OpCode::RunNode
            | OpCode::Stop => &[],
        }
    }
}
