pub mod disasm;
pub mod instruction;
pub mod opcode;
pub mod program;

pub use instruction::{Instruction, Operand};
pub use opcode::{OpCode, OperandKind};
pub use program::{Node, NodeBuilder, Program, ProgramBuilder, StringInfo};
