//! Program Loader
//!
//! Loads and validates compiled dialogue programs.
//! This layer performs structural validation only.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use super::{BYTECODE_MAGIC, MIN_FILE_SIZE, TAG_BOOL, TAG_NUMBER, TAG_STRING, VERSION_MAJOR};
use crate::bytecode::{Instruction, Node, OpCode, Operand, Program, StringInfo};
use crate::error::{DreError, DreResult};

/// Program loader
pub struct ProgramLoader;

impl ProgramLoader {
    /// Load a program from its binary encoding
    pub fn load(bytes: &[u8]) -> DreResult<Program> {
        if bytes.len() < MIN_FILE_SIZE {
            return Err(DreError::ProgramTooShort);
        }

        let mut cursor = 0;

        // Magic
        let magic = Self::read_u32(bytes, &mut cursor)?;
        if magic != BYTECODE_MAGIC {
            return Err(DreError::InvalidMagicNumber);
        }

        // Version
        let major = Self::read_u8(bytes, &mut cursor)?;
        let _minor = Self::read_u8(bytes, &mut cursor)?;
        let _patch = Self::read_u8(bytes, &mut cursor)?;

        if major != VERSION_MAJOR {
            return Err(DreError::InvalidProgramVersion(major));
        }

        // Reserved
        Self::read_u8(bytes, &mut cursor)?;

        let name = Self::read_string(bytes, &mut cursor)?;

        // String table
        let string_count = Self::read_u32(bytes, &mut cursor)? as usize;
        let mut strings = IndexMap::new();
        for _ in 0..string_count {
            let id = Self::read_string(bytes, &mut cursor)?;
            let text = Self::read_string(bytes, &mut cursor)?;
            let comment = Self::read_optional_string(bytes, &mut cursor)?;
            strings.insert(id, StringInfo { text, comment });
        }

        // Nodes
        let node_count = Self::read_u32(bytes, &mut cursor)? as usize;
        let mut nodes = IndexMap::new();
        for _ in 0..node_count {
            let node = Self::read_node(bytes, &mut cursor)?;
            if nodes.contains_key(&node.name) {
                return Err(DreError::MalformedProgram(format!("duplicate node '{}'", node.name)));
            }
            nodes.insert(node.name.clone(), node);
        }

        if cursor != bytes.len() {
            return Err(DreError::MalformedProgram(format!(
                "{} trailing bytes",
                bytes.len() - cursor
            )));
        }

        let program = Program { name, nodes, strings };
        program.validate()?;
        Ok(program)
    }

    /// Load a program from its JSON form
    pub fn load_json(text: &str) -> DreResult<Program> {
        let program: Program = serde_json::from_str(text)?;
        program.validate()?;
        Ok(program)
    }

    /// Load a program file; `.json` files are read as JSON, anything else as binary
    pub fn load_file(path: &Path) -> DreResult<Program> {
        let is_json = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::load_json(&fs::read_to_string(path)?)
        } else {
            Self::load(&fs::read(path)?)
        }
    }

    fn read_node(bytes: &[u8], cursor: &mut usize) -> DreResult<Node> {
        let mut node = Node::new(Self::read_string(bytes, cursor)?);

        let tag_count = Self::read_u32(bytes, cursor)?;
        for _ in 0..tag_count {
            node.tags.push(Self::read_string(bytes, cursor)?);
        }

        node.source_text_string_id = Self::read_optional_string(bytes, cursor)?;

        let label_count = Self::read_u32(bytes, cursor)?;
        for _ in 0..label_count {
            let label = Self::read_string(bytes, cursor)?;
            let target = Self::read_u32(bytes, cursor)? as usize;
            node.labels.insert(label, target);
        }

        let instruction_count = Self::read_u32(bytes, cursor)?;
        for _ in 0..instruction_count {
            node.instructions.push(Self::read_instruction(bytes, cursor)?);
        }
        Ok(node)
    }

    fn read_instruction(bytes: &[u8], cursor: &mut usize) -> DreResult<Instruction> {
        let byte = Self::read_u8(bytes, cursor)?;
        let opcode = OpCode::from_u8(byte).ok_or(DreError::InvalidOpcode(byte))?;
        let operand_count = Self::read_u8(bytes, cursor)?;
        let mut instruction = Instruction::new(opcode);
        for _ in 0..operand_count {
            instruction.operands.push(Self::read_operand(bytes, cursor)?);
        }
        Ok(instruction)
    }

    /// Read a tagged operand
    fn read_operand(bytes: &[u8], cursor: &mut usize) -> DreResult<Operand> {
        let tag = Self::read_u8(bytes, cursor)?;

        match tag {
            TAG_STRING => Ok(Operand::String(Self::read_string(bytes, cursor)?)),
            TAG_NUMBER => Ok(Operand::Number(Self::read_f64(bytes, cursor)?)),
            TAG_BOOL => {
                let b = Self::read_u8(bytes, cursor)?;
                Ok(Operand::Bool(b != 0))
            }
            other => Err(DreError::MalformedProgram(format!(
                "unknown operand tag 0x{:02X}",
                other
            ))),
        }
    }

    fn read_u8(bytes: &[u8], cursor: &mut usize) -> DreResult<u8> {
        let v = *bytes.get(*cursor).ok_or(DreError::ProgramTooShort)?;
        *cursor += 1;
        Ok(v)
    }

    fn read_u32(bytes: &[u8], cursor: &mut usize) -> DreResult<u32> {
        let raw = Self::read_array::<4>(bytes, cursor)?;
        Ok(u32::from_be_bytes(raw))
    }

    fn read_f64(bytes: &[u8], cursor: &mut usize) -> DreResult<f64> {
        let raw = Self::read_array::<8>(bytes, cursor)?;
        Ok(f64::from_be_bytes(raw))
    }

    fn read_array<const N: usize>(bytes: &[u8], cursor: &mut usize) -> DreResult<[u8; N]> {
        let end = cursor.checked_add(N).ok_or(DreError::ProgramTooShort)?;
        let slice = bytes.get(*cursor..end).ok_or(DreError::ProgramTooShort)?;
        let mut raw = [0u8; N];
        raw.copy_from_slice(slice);
        *cursor = end;
        Ok(raw)
    }

    fn read_string(bytes: &[u8], cursor: &mut usize) -> DreResult<String> {
        let len = Self::read_u32(bytes, cursor)? as usize;
        let end = cursor.checked_add(len).ok_or(DreError::ProgramTooShort)?;
        let slice = bytes.get(*cursor..end).ok_or(DreError::ProgramTooShort)?;
        let s = std::str::from_utf8(slice)
            .map_err(|e| DreError::MalformedProgram(format!("invalid utf-8: {}", e)))?;
        *cursor = end;
        Ok(s.to_string())
    }

    fn read_optional_string(bytes: &[u8], cursor: &mut usize) -> DreResult<Option<String>> {
        match Self::read_u8(bytes, cursor)? {
            0 => Ok(None),
            1 => Ok(Some(Self::read_string(bytes, cursor)?)),
            other => Err(DreError::MalformedProgram(format!("invalid presence flag {}", other))),
        }
    }
}
