//! Program Writer
//!
//! Encodes programs into the binary form [`super::ProgramLoader`] reads.

use super::{BYTECODE_MAGIC, TAG_BOOL, TAG_NUMBER, TAG_STRING, VERSION_MAJOR};
use crate::bytecode::{Node, Operand, Program};

/// Binary program encoder
pub struct ProgramWriter;

impl ProgramWriter {
    pub fn encode(program: &Program) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend(BYTECODE_MAGIC.to_be_bytes());
        buf.extend([VERSION_MAJOR, 0, 0, 0]); // version + reserved

        Self::write_string(&mut buf, &program.name);

        Self::write_len(&mut buf, program.strings.len());
        for (id, info) in &program.strings {
            Self::write_string(&mut buf, id);
            Self::write_string(&mut buf, &info.text);
            Self::write_optional_string(&mut buf, info.comment.as_deref());
        }

        Self::write_len(&mut buf, program.nodes.len());
        for node in program.nodes.values() {
            Self::write_node(&mut buf, node);
        }
        buf
    }

    fn write_node(buf: &mut Vec<u8>, node: &Node) {
        Self::write_string(buf, &node.name);

        Self::write_len(buf, node.tags.len());
        for tag in &node.tags {
            Self::write_string(buf, tag);
        }

        Self::write_optional_string(buf, node.source_text_string_id.as_deref());

        Self::write_len(buf, node.labels.len());
        for (label, target) in &node.labels {
            Self::write_string(buf, label);
            Self::write_len(buf, *target);
        }

        Self::write_len(buf, node.instructions.len());
        for instruction in &node.instructions {
            buf.push(instruction.opcode as u8);
            buf.push(instruction.operands.len() as u8);
            for operand in &instruction.operands {
                match operand {
                    Operand::String(s) => {
                        buf.push(TAG_STRING);
                        Self::write_string(buf, s);
                    }
                    Operand::Number(n) => {
                        buf.push(TAG_NUMBER);
                        buf.extend(n.to_be_bytes());
                    }
                    Operand::Bool(b) => {
                        buf.push(TAG_BOOL);
                        buf.push(u8::from(*b));
                    }
                }
            }
        }
    }

    fn write_len(buf: &mut Vec<u8>, len: usize) {
        buf.extend((len as u32).to_be_bytes());
    }

    fn write_string(buf: &mut Vec<u8>, s: &str) {
        Self::write_len(buf, s.len());
        buf.extend(s.as_bytes());
    }

    fn write_optional_string(buf: &mut Vec<u8>, s: Option<&str>) {
        match s {
            Some(s) => {
                buf.push(1);
                Self::write_string(buf, s);
            }
            None => buf.push(0),
        }
    }
}
