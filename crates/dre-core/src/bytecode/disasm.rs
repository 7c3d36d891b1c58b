//! Human-readable program listing. Diagnostics only; the format is not stable.

use std::fmt::Write;

use super::{OpCode, Program};
use crate::library::{Callable, Library};

/// Disassemble every node of `program`, resolving `CallFunc` targets
/// through `library`
pub fn disassemble(program: &Program, library: &Library) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(out, "program {}", program.name);

    for node in program.nodes.values() {
        let _ = writeln!(out);
        if node.tags.is_empty() {
            let _ = writeln!(out, "node {}:", node.name);
        } else {
            let _ = writeln!(out, "node {} [{}]:", node.name, node.tags.join(", "));
        }

        for (index, instruction) in node.instructions.iter().enumerate() {
            for (label, _) in node.labels.iter().filter(|(_, &at)| at == index) {
                let _ = writeln!(out, "  {}:", label);
            }

            let text = instruction.to_string();
            let note = match instruction.opcode {
                OpCode::RunLine | OpCode::AddOption => instruction
                    .string_operand(0)
                    .ok()
                    .and_then(|id| program.string_text(id))
                    .map(|t| format!("\"{}\"", t)),
                OpCode::CallFunc => instruction.string_operand(0).ok().map(|name| {
                    match library.lookup(name) {
                        Ok(Callable::Operator(op)) => {
                            format!("operator {} ({})", op.symbol(), op.arity())
                        }
                        Ok(Callable::Function(f)) => format!("function ({})", f.arity),
                        Err(_) => "unresolved".to_string(),
                    }
                }),
                _ => None,
            };
            match note {
                Some(note) => {
                    let _ = writeln!(out, "    {:04}  {:<32} ; {}", index, text, note);
                }
                None => {
                    let _ = writeln!(out, "    {:04}  {}", index, text);
                }
            }
        }

        // Labels that point one past the last instruction
        let end = node.instructions.len();
        for (label, _) in node.labels.iter().filter(|(_, &at)| at == end) {
            let _ = writeln!(out, "  {}:", label);
        }
    }
    out
}
