//! Compiled Program Model
//!
//! A program is an immutable set of named nodes plus the string table their
//! lines and options refer to. Programs come from the loader or from
//! [`ProgramBuilder`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::instruction::Instruction;
use super::opcode::OpCode;
use crate::error::{DreError, DreResult};

/// A string table entry: display text plus an optional translator comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringInfo {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl StringInfo {
    pub fn new(text: impl Into<String>) -> Self {
        StringInfo {
            text: text.into(),
            comment: None,
        }
    }

    pub fn with_comment(text: impl Into<String>, comment: impl Into<String>) -> Self {
        StringInfo {
            text: text.into(),
            comment: Some(comment.into()),
        }
    }
}

/// A single addressable unit of dialogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub instructions: Vec<Instruction>,
    /// Label name -> instruction index
    #[serde(default)]
    pub labels: IndexMap<String, usize>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// String table id of the node's raw source, when it was preserved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text_string_id: Option<String>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            instructions: Vec::new(),
            labels: IndexMap::new(),
            tags: Vec::new(),
            source_text_string_id: None,
        }
    }

    pub fn label_target(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }

    /// Structural checks: operand shapes, label targets, and labels
    /// referenced by jumps and options
    pub fn validate(&self) -> DreResult<()> {
        for (label, &target) in &self.labels {
            if target > self.instructions.len() {
                return Err(DreError::MalformedProgram(format!(
                    "label '{}' in node '{}' points past the end",
                    label, self.name
                )));
            }
        }
        for instruction in &self.instructions {
            instruction.validate()?;
            let label = match instruction.opcode {
                OpCode::JumpTo | OpCode::JumpIfFalse => Some(instruction.string_operand(0)?),
                OpCode::AddOption => Some(instruction.string_operand(1)?),
                _ => None,
            };
            if let Some(label) = label {
                if !self.labels.contains_key(label) {
                    return Err(DreError::UnknownLabel {
                        node: self.name.clone(),
                        label: label.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Compiled dialogue program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    #[serde(default)]
    pub nodes: IndexMap<String, Node>,
    #[serde(default)]
    pub strings: IndexMap<String, StringInfo>,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Program {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Text of a string table entry
    pub fn string_text(&self, id: &str) -> Option<&str> {
        self.strings.get(id).map(|s| s.text.as_str())
    }

    pub fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.name.clone(), node);
    }

    /// Merge string table entries. Later entries overwrite matching ids.
    pub fn merge_strings<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, StringInfo)>,
    {
        self.strings.extend(entries);
    }

    /// Pretty-printed JSON form, readable by `ProgramLoader::load_json`
    pub fn to_json(&self) -> DreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate every node
    pub fn validate(&self) -> DreResult<()> {
        for (key, node) in &self.nodes {
            if *key != node.name {
                return Err(DreError::MalformedProgram(format!(
                    "node stored under '{}' is named '{}'",
                    key, node.name
                )));
            }
            node.validate()?;
        }
        Ok(())
    }
}

/// Fluent construction of programs for hosts and tests
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        ProgramBuilder {
            program: Program::new(name),
        }
    }

    pub fn string(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.program.strings.insert(id.into(), StringInfo::new(text));
        self
    }

    pub fn node<F>(mut self, name: &str, build: F) -> Self
    where
        F: FnOnce(NodeBuilder) -> NodeBuilder,
    {
        let builder = build(NodeBuilder::new(name));
        if let Some(source) = builder.source {
            let id = format!("source:{}", name);
            self.program.strings.insert(id.clone(), StringInfo::new(source));
            let mut node = builder.node;
            node.source_text_string_id = Some(id);
            self.program.insert_node(node);
        } else {
            self.program.insert_node(builder.node);
        }
        self
    }

    pub fn build(self) -> DreResult<Program> {
        self.program.validate()?;
        Ok(self.program)
    }
}

/// Builds the instruction list of one node
#[derive(Debug)]
pub struct NodeBuilder {
    node: Node,
    source: Option<String>,
}

impl NodeBuilder {
    fn new(name: &str) -> Self {
        NodeBuilder {
            node: Node::new(name),
            source: None,
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.node.tags.push(tag.into());
        self
    }

    /// Preserve the node's raw source text in the string table
    pub fn source(mut self, text: impl Into<String>) -> Self {
        self.source = Some(text.into());
        self
    }

    /// Mark the position of the next instruction
    pub fn label(mut self, name: impl Into<String>) -> Self {
        let at = self.node.instructions.len();
        self.node.labels.insert(name.into(), at);
        self
    }

    pub fn instruction(mut self, instruction: Instruction) -> Self {
        self.node.instructions.push(instruction);
        self
    }

    pub fn line(self, string_id: &str) -> Self {
        self.instruction(Instruction::with_operand(OpCode::RunLine, string_id))
    }

    pub fn command(self, text: &str) -> Self {
        self.instruction(Instruction::with_operand(OpCode::RunCommand, text))
    }

    pub fn option(self, string_id: &str, label: &str) -> Self {
        self.instruction(Instruction::with_operands(OpCode::AddOption, string_id, label))
    }

    pub fn show_options(self) -> Self {
        self.instruction(Instruction::new(OpCode::ShowOptions))
    }

    pub fn push_string(self, s: &str) -> Self {
        self.instruction(Instruction::with_operand(OpCode::PushString, s))
    }

    pub fn push_number(self, n: f64) -> Self {
        self.instruction(Instruction::with_operand(OpCode::PushNumber, n))
    }

    pub fn push_bool(self, b: bool) -> Self {
        self.instruction(Instruction::with_operand(OpCode::PushBool, b))
    }

    pub fn push_null(self) -> Self {
        self.instruction(Instruction::new(OpCode::PushNull))
    }

    pub fn pop(self) -> Self {
        self.instruction(Instruction::new(OpCode::Pop))
    }

    pub fn jump_to(self, label: &str) -> Self {
        self.instruction(Instruction::with_operand(OpCode::JumpTo, label))
    }

    /// Jump to the label on top of the stack
    pub fn jump(self) -> Self {
        self.instruction(Instruction::new(OpCode::Jump))
    }

    pub fn jump_if_false(self, label: &str) -> Self {
        self.instruction(Instruction::with_operand(OpCode::JumpIfFalse, label))
    }

    pub fn call(self, function: &str) -> Self {
        self.instruction(Instruction::with_operand(OpCode::CallFunc, function))
    }

    pub fn push_variable(self, name: &str) -> Self {
        self.instruction(Instruction::with_operand(OpCode::PushVariable, name))
    }

    pub fn store_variable(self, name: &str) -> Self {
        self.instruction(Instruction::with_operand(OpCode::StoreVariable, name))
    }

    /// Push `target` and finish this node, continuing in `target`
    pub fn run_node(self, target: &str) -> Self {
        self.push_string(target)
            .instruction(Instruction::new(OpCode::RunNode))
    }

    pub fn stop(self) -> Self {
        self.instruction(Instruction::new(OpCode::Stop))
    }
}
