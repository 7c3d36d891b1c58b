//! Static analysis over loaded programs
//!
//! Analysers observe every program fed to an [`AnalysisContext`] and report
//! [`Diagnosis`] entries once all programs have been seen. Nothing here
//! executes bytecode.

use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::bytecode::{Instruction, OpCode, Program};

/// How serious a diagnosis is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational, often intentional
    Note,
    /// Probably a mistake
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => f.write_str("note"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// A single analysis finding
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Diagnosis {
    pub severity: Severity,
    pub node_name: Option<String>,
    pub message: String,
}

impl Diagnosis {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            node_name: None,
            message: message.into(),
        }
    }

    pub fn in_node(mut self, node: impl Into<String>) -> Self {
        self.node_name = Some(node.into());
        self
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node_name {
            Some(node) => write!(f, "{} [{}]: {}", self.severity, node, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// A pass that accumulates facts across programs
pub trait Analyser {
    fn observe(&mut self, program: &Program);

    fn diagnose(&self) -> Vec<Diagnosis>;
}

/// Variable reads and writes, keyed by variable with the first node seen
#[derive(Debug, Default)]
struct VariableUse {
    stored: IndexMap<String, String>,
    read: IndexMap<String, String>,
}

impl VariableUse {
    fn observe(&mut self, program: &Program) {
        for node in program.nodes.values() {
            for instruction in &node.instructions {
                let slot = match instruction.opcode {
                    OpCode::StoreVariable => &mut self.stored,
                    OpCode::PushVariable => &mut self.read,
                    _ => continue,
                };
                if let Ok(name) = instruction.string_operand(0) {
                    slot.entry(name.to_string()).or_insert_with(|| node.name.clone());
                }
            }
        }
    }
}

/// Variables that are stored but never read
#[derive(Debug, Default)]
pub struct UnusedVariables {
    uses: VariableUse,
}

impl Analyser for UnusedVariables {
    fn observe(&mut self, program: &Program) {
        self.uses.observe(program);
    }

    fn diagnose(&self) -> Vec<Diagnosis> {
        self.uses
            .stored
            .iter()
            .filter(|(name, _)| !self.uses.read.contains_key(*name))
            .map(|(name, node)| {
                Diagnosis::new(
                    Severity::Warning,
                    format!("variable {} is assigned but never read", name),
                )
                .in_node(node.as_str())
            })
            .collect()
    }
}

/// Variables that are read but never stored by any program
///
/// Hosts may seed these into storage, so they are reported as notes.
#[derive(Debug, Default)]
pub struct UndefinedVariables {
    uses: VariableUse,
}

impl Analyser for UndefinedVariables {
    fn observe(&mut self, program: &Program) {
        self.uses.observe(program);
    }

    fn diagnose(&self) -> Vec<Diagnosis> {
        self.uses
            .read
            .iter()
            .filter(|(name, _)| !self.uses.stored.contains_key(*name))
            .map(|(name, node)| {
                Diagnosis::new(
                    Severity::Note,
                    format!("variable {} is read but never assigned", name),
                )
                .in_node(node.as_str())
            })
            .collect()
    }
}

/// Nodes that no `RunNode` names and that are not the start node
#[derive(Debug)]
pub struct UnreachableNodes {
    start_node: String,
    nodes: IndexSet<String>,
    targets: IndexSet<String>,
}

impl UnreachableNodes {
    pub fn new(start_node: impl Into<String>) -> Self {
        Self {
            start_node: start_node.into(),
            nodes: IndexSet::new(),
            targets: IndexSet::new(),
        }
    }

    /// Target of a `RunNode` whose name was pushed as a literal right before it
    fn literal_target<'p>(
        previous: Option<&'p Instruction>,
        current: &Instruction,
    ) -> Option<&'p str> {
        if current.opcode != OpCode::RunNode {
            return None;
        }
        match previous {
            Some(prev) if prev.opcode == OpCode::PushString => prev.string_operand(0).ok(),
            _ => None,
        }
    }
}

impl Analyser for UnreachableNodes {
    fn observe(&mut self, program: &Program) {
        for node in program.nodes.values() {
            self.nodes.insert(node.name.clone());
            let mut previous = None;
            for instruction in &node.instructions {
                if let Some(target) = Self::literal_target(previous, instruction) {
                    self.targets.insert(target.to_string());
                }
                previous = Some(instruction);
            }
        }
    }

    fn diagnose(&self) -> Vec<Diagnosis> {
        self.nodes
            .iter()
            .filter(|name| **name != self.start_node && !self.targets.contains(*name))
            .map(|name| {
                Diagnosis::new(Severity::Note, "node is never the target of a jump")
                    .in_node(name.as_str())
            })
            .collect()
    }
}

/// A set of analysers run over one or more programs
pub struct AnalysisContext {
    analysers: Vec<Box<dyn Analyser>>,
}

impl AnalysisContext {
    /// Context with the default analysers, treating `start_node` as reachable
    pub fn new(start_node: &str) -> Self {
        Self {
            analysers: vec![
                Box::new(UnusedVariables::default()),
                Box::new(UndefinedVariables::default()),
                Box::new(UnreachableNodes::new(start_node)),
            ],
        }
    }

    /// Context with no analysers
    pub fn empty() -> Self {
        Self { analysers: Vec::new() }
    }

    pub fn with_analyser(mut self, analyser: impl Analyser + 'static) -> Self {
        self.analysers.push(Box::new(analyser));
        self
    }

    pub fn add_program(&mut self, program: &Program) {
        for analyser in &mut self.analysers {
            analyser.observe(program);
        }
    }

    /// All diagnoses, ordered by severity, then node, then message
    pub fn finish(self) -> Vec<Diagnosis> {
        let mut diagnoses: Vec<Diagnosis> = self
            .analysers
            .iter()
            .flat_map(|analyser| analyser.diagnose())
            .collect();
        diagnoses.sort();
        diagnoses.dedup();
        diagnoses
    }
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_START_NODE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::ProgramBuilder;
    use pretty_assertions::assert_eq;

    fn program() -> Program {
        ProgramBuilder::new("analysis")
            .node("Start", |n| {
                n.push_number(1.0)
                    .store_variable("$gold")
                    .push_bool(true)
                    .store_variable("$met")
                    .push_variable("$met")
                    .pop()
                    .push_variable("$name")
                    .pop()
                    .run_node("Shop")
            })
            .node("Shop", |n| n.stop())
            .node("Orphan", |n| n.stop())
            .build()
            .unwrap()
    }

    #[test]
    fn default_analysers_report_findings() {
        let mut context = AnalysisContext::new("Start");
        context.add_program(&program());
        let rendered: Vec<String> = context.finish().iter().map(|d| d.to_string()).collect();

        assert_eq!(
            rendered,
            vec![
                "note [Orphan]: node is never the target of a jump".to_string(),
                "note [Start]: variable $name is read but never assigned".to_string(),
                "warning [Start]: variable $gold is assigned but never read".to_string(),
            ]
        );
    }

    #[test]
    fn facts_accumulate_across_programs() {
        let reader = ProgramBuilder::new("reader")
            .node("Later", |n| n.push_variable("$gold").pop().stop())
            .build()
            .unwrap();

        let mut context = AnalysisContext::empty().with_analyser(UnusedVariables::default());
        context.add_program(&program());
        context.add_program(&reader);
        assert!(context.finish().is_empty());
    }

    #[test]
    fn computed_jump_targets_are_not_counted() {
        let program = ProgramBuilder::new("p")
            .node("Start", |n| {
                n.push_variable("$next")
                    .instruction(Instruction::new(OpCode::RunNode))
            })
            .node("Maybe", |n| n.stop())
            .build()
            .unwrap();
        let mut analyser = UnreachableNodes::new("Start");
        analyser.observe(&program);
        let found = analyser.diagnose();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].node_name.as_deref(), Some("Maybe"));
    }
}
