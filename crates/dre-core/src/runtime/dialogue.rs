//! Dialogue runtime
//!
//! Top-level entry point for hosts: load a program, run a node, pull results.

use std::sync::Arc;

use indexmap::IndexMap;

use super::logging::{LogHandler, Logger};
use super::run::Run;
use super::visits::{self, VisitCounter};
use crate::analysis::AnalysisContext;
use crate::bytecode::disasm;
use crate::bytecode::{Program, StringInfo};
use crate::config::RuntimeConfig;
use crate::error::{DreError, DreResult};
use crate::library::Library;
use crate::loader::ProgramLoader;
use crate::storage::VariableStorage;
use crate::vm::{Machine, StopHandle};

/// Resumable execution coordinator for compiled dialogue programs
pub struct DialogueRuntime {
    config: RuntimeConfig,
    pub(crate) storage: Box<dyn VariableStorage>,
    pub(crate) library: Library,
    pub(crate) visits: VisitCounter,
    pub(crate) logger: Logger,
    pub(crate) current_node: Option<String>,
    program: Option<Arc<Program>>,
    stop_handle: StopHandle,
}

impl DialogueRuntime {
    pub fn new(storage: impl VariableStorage + 'static) -> Self {
        Self::with_config(storage, RuntimeConfig::default())
    }

    pub fn with_config(storage: impl VariableStorage + 'static, config: RuntimeConfig) -> Self {
        let mut library = Library::new();
        visits::install(&mut library);
        DialogueRuntime {
            config,
            storage: Box::new(storage),
            library,
            visits: VisitCounter::new(),
            logger: Logger::default(),
            current_node: None,
            program: None,
            stop_handle: StopHandle::new(),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn set_debug_handler<F>(&mut self, handler: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.logger.set_debug_handler(Arc::new(handler) as LogHandler);
    }

    pub fn set_error_handler<F>(&mut self, handler: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.logger.set_error_handler(Arc::new(handler) as LogHandler);
    }

    /// Route both log handlers to `tracing`
    pub fn use_tracing_handlers(&mut self) {
        self.logger = Logger::tracing();
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut Library {
        &mut self.library
    }

    pub fn variable_storage(&self) -> &dyn VariableStorage {
        self.storage.as_ref()
    }

    pub fn variable_storage_mut(&mut self) -> &mut dyn VariableStorage {
        self.storage.as_mut()
    }

    /// Replace the active program
    pub fn load_program(&mut self, program: impl Into<Arc<Program>>) {
        let program = program.into();
        self.logger.debug(&format!(
            "Loaded program '{}' with {} nodes",
            program.name,
            program.nodes.len()
        ));
        self.program = Some(program);
    }

    /// Decode a binary program and make it active
    pub fn load_program_bytes(&mut self, bytes: &[u8]) -> DreResult<()> {
        let program = ProgramLoader::load(bytes)?;
        self.load_program(program);
        Ok(())
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_deref()
    }

    /// Merge string table entries into the active program. Later entries
    /// overwrite matching ids.
    pub fn add_string_table<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, StringInfo)>,
    {
        match self.program.as_mut() {
            Some(program) => Arc::make_mut(program).merge_strings(entries),
            None => self.logger.error("Cannot add strings: no program loaded"),
        }
    }

    /// Start executing at `start_node`, or at the configured default node.
    ///
    /// Fails only when a log handler is missing. A missing program, an empty
    /// program or an unknown node is logged and yields an empty run.
    pub fn run(&mut self, start_node: Option<&str>) -> DreResult<Run<'_>> {
        if !self.logger.has_debug_handler() {
            return Err(DreError::MissingLogHandler("debug"));
        }
        if !self.logger.has_error_handler() {
            return Err(DreError::MissingLogHandler("error"));
        }

        let start = start_node
            .unwrap_or(&self.config.default_start_node)
            .to_string();
        let machine = self.prepare_machine(&start);
        Ok(Run::new(self, machine))
    }

    fn prepare_machine(&mut self, start: &str) -> Option<Machine> {
        let Some(program) = self.program.clone() else {
            self.logger.error("Cannot run: no program loaded");
            return None;
        };
        if program.nodes.is_empty() {
            self.logger.error("Cannot run: the program has no nodes");
            return None;
        }

        self.stop_handle.reset();
        let mut machine = Machine::new(program, &self.config, self.stop_handle.clone());
        if !machine.set_node(start) {
            self.logger.error(&format!("No node named '{}'", start));
            return None;
        }
        self.logger.debug(&format!("Running node {}", start));
        Some(machine)
    }

    /// Request a stop of the active run, honored at the next step boundary.
    /// Harmless when nothing is running.
    pub fn stop(&self) {
        self.stop_handle.stop();
    }

    /// Handle other threads can use to stop a run
    pub fn stop_handle(&self) -> StopHandle {
        self.stop_handle.clone()
    }

    /// Node currently executing, if a run is active
    pub fn current_node_name(&self) -> Option<&str> {
        self.current_node.as_deref()
    }

    /// The loaded program, logging if there is none or it is empty
    fn checked_program(&self) -> Option<&Program> {
        match self.program.as_deref() {
            None => {
                self.logger.error("No program loaded");
                None
            }
            Some(program) if program.nodes.is_empty() => {
                self.logger.error("No nodes are loaded");
                None
            }
            Some(program) => Some(program),
        }
    }

    pub fn node_exists(&self, name: &str) -> bool {
        self.checked_program()
            .map_or(false, |p| p.node(name).is_some())
    }

    pub fn all_node_names(&self) -> Vec<String> {
        self.program
            .as_deref()
            .map(|p| p.node_names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Raw source of a node, when it was preserved at compile time
    pub fn text_for_node(&self, name: &str) -> Option<String> {
        let program = self.checked_program()?;
        let Some(node) = program.node(name) else {
            self.logger.error(&format!("No node named '{}'", name));
            return None;
        };
        let Some(id) = node.source_text_string_id.as_deref() else {
            self.logger.debug(&format!("Node '{}' has no preserved source text", name));
            return None;
        };
        program.string_text(id).map(str::to_string)
    }

    pub fn tags_for_node(&self, name: &str) -> Option<Vec<String>> {
        let program = self.checked_program()?;
        match program.node(name) {
            Some(node) => Some(node.tags.clone()),
            None => {
                self.logger.error(&format!("No node named '{}'", name));
                None
            }
        }
    }

    /// Source text of every node that preserved it
    pub fn text_for_all_nodes(&self) -> IndexMap<String, String> {
        let Some(program) = self.checked_program() else {
            return IndexMap::new();
        };
        program
            .nodes
            .values()
            .filter_map(|node| {
                let id = node.source_text_string_id.as_deref()?;
                let text = program.string_text(id)?;
                Some((node.name.clone(), text.to_string()))
            })
            .collect()
    }

    pub fn tags_for_all_nodes(&self) -> IndexMap<String, Vec<String>> {
        let Some(program) = self.checked_program() else {
            return IndexMap::new();
        };
        program
            .nodes
            .values()
            .map(|node| (node.name.clone(), node.tags.clone()))
            .collect()
    }

    pub fn visit_counts(&self) -> &VisitCounter {
        &self.visits
    }

    pub fn visited_node_names(&self) -> Vec<String> {
        self.visits.node_names().map(str::to_string).collect()
    }

    /// Restore visitation state; each listed node counts as visited once
    pub fn set_visited_node_names<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.visits.replace_with(names);
    }

    pub fn string_table(&self) -> Option<&IndexMap<String, StringInfo>> {
        self.program.as_deref().map(|p| &p.strings)
    }

    /// Drop the program, and optionally the visit counts. Variables and
    /// registered functions are kept.
    pub fn unload_all(&mut self, clear_visits: bool) {
        self.program = None;
        if clear_visits {
            self.visits.clear();
        }
    }

    /// Disassembly of the loaded program, for diagnostics
    pub fn byte_code_dump(&self) -> String {
        match self.program.as_deref() {
            Some(program) => disasm::disassemble(program, &self.library),
            None => {
                self.logger.error("No program loaded");
                String::new()
            }
        }
    }

    /// Feed the loaded program to a static analysis pass
    pub fn analyze(&self, context: &mut AnalysisContext) {
        match self.program.as_deref() {
            Some(program) => context.add_program(program),
            None => self.logger.error("No program loaded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::ProgramBuilder;
    use crate::runtime::ExecutionResult;
    use crate::storage::MemoryVariableStorage;
    use std::sync::Mutex;

    fn runtime_with_log() -> (DialogueRuntime, Arc<Mutex<Vec<String>>>) {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        let mut runtime = DialogueRuntime::new(MemoryVariableStorage::new());
        runtime.set_debug_handler(|_| {});
        runtime.set_error_handler(move |m| sink.lock().unwrap().push(m.to_string()));
        (runtime, errors)
    }

    #[test]
    fn run_requires_both_handlers() {
        let mut runtime = DialogueRuntime::new(MemoryVariableStorage::new());
        assert!(matches!(runtime.run(None), Err(DreError::MissingLogHandler("debug"))));
        runtime.set_debug_handler(|_| {});
        assert!(matches!(runtime.run(None), Err(DreError::MissingLogHandler("error"))));
        runtime.set_error_handler(|_| {});
        assert!(runtime.run(None).is_ok());
    }

    #[test]
    fn run_without_program_is_logged_and_empty() {
        let (mut runtime, errors) = runtime_with_log();
        assert_eq!(runtime.run(None).unwrap().count(), 0);
        assert_eq!(errors.lock().unwrap().len(), 1);
    }

    #[test]
    fn run_with_empty_program_is_logged_and_empty() {
        let (mut runtime, errors) = runtime_with_log();
        runtime.load_program(Program::new("empty"));
        assert_eq!(runtime.run(None).unwrap().count(), 0);
        assert!(errors.lock().unwrap()[0].contains("no nodes"));
    }

    #[test]
    fn unknown_start_node_is_empty() {
        let (mut runtime, errors) = runtime_with_log();
        runtime.load_program(ProgramBuilder::new("p").node("Start", |n| n.stop()).build().unwrap());
        assert_eq!(runtime.run(Some("Elsewhere")).unwrap().count(), 0);
        assert!(errors.lock().unwrap()[0].contains("Elsewhere"));
        assert!(runtime.visit_counts().is_empty());
    }

    #[test]
    fn introspection_without_program_logs() {
        let (runtime, errors) = runtime_with_log();
        assert!(!runtime.node_exists("Start"));
        assert_eq!(runtime.tags_for_node("Start"), None);
        assert!(runtime.text_for_all_nodes().is_empty());
        assert_eq!(runtime.byte_code_dump(), "");
        assert!(runtime.all_node_names().is_empty());
        assert_eq!(errors.lock().unwrap().len(), 4);
    }

    #[test]
    fn current_node_tracks_the_run() {
        let (mut runtime, _) = runtime_with_log();
        runtime.load_program(
            ProgramBuilder::new("p")
                .string("l", "hi")
                .node("Start", |n| n.line("l").stop())
                .build()
                .unwrap(),
        );
        assert_eq!(runtime.current_node_name(), None);
        {
            let mut run = runtime.run(None).unwrap();
            assert_eq!(run.runtime().current_node_name(), Some("Start"));
            assert!(matches!(run.next(), Some(Ok(ExecutionResult::Line { .. }))));
            assert_eq!(run.current_node_name(), Some("Start"));
            assert!(matches!(
                run.next(),
                Some(Ok(ExecutionResult::NodeComplete { next_node: None }))
            ));
            assert_eq!(run.runtime().current_node_name(), None);
            assert!(run.next().is_none());
        }
        assert_eq!(runtime.current_node_name(), None);
    }

    #[test]
    fn unload_keeps_functions_and_optionally_visits() {
        let (mut runtime, _) = runtime_with_log();
        runtime.load_program(ProgramBuilder::new("p").node("Start", |n| n.stop()).build().unwrap());
        runtime.run(None).unwrap().for_each(drop);
        runtime.unload_all(false);
        assert!(runtime.program().is_none());
        assert_eq!(runtime.visit_counts().count("Start"), 1);
        runtime.unload_all(true);
        assert!(runtime.visit_counts().is_empty());
        assert!(runtime.library().contains("visitCount"));
    }

    #[test]
    fn add_string_table_merges_into_program() {
        let (mut runtime, errors) = runtime_with_log();
        runtime.add_string_table(vec![("x".to_string(), StringInfo::new("lost"))]);
        assert_eq!(errors.lock().unwrap().len(), 1);

        runtime.load_program(
            ProgramBuilder::new("p")
                .string("greet", "Hello")
                .node("Start", |n| n.line("greet"))
                .build()
                .unwrap(),
        );
        runtime.add_string_table(vec![("greet".to_string(), StringInfo::new("Bonjour"))]);
        let table = runtime.string_table().unwrap();
        assert_eq!(table["greet"].text, "Bonjour");
        let mut run = runtime.run(None).unwrap();
        match run.next() {
            Some(Ok(ExecutionResult::Line { text })) => assert_eq!(text, "Bonjour"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
