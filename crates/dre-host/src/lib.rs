//! Host crate: drives a dialogue run to completion for the embedding application
//!
//! The host supplies a [`DialogueHandler`] that presents lines and commands and
//! picks options. [`drive`] does the pull loop and the option handoff; it makes
//! no presentation decisions of its own.

pub use dre_core::{DialogueRuntime, DreError, DreResult, ExecutionResult};

use dre_core::{Program, ProgramBuilder};
use tracing::{debug, warn};

/// Callbacks invoked for each result of a run
pub trait DialogueHandler {
    fn on_line(&mut self, text: &str);

    /// Return the index of the chosen option
    fn on_options(&mut self, options: &[String]) -> usize;

    fn on_command(&mut self, text: &str);

    fn on_node_complete(&mut self, next_node: Option<&str>) {
        let _ = next_node;
    }
}

/// Counts of what a driven run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub lines: usize,
    pub commands: usize,
    pub option_sets: usize,
    pub nodes_completed: usize,
}

/// Run `runtime` from `start` until the sequence ends, feeding every result
/// to `handler`. Stops at the first execution error.
pub fn drive<H>(
    runtime: &mut DialogueRuntime,
    start: Option<&str>,
    handler: &mut H,
) -> DreResult<RunSummary>
where
    H: DialogueHandler + ?Sized,
{
    let mut summary = RunSummary::default();
    for result in runtime.run(start)? {
        match result? {
            ExecutionResult::Line { text } => {
                summary.lines += 1;
                handler.on_line(&text);
            }
            ExecutionResult::Command { text } => {
                summary.commands += 1;
                handler.on_command(&text);
            }
            ExecutionResult::Options { options, choose } => {
                summary.option_sets += 1;
                let index = handler.on_options(&options);
                debug!(index, count = options.len(), "option chosen");
                if let Err(err) = choose.choose(index) {
                    warn!(index, count = options.len(), "handler chose an invalid option");
                    return Err(err);
                }
            }
            ExecutionResult::NodeComplete { next_node } => {
                summary.nodes_completed += 1;
                handler.on_node_complete(next_node.as_deref());
            }
        }
    }

    debug!(?summary, "run finished");
    Ok(summary)
}

/// Small demonstration program: a greeting, a three-way choice and a farewell node
pub fn sample_program() -> DreResult<Program> {
    ProgramBuilder::new("sample")
        .string("line:greet", "Welcome, traveller.")
        .string("line:ask", "Where are you headed?")
        .string("opt:north", "North, to the mountains")
        .string("opt:south", "South, to the coast")
        .string("opt:stay", "Nowhere, I'll stay")
        .string("line:north", "Bring a warm coat.")
        .string("line:south", "Mind the tides.")
        .string("line:stay", "Then sit by the fire.")
        .string("line:again", "Back again already?")
        .string("line:bye", "Safe travels.")
        .node("Start", |n| {
            n.tag("intro")
                .source("Welcome, traveller.\nWhere are you headed?")
                // Returning visitors get a different greeting
                .push_string("Farewell")
                .push_number(1.0)
                .call("visited")
                .jump_if_false("first")
                .line("line:again")
                .label("first")
                .line("line:greet")
                .line("line:ask")
                .option("opt:north", "north")
                .option("opt:south", "south")
                .option("opt:stay", "stay")
                .show_options()
                .jump()
                .label("north")
                .line("line:north")
                .push_string("north")
                .store_variable("$destination")
                .jump_to("leave")
                .label("south")
                .line("line:south")
                .push_string("south")
                .store_variable("$destination")
                .jump_to("leave")
                .label("stay")
                .line("line:stay")
                .command("sit fire")
                .stop()
                .label("leave")
                .run_node("Farewell")
        })
        .node("Farewell", |n| {
            n.tag("outro")
                .line("line:bye")
                .command("wave")
                .stop()
        })
        .build()
}
