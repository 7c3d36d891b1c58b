//! Pull-based run iterator
//!
//! Each call to `next` steps the machine until one visible event appears or
//! the machine stops. Nothing executes between pulls.

use tracing::debug;

use super::dialogue::DialogueRuntime;
use super::result::{ExecutionResult, OptionSelector, STOP_COMMAND};
use crate::error::{DreError, DreResult};
use crate::vm::{ExecutionState, Machine, MachineEvent, StepContext};

/// A run in progress. Borrows the runtime mutably, so one run per runtime
/// at a time.
pub struct Run<'r> {
    runtime: &'r mut DialogueRuntime,
    machine: Option<Machine>,
    pending: Option<OptionSelector>,
}

impl<'r> Run<'r> {
    pub(crate) fn new(runtime: &'r mut DialogueRuntime, machine: Option<Machine>) -> Self {
        let mut run = Run {
            runtime,
            machine,
            pending: None,
        };
        run.sync_current_node();
        run
    }

    /// Read-only view of the runtime while the run is active
    pub fn runtime(&self) -> &DialogueRuntime {
        self.runtime
    }

    pub fn current_node_name(&self) -> Option<&str> {
        self.machine.as_ref().and_then(Machine::current_node_name)
    }

    /// Stop now; the next pull returns `None`
    pub fn stop(&mut self) {
        if let Some(machine) = self.machine.as_mut() {
            machine.stop();
        }
        self.sync_current_node();
    }

    pub fn is_finished(&self) -> bool {
        self.machine
            .as_ref()
            .map_or(true, |m| m.state() == ExecutionState::Stopped)
    }

    fn sync_current_node(&mut self) {
        self.runtime.current_node = self.current_node_name().map(str::to_string);
    }

    /// Hand a pending option choice to the machine
    fn resolve_selection(&mut self) -> DreResult<()> {
        let index = self
            .pending
            .as_ref()
            .and_then(OptionSelector::selection)
            .ok_or(DreError::OptionNotSelected)?;
        if let Some(machine) = self.machine.as_mut() {
            if let Err(err) = machine.select_option(index) {
                // The selection cannot be retried once it failed
                machine.stop();
                self.pending = None;
                self.sync_current_node();
                return Err(err);
            }
        }
        self.pending = None;
        Ok(())
    }

    fn step(&mut self) -> DreResult<Option<MachineEvent>> {
        let Some(machine) = self.machine.as_mut() else {
            return Ok(None);
        };
        let runtime = &mut *self.runtime;
        let mut ctx = StepContext {
            storage: runtime.storage.as_mut(),
            library: &runtime.library,
            visits: &runtime.visits,
            logger: &runtime.logger,
        };
        let result = machine.step_once(&mut ctx);
        let event = machine.drain_events().pop();
        if result.is_err() {
            machine.stop();
        }
        self.sync_current_node();
        result.map(|_| event)
    }

    fn surface(&mut self, event: MachineEvent) -> ExecutionResult {
        match event {
            MachineEvent::Line { text } => ExecutionResult::Line { text },
            MachineEvent::Command { text } => {
                if text == STOP_COMMAND {
                    self.stop();
                }
                ExecutionResult::Command { text }
            }
            MachineEvent::Options { options } => {
                let choose = OptionSelector::new(options.len());
                self.pending = Some(choose.clone());
                ExecutionResult::Options { options, choose }
            }
            MachineEvent::NodeComplete { node, next_node } => {
                let count = self.runtime.visits.record(&node);
                debug!(node = %node, visits = count, "node complete");
                self.runtime.logger.debug(&format!("Finished node {}", node));
                ExecutionResult::NodeComplete { next_node }
            }
        }
    }
}

impl Iterator for Run<'_> {
    type Item = DreResult<ExecutionResult>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let machine = self.machine.as_mut()?;
            // Stop requests win over a pending option selection
            if machine.stop_requested() && machine.state() != ExecutionState::Stopped {
                machine.stop();
                self.pending = None;
                self.sync_current_node();
                return None;
            }
            let state = machine.state();
            match state {
                ExecutionState::Stopped => return None,
                ExecutionState::WaitingOnOptionSelection => {
                    if let Err(err) = self.resolve_selection() {
                        return Some(Err(err));
                    }
                }
                ExecutionState::Suspended | ExecutionState::Running => {}
            }

            match self.step() {
                Ok(Some(event)) => return Some(Ok(self.surface(event))),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

impl Drop for Run<'_> {
    fn drop(&mut self) {
        self.runtime.current_node = None;
    }
}
