//! Execution Machine
//!
//! Single-step interpreter bound to one program. Each call to
//! [`Machine::step_once`] executes one instruction; presentation instructions
//! record a [`MachineEvent`] the runtime drains afterwards.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::trace;

use crate::bytecode::{Instruction, OpCode, Program};
use crate::config::RuntimeConfig;
use crate::error::{DreError, DreResult};
use crate::library::{Arity, FunctionContext, Library};
use crate::runtime::{Logger, VisitCounter};
use crate::storage::VariableStorage;
use crate::value::Value;

use super::stack::Stack;

/// Machine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    /// Terminal; further steps are rejected
    Stopped,
    /// Options were shown; `select_option` must be called before stepping
    WaitingOnOptionSelection,
    /// Between steps
    Suspended,
    /// Inside `step_once`
    Running,
}

/// Client-visible events recorded by a step
#[derive(Debug, Clone, PartialEq)]
pub enum MachineEvent {
    Line { text: String },
    Command { text: String },
    Options { options: Vec<String> },
    /// `node` is the node that just finished
    NodeComplete { node: String, next_node: Option<String> },
}

/// Cross-thread stop request, honored at the next step boundary
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }
}

/// Runtime state lent to the machine for the duration of one step
pub struct StepContext<'a> {
    pub storage: &'a mut dyn VariableStorage,
    pub library: &'a Library,
    pub visits: &'a VisitCounter,
    pub logger: &'a Logger,
}

#[derive(Debug, Clone)]
struct PendingOption {
    text: String,
    destination: String,
}

/// Dialogue execution machine
#[derive(Debug)]
pub struct Machine {
    program: Arc<Program>,
    stack: Stack,
    current_node: Option<String>,
    pc: usize,
    options: Vec<PendingOption>,
    state: ExecutionState,
    events: Vec<MachineEvent>,
    stop_handle: StopHandle,
}

impl Machine {
    /// Create a stopped machine bound to `program`
    pub fn new(program: Arc<Program>, config: &RuntimeConfig, stop_handle: StopHandle) -> Self {
        Machine {
            program,
            stack: Stack::new(config.max_stack_size),
            current_node: None,
            pc: 0,
            options: Vec::new(),
            state: ExecutionState::Stopped,
            events: Vec::new(),
            stop_handle,
        }
    }

    /// Position the machine at the start of `name`. Returns false if the
    /// program has no such node.
    pub fn set_node(&mut self, name: &str) -> bool {
        if self.program.node(name).is_none() {
            return false;
        }
        self.current_node = Some(name.to_string());
        self.pc = 0;
        self.stack.clear();
        self.options.clear();
        self.state = ExecutionState::Suspended;
        true
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn current_node_name(&self) -> Option<&str> {
        self.current_node.as_deref()
    }

    /// Whether a stop was requested through the shared handle
    pub fn stop_requested(&self) -> bool {
        self.stop_handle.is_requested()
    }

    /// Halt immediately. Idempotent.
    pub fn stop(&mut self) {
        self.state = ExecutionState::Stopped;
        self.current_node = None;
        self.options.clear();
    }

    /// Take the events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<MachineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Resolve a pending option selection. The chosen option's destination
    /// label is pushed for the following `Jump`.
    pub fn select_option(&mut self, index: usize) -> DreResult<()> {
        if self.state != ExecutionState::WaitingOnOptionSelection {
            return Err(DreError::MachineNotRunning);
        }
        let count = self.options.len();
        let chosen = self
            .options
            .get(index)
            .cloned()
            .ok_or(DreError::InvalidOptionIndex { index, count })?;
        self.stack.push(Value::String(chosen.destination))?;
        self.options.clear();
        self.state = ExecutionState::Suspended;
        Ok(())
    }

    /// Execute a single instruction
    pub fn step_once(&mut self, ctx: &mut StepContext<'_>) -> DreResult<()> {
        if self.stop_handle.is_requested() {
            self.stop();
            return Ok(());
        }
        match self.state {
            ExecutionState::Stopped => return Err(DreError::MachineNotRunning),
            ExecutionState::WaitingOnOptionSelection => return Err(DreError::OptionNotSelected),
            ExecutionState::Suspended | ExecutionState::Running => {}
        }

        let program = Arc::clone(&self.program);
        let node_name = self.current_node.clone().ok_or(DreError::MachineNotRunning)?;
        let node = program
            .node(&node_name)
            .ok_or_else(|| DreError::UnknownNode(node_name.clone()))?;

        self.state = ExecutionState::Running;

        // Running off the end finishes the node
        let Some(instruction) = node.instructions.get(self.pc) else {
            self.finish_node(node_name, None);
            return Ok(());
        };
        self.pc += 1;
        trace!(node = %node_name, pc = self.pc - 1, %instruction, "step");

        self.execute(instruction, &node_name, &program, ctx)?;

        if self.state == ExecutionState::Running {
            self.state = ExecutionState::Suspended;
        }
        Ok(())
    }

    fn execute(
        &mut self,
        instruction: &Instruction,
        node_name: &str,
        program: &Program,
        ctx: &mut StepContext<'_>,
    ) -> DreResult<()> {
        match instruction.opcode {
            OpCode::JumpTo => {
                let label = instruction.string_operand(0)?;
                self.jump(program, node_name, label)
            }
            OpCode::Jump => {
                let label = self.pop_string()?;
                self.jump(program, node_name, &label)
            }
            // Pops the condition
            OpCode::JumpIfFalse => {
                let condition = self.stack.pop()?;
                if !condition.as_bool() {
                    self.jump(program, node_name, instruction.string_operand(0)?)?;
                }
                Ok(())
            }

            OpCode::RunLine => {
                let id = instruction.string_operand(0)?;
                let text = program.string_text(id).unwrap_or(id).to_string();
                self.events.push(MachineEvent::Line { text });
                Ok(())
            }
            OpCode::RunCommand => {
                let text = instruction.string_operand(0)?.to_string();
                self.events.push(MachineEvent::Command { text });
                Ok(())
            }
            OpCode::AddOption => {
                let id = instruction.string_operand(0)?;
                self.options.push(PendingOption {
                    text: program.string_text(id).unwrap_or(id).to_string(),
                    destination: instruction.string_operand(1)?.to_string(),
                });
                Ok(())
            }
            OpCode::ShowOptions => {
                if self.options.is_empty() {
                    self.finish_node(node_name.to_string(), None);
                } else {
                    let options = self.options.iter().map(|o| o.text.clone()).collect();
                    self.events.push(MachineEvent::Options { options });
                    self.state = ExecutionState::WaitingOnOptionSelection;
                }
                Ok(())
            }

            OpCode::PushString => {
                self.stack.push(Value::from(instruction.string_operand(0)?))
            }
            OpCode::PushNumber => self.stack.push(Value::from(instruction.number_operand(0)?)),
            OpCode::PushBool => self.stack.push(Value::from(instruction.bool_operand(0)?)),
            OpCode::PushNull => self.stack.push(Value::NULL),
            OpCode::Pop => self.stack.pop().map(|_| ()),

            OpCode::CallFunc => {
                let name = instruction.string_operand(0)?;
                let argc = match ctx.library.lookup(name)?.arity() {
                    Arity::Fixed(n) => n,
                    // Variadic calls push their argument count last
                    Arity::Variadic => self.pop_count()?,
                };
                let args = self.stack.pop_n(argc)?;
                let fctx = FunctionContext {
                    current_node: Some(node_name),
                    program: Some(program),
                    visits: ctx.visits,
                    logger: ctx.logger,
                };
                let result = ctx.library.invoke(name, &fctx, &args)?;
                self.stack.push(result)
            }

            OpCode::PushVariable => {
                let value = ctx.storage.get_value(instruction.string_operand(0)?);
                self.stack.push(value)
            }
            // Pops the stored value
            OpCode::StoreVariable => {
                let value = self.stack.pop()?;
                ctx.storage.set_value(instruction.string_operand(0)?, value);
                Ok(())
            }

            OpCode::RunNode => {
                let next = self.pop_string()?;
                if program.node(&next).is_none() {
                    self.stop();
                    return Err(DreError::UnknownNode(next));
                }
                self.events.push(MachineEvent::NodeComplete {
                    node: node_name.to_string(),
                    next_node: Some(next.clone()),
                });
                self.set_node(&next);
                self.state = ExecutionState::Running;
                Ok(())
            }
            OpCode::Stop => {
                self.finish_node(node_name.to_string(), None);
                Ok(())
            }
        }
    }

    fn finish_node(&mut self, node: String, next_node: Option<String>) {
        self.events.push(MachineEvent::NodeComplete { node, next_node });
        self.stop();
    }

    fn jump(&mut self, program: &Program, node_name: &str, label: &str) -> DreResult<()> {
        let target = program
            .node(node_name)
            .and_then(|n| n.label_target(label))
            .ok_or_else(|| DreError::UnknownLabel {
                node: node_name.to_string(),
                label: label.to_string(),
            })?;
        self.pc = target;
        Ok(())
    }

    fn pop_string(&mut self) -> DreResult<String> {
        match self.stack.pop()? {
            Value::String(s) => Ok(s),
            other => Err(DreError::TypeMismatch {
                op: "string operand",
                operands: other.type_name().to_string(),
            }),
        }
    }

    fn pop_count(&mut self) -> DreResult<usize> {
        match self.stack.pop()? {
            Value::Number(n) if n >= 0.0 && n.fract() == 0.0 => Ok(n as usize),
            other => Err(DreError::TypeMismatch {
                op: "argument count",
                operands: other.type_name().to_string(),
            }),
        }
    }
}
