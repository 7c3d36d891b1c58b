//! Dialogue Runtime Engine - Core Library
//!
//! Executes compiled dialogue programs: a stack machine steps through node
//! bytecode while [`DialogueRuntime`] hands lines, option sets, commands and
//! node completions to the host one at a time.

pub mod analysis;
pub mod bytecode;
pub mod config;
pub mod error;
pub mod library;
pub mod loader;
pub mod runtime;
pub mod storage;
pub mod value;
pub mod vm;

// Re-export commonly used types
pub use analysis::{AnalysisContext, Diagnosis, Severity};
pub use bytecode::{OpCode, Program, ProgramBuilder};
pub use config::RuntimeConfig;
pub use error::{DreError, DreResult};
pub use library::{Arity, FunctionContext, Library, Operator};
pub use loader::{ProgramLoader, ProgramWriter};
pub use runtime::{DialogueRuntime, ExecutionResult, OptionSelector, Run};
pub use storage::{MemoryVariableStorage, VariableStorage};
pub use value::Value;
pub use vm::StopHandle;
