//! Runtime Coordinator
//!
//! Owns variable storage, the function library and visit counters, and turns
//! machine events into a pull-based sequence of [`ExecutionResult`]s.

pub mod dialogue;
pub mod logging;
pub mod result;
pub mod run;
pub mod visits;

pub use dialogue::DialogueRuntime;
pub use logging::{LogHandler, Logger};
pub use result::{ExecutionResult, OptionSelector, STOP_COMMAND};
pub use run::Run;
pub use visits::VisitCounter;
