pub mod machine;
pub mod stack;

pub use machine::{ExecutionState, Machine, MachineEvent, StepContext, StopHandle};
