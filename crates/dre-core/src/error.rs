//! DRE Error Types
//!
//! Defines all hard error conditions produced by the Dialogue Runtime Engine.
//! Script-level problems (unknown nodes, missing program) are reported through
//! the runtime's log handlers instead and never show up here.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DreError {
    // Program / bytecode errors
    #[error("invalid program magic number")]
    InvalidMagicNumber,
    #[error("incompatible program version {0}")]
    InvalidProgramVersion(u8),
    #[error("invalid opcode: 0x{0:02X}")]
    InvalidOpcode(u8),
    #[error("malformed program: {0}")]
    MalformedProgram(String),
    #[error("program is too short")]
    ProgramTooShort,

    // Machine execution errors
    #[error("stack overflow")]
    StackOverflow,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("unknown label '{label}' in node '{node}'")]
    UnknownLabel { node: String, label: String },
    #[error("unknown node '{0}'")]
    UnknownNode(String),
    #[error("type mismatch: cannot apply {op} to {operands}")]
    TypeMismatch { op: &'static str, operands: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("machine is not running")]
    MachineNotRunning,

    // Library errors
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("function '{name}' expects {expected} arguments, got {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },

    // Client protocol violations
    #[error("options were presented but no option was chosen")]
    OptionNotSelected,
    #[error("option index {index} out of range for {count} options")]
    InvalidOptionIndex { index: usize, count: usize },
    #[error("an option was already chosen for this selection")]
    OptionAlreadySelected,

    // Host integration errors
    #[error("no {0} log handler configured")]
    MissingLogHandler(&'static str),
    #[error("invalid configuration: {0}")]
    Config(String),

    // IO boundary
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<toml::de::Error> for DreError {
    fn from(err: toml::de::Error) -> Self {
        DreError::Config(err.to_string())
    }
}

pub type DreResult<T> = Result<T, DreError>;
