//! Program loading
//!
//! Binary layout (all integers big-endian):
//!
//! ```text
//! magic u32 | major u8 | minor u8 | patch u8 | reserved u8
//! name str
//! string count u32 | (id str, text str, comment opt-str)*
//! node count u32   | node*
//! node = name str | tags (u32, str*) | source opt-str
//!        | labels (u32, (str, u32)*) | instructions (u32, instr*)
//! instr = opcode u8 | operand count u8 | (tag u8, payload)*
//! str = u32 length + utf-8, opt-str = u8 flag (+ str)
//! ```

pub mod reader;
pub mod writer;

pub use reader::ProgramLoader;
pub use writer::ProgramWriter;

/// Program magic: "DLGP"
pub const BYTECODE_MAGIC: u32 = 0x444C_4750;

/// Supported program version
pub const VERSION_MAJOR: u8 = 1;

/// Header + empty name + empty string table + empty node table
const MIN_FILE_SIZE: usize = 20;

const TAG_STRING: u8 = 0x01;
const TAG_NUMBER: u8 = 0x02;
const TAG_BOOL: u8 = 0x03;
