// Loading
pub mod loader;
mod span;

// Running
mod alu;
pub use alu::AluOp;
mod config;
pub use config::{CallConvention, Config, UnknownOpcodePolicy};
mod machine;
pub use machine::{Effect, Machine, MEMORY_SIZE, SP, SP_INIT};
pub mod ops;
pub use ops::Opcode;
pub mod output;

mod error;
pub use error::{Fault, MachineError};

pub mod env;

/// Amount of lines to show as context around a loader diagnostic.
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 3;
