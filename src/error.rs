use std::{error::Error, fmt};

use miette::{miette, LabeledSpan, Report, Severity};

use crate::span::Span;

/// Error raised while accessing or executing on the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineError {
    /// Memory access outside `0..=255`.
    AddressOutOfRange { address: isize },
    /// Register access outside `0..=7`.
    RegisterOutOfRange { index: usize },
    UnsupportedOperation { name: String },
    UnknownOpcode { opcode: u8 },
    StepLimitReached { limit: u64 },
}

/// A [`MachineError`] raised while executing the instruction at `pc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub pc: u8,
    pub opcode: u8,
    pub error: MachineError,
}

impl Error for MachineError {}

impl Error for Fault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

impl fmt::Display for MachineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressOutOfRange { address } => {
                write!(f, "Address {} is outside of memory (0-255)", address)
            }
            Self::RegisterOutOfRange { index } => {
                write!(f, "Register R{} does not exist (R0-R7)", index)
            }
            Self::UnsupportedOperation { name } => {
                write!(f, "Unsupported ALU operation `{}`", name)
            }
            Self::UnknownOpcode { opcode } => {
                write!(f, "Unknown opcode 0b{:08b}", opcode)
            }
            Self::StepLimitReached { limit } => {
                write!(f, "Program did not halt within {} steps", limit)
            }
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fault at PC 0x{:02X} (opcode 0b{:08b}): {}",
            self.pc, self.opcode, self.error
        )
    }
}

// Loader errors

pub fn load_bad_literal(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::bad_literal",
        help = "instructions are written as 8 binary digits, like 10000010",
        labels = vec![LabeledSpan::at(span.as_range(), "not a binary byte")],
        "Encountered an invalid binary literal.",
    )
    .with_source_code(src.to_owned())
}

pub fn load_too_large(span: Option<Span>, src: &str, len: usize) -> Report {
    let labels = match span {
        Some(span) => vec![LabeledSpan::at(span.as_range(), "does not fit in memory")],
        None => Vec::new(),
    };
    miette!(
        severity = Severity::Error,
        code = "load::too_large",
        help = "the LS-8 has 256 bytes of memory",
        labels = labels,
        "Program is {len} bytes long and cannot fit in memory.",
    )
    .with_source_code(src.to_owned())
}
