use std::cell::RefCell;
use std::fmt;
use std::io::{stdout, Write};

use colored::Colorize;

/// Receives every value printed by `PRN`, in execution order.
pub trait Emit {
    fn emit(&mut self, value: u8);
}

impl Emit for Vec<u8> {
    fn emit(&mut self, value: u8) {
        self.push(value);
    }
}

/// Prints each value as a decimal line on stdout.
#[derive(Debug, Default)]
pub struct Console;

impl Emit for Console {
    fn emit(&mut self, value: u8) {
        println!("{value}");
        let _ = stdout().flush();
    }
}

/// Machine state captured before an instruction executes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Snapshot {
    pub pc: u8,
    /// Bytes at PC, PC+1 and PC+2. `None` past the end of memory.
    pub window: [Option<u8>; 3],
    pub registers: [u8; 8],
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TRACE: {:02X} |", self.pc)?;
        for byte in self.window {
            match byte {
                Some(byte) => write!(f, " {:02X}", byte)?,
                None => f.write_str(" --")?,
            }
        }
        f.write_str(" |")?;
        for reg in self.registers {
            write!(f, " {:02X}", reg)?;
        }
        Ok(())
    }
}

thread_local! {
    static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
}

pub fn set_minimal(new_value: bool) -> bool {
    IS_MINIMAL.with(|value| value.replace(new_value))
}

pub fn is_minimal() -> bool {
    IS_MINIMAL.with(|value| *value.borrow())
}

/// Write a trace line to stderr, dimmed unless output is minimal.
pub fn print_trace(snapshot: &Snapshot) {
    let line = snapshot.to_string();
    if is_minimal() {
        eprintln!("{line}");
    } else {
        eprintln!("{}", line.dimmed());
    }
}
