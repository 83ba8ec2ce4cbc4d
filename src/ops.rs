use std::fmt;

/// Every instruction understood by the LS-8.
///
/// The discriminant is the opcode byte. Its top two bits hold the number of
/// operand bytes following the opcode, and bit 4 is set when the instruction
/// writes PC itself.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Opcode {
    /// Stop the machine
    HLT = 0b0000_0001,
    /// Emit the value of register A
    PRN = 0b0100_0111,
    /// Load immediate B into register A
    LDI = 0b1000_0010,
    /// Multiply register A by register B, storing into A
    MUL = 0b1010_0010,
    /// Push register A onto the stack
    PUSH = 0b0100_0101,
    /// Pop the stack top into register A
    POP = 0b0100_0110,
    /// Call the subroutine at the address in register A
    CALL = 0b0101_0000,
    /// Return from a subroutine
    RET = 0b0001_0001,
    /// Set PC to register A
    JMP = 0b0101_0100,
}

impl Opcode {
    pub const ALL: [Opcode; 9] = [
        Opcode::HLT,
        Opcode::PRN,
        Opcode::LDI,
        Opcode::MUL,
        Opcode::PUSH,
        Opcode::POP,
        Opcode::CALL,
        Opcode::RET,
        Opcode::JMP,
    ];

    pub fn decode(byte: u8) -> Option<Opcode> {
        Self::ALL.into_iter().find(|op| *op as u8 == byte)
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::HLT => "HLT",
            Self::PRN => "PRN",
            Self::LDI => "LDI",
            Self::MUL => "MUL",
            Self::PUSH => "PUSH",
            Self::POP => "POP",
            Self::CALL => "CALL",
            Self::RET => "RET",
            Self::JMP => "JMP",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Number of operand bytes following `opcode`.
#[inline]
pub fn operand_count(opcode: u8) -> u8 {
    opcode >> 6
}

/// Whether `opcode` is responsible for setting PC, disabling the auto-advance.
#[inline]
pub fn sets_pc(opcode: u8) -> bool {
    (opcode >> 4) & 1 == 1
}
