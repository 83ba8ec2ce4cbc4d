use std::str::FromStr;

use crate::error::MachineError;

/// Arithmetic performed on two register values.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AluOp {
    Add,
    Mul,
}

impl AluOp {
    /// Result of `dest <op> src`, truncated to 8 bits.
    pub fn apply(&self, dest: u8, src: u8) -> u8 {
        match self {
            Self::Add => dest.wrapping_add(src),
            Self::Mul => dest.wrapping_mul(src),
        }
    }
}

impl FromStr for AluOp {
    type Err = MachineError;
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "ADD" => Ok(Self::Add),
            "MUL" => Ok(Self::Mul),
            _ => Err(MachineError::UnsupportedOperation {
                name: name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_to_eight_bits() {
        assert_eq!(AluOp::Mul.apply(200, 200), 64);
        assert_eq!(AluOp::Mul.apply(8, 9), 72);
        assert_eq!(AluOp::Add.apply(250, 10), 4);
        assert_eq!(AluOp::Add.apply(1, 2), 3);
    }

    #[test]
    fn mul_matches_native_wrapping() {
        for a in 0..=255u8 {
            for b in [0u8, 1, 2, 3, 127, 128, 255] {
                assert_eq!(AluOp::Mul.apply(a, b), ((a as u32 * b as u32) % 256) as u8);
            }
        }
    }

    #[test]
    fn parses_names() {
        assert_eq!("ADD".parse::<AluOp>(), Ok(AluOp::Add));
        assert_eq!("MUL".parse::<AluOp>(), Ok(AluOp::Mul));
        assert_eq!(
            "SUB".parse::<AluOp>(),
            Err(MachineError::UnsupportedOperation {
                name: "SUB".to_string()
            })
        );
    }
}
