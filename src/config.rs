use std::fmt;
use std::str::FromStr;

/// How `CALL` and `RET` treat the stack.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CallConvention {
    /// `CALL` stores register A at the stack top and jumps to that stored
    /// value without moving SP. `RET` loads the stack top into register A
    /// and jumps there. Existing LS-8 programs rely on this.
    #[default]
    Faithful,
    /// `CALL` pushes the address of the following instruction and jumps to
    /// register A. `RET` pops that address into PC.
    Conventional,
}

/// What to do when the fetched byte is not a known opcode.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum UnknownOpcodePolicy {
    /// Stop with an `UnknownOpcode` fault.
    #[default]
    Reject,
    /// Treat it as a no-op and advance PC by its operand count.
    Ignore,
}

/// Options for a single run of the machine.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Config {
    pub call: CallConvention,
    pub unknown_opcodes: UnknownOpcodePolicy,
    /// Maximum number of instructions executed before giving up
    pub max_steps: Option<u64>,
}

impl FromStr for CallConvention {
    type Err = String;
    fn from_str(string: &str) -> Result<Self, Self::Err> {
        match string {
            "faithful" => Ok(Self::Faithful),
            "conventional" => Ok(Self::Conventional),
            _ => Err(format!("Unknown call convention '{}'", string)),
        }
    }
}

impl fmt::Display for CallConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Faithful => f.write_str("faithful"),
            Self::Conventional => f.write_str("conventional"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_convention_names() {
        for call in [CallConvention::Faithful, CallConvention::Conventional] {
            assert_eq!(call.to_string().parse::<CallConvention>(), Ok(call));
        }
        assert_eq!(
            "bogus".parse::<CallConvention>(),
            Err("Unknown call convention 'bogus'".to_string())
        );
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.call, CallConvention::Faithful);
        assert_eq!(config.unknown_opcodes, UnknownOpcodePolicy::Reject);
        assert_eq!(config.max_steps, None);
    }
}
