use crate::alu::AluOp;
use crate::config::{CallConvention, Config, UnknownOpcodePolicy};
use crate::error::{Fault, MachineError};
use crate::ops::{self, Opcode};
use crate::output::{Emit, Snapshot};

/// The LS-8 has 256 bytes of memory, addressed by a single byte.
pub const MEMORY_SIZE: usize = 0x100;
/// Register R7 holds the stack pointer.
pub const SP: usize = 7;
/// Stack starts just below the top of memory and grows downwards.
pub const SP_INIT: u8 = 0xF3;

/// Observable result of executing one instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Effect {
    None,
    /// `PRN` produced a value
    Print(u8),
    /// PC was set explicitly
    Jump(u8),
    Halt,
}

/// Operand bytes following the opcode. `None` when past the end of memory.
#[derive(Clone, Copy, Debug)]
struct Operands {
    pc: u8,
    a: Option<u8>,
    b: Option<u8>,
}

impl Operands {
    fn a(&self) -> Result<u8, MachineError> {
        self.a.ok_or(MachineError::AddressOutOfRange {
            address: self.pc as isize + 1,
        })
    }

    fn b(&self) -> Result<u8, MachineError> {
        self.b.ok_or(MachineError::AddressOutOfRange {
            address: self.pc as isize + 2,
        })
    }
}

type Handler = fn(&mut Machine, Operands) -> Result<Effect, MachineError>;

/// Represents complete machine state during runtime.
#[derive(Clone, Debug)]
pub struct Machine {
    mem: [u8; MEMORY_SIZE],
    /// 8x 8-bit registers, R7 doubling as SP
    reg: [u8; 8],
    /// Program counter
    pc: u8,
    halted: bool,
    config: Config,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Machine {
    pub fn new(config: Config) -> Machine {
        let mut reg = [0; 8];
        reg[SP] = SP_INIT;
        Machine {
            mem: [0; MEMORY_SIZE],
            reg,
            pc: 0,
            halted: false,
            config,
        }
    }

    /// Build a machine with `image` loaded from address 0.
    pub fn from_image(image: &[u8], config: Config) -> Result<Machine, MachineError> {
        let mut machine = Machine::new(config);
        machine.load(image)?;
        Ok(machine)
    }

    /// Copy `image` into memory starting at address 0.
    pub fn load(&mut self, image: &[u8]) -> Result<(), MachineError> {
        if image.len() > MEMORY_SIZE {
            return Err(MachineError::AddressOutOfRange {
                address: MEMORY_SIZE as isize,
            });
        }
        self.mem[..image.len()].copy_from_slice(image);
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn read(&self, address: usize) -> Result<u8, MachineError> {
        self.mem
            .get(address)
            .copied()
            .ok_or(MachineError::AddressOutOfRange {
                address: address as isize,
            })
    }

    pub fn write(&mut self, address: usize, value: u8) -> Result<(), MachineError> {
        let cell = self
            .mem
            .get_mut(address)
            .ok_or(MachineError::AddressOutOfRange {
                address: address as isize,
            })?;
        *cell = value;
        Ok(())
    }

    pub fn reg(&self, index: usize) -> Result<u8, MachineError> {
        self.reg
            .get(index)
            .copied()
            .ok_or(MachineError::RegisterOutOfRange { index })
    }

    pub fn set_reg(&mut self, index: usize, value: u8) -> Result<(), MachineError> {
        let reg = self
            .reg
            .get_mut(index)
            .ok_or(MachineError::RegisterOutOfRange { index })?;
        *reg = value;
        Ok(())
    }

    pub fn registers(&self) -> &[u8; 8] {
        &self.reg
    }

    /// Stack pointer, an alias for R7.
    #[inline]
    pub fn sp(&self) -> u8 {
        self.reg[SP]
    }

    #[inline]
    fn set_sp(&mut self, value: u8) {
        self.reg[SP] = value;
    }

    pub fn pc(&self) -> u8 {
        self.pc
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Apply `op` to registers `dest` and `src`, storing into `dest`.
    pub fn alu(&mut self, op: AluOp, dest: usize, src: usize) -> Result<(), MachineError> {
        let val = op.apply(self.reg(dest)?, self.reg(src)?);
        self.set_reg(dest, val)
    }

    pub fn push(&mut self, value: u8) -> Result<(), MachineError> {
        let sp = self
            .sp()
            .checked_sub(1)
            .ok_or(MachineError::AddressOutOfRange { address: -1 })?;
        self.set_sp(sp);
        self.mem[sp as usize] = value;
        Ok(())
    }

    /// Take the stack top, clearing its cell.
    pub fn pop(&mut self) -> Result<u8, MachineError> {
        let sp = self.sp();
        let next = sp
            .checked_add(1)
            .ok_or(MachineError::AddressOutOfRange {
                address: MEMORY_SIZE as isize,
            })?;
        let val = self.mem[sp as usize];
        self.mem[sp as usize] = 0;
        self.set_sp(next);
        Ok(val)
    }

    pub fn trace(&self) -> Snapshot {
        let pc = self.pc as usize;
        Snapshot {
            pc: self.pc,
            window: [
                self.mem.get(pc).copied(),
                self.mem.get(pc + 1).copied(),
                self.mem.get(pc + 2).copied(),
            ],
            registers: self.reg,
        }
    }

    /// Run until halted, sending `PRN` values to `out`.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self, out: &mut impl Emit) -> Result<u64, Fault> {
        self.run_with(out, |_| {})
    }

    /// Like [`Machine::run`], calling `before_step` ahead of every instruction.
    pub fn run_with<E, F>(&mut self, out: &mut E, mut before_step: F) -> Result<u64, Fault>
    where
        E: Emit,
        F: FnMut(&Machine),
    {
        let mut steps = 0;
        while !self.halted {
            if let Some(limit) = self.config.max_steps {
                if steps >= limit {
                    return Err(Fault {
                        pc: self.pc,
                        opcode: self.mem[self.pc as usize],
                        error: MachineError::StepLimitReached { limit },
                    });
                }
            }
            before_step(&*self);
            if let Effect::Print(val) = self.step()? {
                out.emit(val);
            }
            steps += 1;
        }
        Ok(steps)
    }

    /// Run until halted, collecting every `PRN` value.
    pub fn run_to_vec(&mut self) -> Result<Vec<u8>, Fault> {
        let mut out = Vec::new();
        self.run(&mut out)?;
        Ok(out)
    }

    /// Fetch, decode and execute the instruction at PC.
    pub fn step(&mut self) -> Result<Effect, Fault> {
        let pc = self.pc;
        let opcode = self.mem[pc as usize];
        let fault = |error| Fault { pc, opcode, error };

        let effect = self.execute(opcode).map_err(fault)?;
        match effect {
            Effect::Halt => {
                self.halted = true;
                return Ok(effect);
            }
            Effect::Jump(target) => self.pc = target,
            Effect::None | Effect::Print(_) => (),
        }
        if !ops::sets_pc(opcode) {
            self.advance(opcode).map_err(fault)?;
        }
        Ok(effect)
    }

    fn execute(&mut self, opcode: u8) -> Result<Effect, MachineError> {
        let Some(op) = Opcode::decode(opcode) else {
            return match self.config.unknown_opcodes {
                UnknownOpcodePolicy::Reject => Err(MachineError::UnknownOpcode { opcode }),
                UnknownOpcodePolicy::Ignore => Ok(Effect::None),
            };
        };
        let pc = self.pc as usize;
        let operands = Operands {
            pc: self.pc,
            a: self.mem.get(pc + 1).copied(),
            b: self.mem.get(pc + 2).copied(),
        };
        Self::handler(op)(self, operands)
    }

    fn advance(&mut self, opcode: u8) -> Result<(), MachineError> {
        let next = self.pc as usize + ops::operand_count(opcode) as usize + 1;
        self.pc = u8::try_from(next).map_err(|_| MachineError::AddressOutOfRange {
            address: next as isize,
        })?;
        Ok(())
    }

    fn handler(op: Opcode) -> Handler {
        match op {
            Opcode::HLT => Self::hlt,
            Opcode::PRN => Self::prn,
            Opcode::LDI => Self::ldi,
            Opcode::MUL => Self::mul,
            Opcode::PUSH => Self::push_op,
            Opcode::POP => Self::pop_op,
            Opcode::CALL => Self::call,
            Opcode::RET => Self::ret,
            Opcode::JMP => Self::jmp,
        }
    }

    fn hlt(&mut self, _ops: Operands) -> Result<Effect, MachineError> {
        Ok(Effect::Halt)
    }

    fn prn(&mut self, ops: Operands) -> Result<Effect, MachineError> {
        let val = self.reg(ops.a()? as usize)?;
        Ok(Effect::Print(val))
    }

    fn ldi(&mut self, ops: Operands) -> Result<Effect, MachineError> {
        self.set_reg(ops.a()? as usize, ops.b()?)?;
        Ok(Effect::None)
    }

    fn mul(&mut self, ops: Operands) -> Result<Effect, MachineError> {
        self.alu(AluOp::Mul, ops.a()? as usize, ops.b()? as usize)?;
        Ok(Effect::None)
    }

    fn push_op(&mut self, ops: Operands) -> Result<Effect, MachineError> {
        let src = ops.a()? as usize;
        self.reg(src)?;
        let sp = self
            .sp()
            .checked_sub(1)
            .ok_or(MachineError::AddressOutOfRange { address: -1 })?;
        self.set_sp(sp);
        // Read after the decrement, so `PUSH R7` stores the new SP
        let val = self.reg(src)?;
        self.mem[sp as usize] = val;
        Ok(Effect::None)
    }

    fn pop_op(&mut self, ops: Operands) -> Result<Effect, MachineError> {
        let dest = ops.a()? as usize;
        self.reg(dest)?;
        let val = self.mem[self.sp() as usize];
        // SP is re-read after the load, so `POP R7` clears and steps past the popped address
        let top = if dest == SP { val } else { self.sp() };
        let next = top
            .checked_add(1)
            .ok_or(MachineError::AddressOutOfRange {
                address: MEMORY_SIZE as isize,
            })?;
        self.set_reg(dest, val)?;
        self.mem[top as usize] = 0;
        self.set_sp(next);
        Ok(Effect::None)
    }

    fn call(&mut self, ops: Operands) -> Result<Effect, MachineError> {
        let target = self.reg(ops.a()? as usize)?;
        match self.config.call {
            CallConvention::Faithful => {
                // Target round-trips through the stack top; SP is untouched
                let sp = self.sp() as usize;
                self.mem[sp] = target;
                Ok(Effect::Jump(self.mem[sp]))
            }
            CallConvention::Conventional => {
                let ret = self.pc as usize + 2;
                let ret = u8::try_from(ret).map_err(|_| MachineError::AddressOutOfRange {
                    address: ret as isize,
                })?;
                self.push(ret)?;
                Ok(Effect::Jump(target))
            }
        }
    }

    fn ret(&mut self, ops: Operands) -> Result<Effect, MachineError> {
        match self.config.call {
            CallConvention::Faithful => {
                let dest = ops.a()? as usize;
                let val = self.mem[self.sp() as usize];
                self.set_reg(dest, val)?;
                Ok(Effect::Jump(val))
            }
            CallConvention::Conventional => Ok(Effect::Jump(self.pop()?)),
        }
    }

    fn jmp(&mut self, ops: Operands) -> Result<Effect, MachineError> {
        let target = self.reg(ops.a()? as usize)?;
        Ok(Effect::Jump(target))
    }
}
