use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    isa::{Instruction, Operand},
    registers::{Registers, P},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("Operand '{operand}' must be a register")]
    RegisterExpected { operand: Operand },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CPUError {
    #[error("Division by zero in '{instruction}' at {pc}")]
    DivisionByZero { pc: i64, instruction: Instruction },
    #[error("Failed to execute '{instruction}' at {pc}")]
    Port {
        pc: i64,
        instruction: Instruction,
        #[source]
        source: PortError,
    },
    #[error("The program halted without recovering a value")]
    NothingRecovered,
}

/// Outcome of a `rcv` as decided by the [Port].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receive {
    /// Move on to the next instruction
    Continue,
    /// Nothing to receive yet; retry the same instruction on the next turn
    Suspend,
    /// Stop the unit for good
    Halt,
}

/// Where `snd` values go and where `rcv` values come from.
pub trait Port {
    fn send(&mut self, value: i64);

    /// Must leave `registers` untouched when returning [Receive::Suspend].
    fn receive(&mut self, operand: Operand, registers: &mut Registers)
        -> Result<Receive, PortError>;
}

#[derive(Debug, Default, Clone)]
pub struct CPUConfig {
    /// Seeded into register `p` when present
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Suspended,
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Executed,
    Suspended,
    Halted,
}

/// A single execution unit running a shared, immutable program.
#[derive(Debug, Clone)]
pub struct CPU<'p> {
    pub registers: Registers,
    program: &'p [Instruction],
    state: State,
    retired: u64,
}

impl<'p> CPU<'p> {
    pub fn new(program: &'p [Instruction], config: CPUConfig) -> Self {
        let mut registers = Registers::default();

        if let Some(id) = config.id {
            registers.set(P, id);
        }

        Self {
            registers,
            program,
            state: State::Running,
            retired: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Number of instructions executed so far. A suspended `rcv` does not count.
    pub fn retired(&self) -> u64 {
        self.retired
    }

    fn fetch(&self, pc: i64) -> Option<Instruction> {
        usize::try_from(pc)
            .ok()
            .and_then(|pc| self.program.get(pc))
            .copied()
    }

    fn halt(&mut self) -> Step {
        debug!(pc = self.registers.pc(), retired = self.retired, "halted");
        self.state = State::Halted;

        Step::Halted
    }

    pub fn tick(&mut self, port: &mut impl Port) -> Result<Step, CPUError> {
        if self.state == State::Halted {
            return Ok(Step::Halted);
        }

        let pc = self.registers.pc();
        let Some(instruction) = self.fetch(pc) else {
            return Ok(self.halt());
        };

        trace!(pc, %instruction, "tick");

        let mut npc = pc.checked_add(1);

        match instruction {
            Instruction::Snd(x) => {
                port.send(self.registers.resolve(x));
            }
            Instruction::Set(r, x) => {
                let value = self.registers.resolve(x);

                self.registers.set(r, value);
            }
            Instruction::Add(r, x) => {
                let result = self.registers.get(r).wrapping_add(self.registers.resolve(x));

                self.registers.set(r, result);
            }
            Instruction::Mul(r, x) => {
                let result = self.registers.get(r).wrapping_mul(self.registers.resolve(x));

                self.registers.set(r, result);
            }
            Instruction::Mod(r, x) => {
                let divisor = self.registers.resolve(x);

                if divisor == 0 {
                    return Err(CPUError::DivisionByZero { pc, instruction });
                }

                let result = self.registers.get(r).wrapping_rem(divisor);

                self.registers.set(r, result);
            }
            Instruction::Rcv(x) => {
                let received = port
                    .receive(x, &mut self.registers)
                    .map_err(|source| CPUError::Port {
                        pc,
                        instruction,
                        source,
                    })?;

                match received {
                    Receive::Continue => {}
                    Receive::Suspend => {
                        debug!(pc, "suspended");
                        self.state = State::Suspended;

                        return Ok(Step::Suspended);
                    }
                    Receive::Halt => {
                        self.retired += 1;

                        return Ok(self.halt());
                    }
                }
            }
            Instruction::Jgz(x, y) => {
                if self.registers.resolve(x) > 0 {
                    npc = pc.checked_add(self.registers.resolve(y));
                }
            }
        }

        self.retired += 1;
        self.state = State::Running;

        match npc {
            Some(npc) => {
                *self.registers.pc_mut() = npc;

                Ok(Step::Executed)
            }
            None => Ok(self.halt()),
        }
    }

    /// Ticks until the unit halts or suspends, returning how many instructions ran.
    pub fn run(&mut self, port: &mut impl Port) -> Result<u64, CPUError> {
        let start = self.retired;

        while self.tick(port)? == Step::Executed {}

        Ok(self.retired - start)
    }
}
