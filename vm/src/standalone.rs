use tracing::{info, instrument};

use crate::{
    cpu::{CPUConfig, CPUError, Port, PortError, Receive, CPU},
    isa::{Instruction, Operand},
    registers::Registers,
};

/// Port of a unit running alone: `snd` remembers the value, a non-zero `rcv` recovers it.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    last_sent: i64,
    first_recovered: Option<i64>,
}

impl Recorder {
    pub fn last_sent(&self) -> i64 {
        self.last_sent
    }

    pub fn first_recovered(&self) -> Option<i64> {
        self.first_recovered
    }
}

impl Port for Recorder {
    fn send(&mut self, value: i64) {
        self.last_sent = value;
    }

    fn receive(
        &mut self,
        operand: Operand,
        registers: &mut Registers,
    ) -> Result<Receive, PortError> {
        if registers.resolve(operand) == 0 {
            return Ok(Receive::Continue);
        }

        self.first_recovered.get_or_insert(self.last_sent);

        Ok(Receive::Halt)
    }
}

/// Runs `program` alone until the first triggered `rcv` and returns the value it recovered.
#[instrument(skip_all, fields(len = program.len()))]
pub fn run_standalone(program: &[Instruction]) -> Result<i64, CPUError> {
    let mut cpu = CPU::new(program, CPUConfig::default());
    let mut recorder = Recorder::default();

    let retired = cpu.run(&mut recorder)?;
    let recovered = recorder
        .first_recovered()
        .ok_or(CPUError::NothingRecovered)?;

    info!(retired, recovered, "standalone run finished");

    Ok(recovered)
}
