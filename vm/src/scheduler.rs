use tracing::{debug, info, instrument};

use crate::{
    channel::Channel,
    cpu::{CPUConfig, CPUError, Port, PortError, Receive, State, CPU},
    isa::{Instruction, Operand},
    registers::Registers,
};

/// Port of a unit paired with a peer: `snd` pushes to the peer, `rcv` pops from it.
#[derive(Debug)]
pub struct Link<'c> {
    inbound: &'c mut Channel,
    outbound: &'c mut Channel,
    sent: &'c mut u64,
}

impl<'c> Link<'c> {
    pub fn new(inbound: &'c mut Channel, outbound: &'c mut Channel, sent: &'c mut u64) -> Self {
        Self {
            inbound,
            outbound,
            sent,
        }
    }
}

impl Port for Link<'_> {
    fn send(&mut self, value: i64) {
        self.outbound.push(value);
        *self.sent += 1;
    }

    fn receive(
        &mut self,
        operand: Operand,
        registers: &mut Registers,
    ) -> Result<Receive, PortError> {
        let target = operand
            .as_register()
            .ok_or(PortError::RegisterExpected { operand })?;

        match self.inbound.pop() {
            Some(value) => {
                registers.set(target, value);

                Ok(Receive::Continue)
            }
            None => Ok(Receive::Suspend),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Peer<'p> {
    pub cpu: CPU<'p>,
    sent: u64,
}

impl Peer<'_> {
    /// Number of values this peer has sent.
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

/// Runs two copies of one program, identified as 0 and 1, taking turns.
///
/// A turn lasts until the active peer halts or blocks on an empty inbound channel.
/// The run stops after two consecutive turns that execute nothing: at that point
/// both peers are halted or waiting on each other.
#[derive(Debug, Clone)]
pub struct Scheduler<'p> {
    peers: [Peer<'p>; 2],
    /// `channels[i]` carries the values sent by peer `i`
    channels: [Channel; 2],
    active: usize,
    turns: u64,
}

impl<'p> Scheduler<'p> {
    pub fn new(program: &'p [Instruction]) -> Self {
        let peer = |id: i64| Peer {
            cpu: CPU::new(program, CPUConfig { id: Some(id) }),
            sent: 0,
        };

        Self {
            peers: [peer(0), peer(1)],
            channels: [Channel::new(), Channel::new()],
            active: 0,
            turns: 0,
        }
    }

    pub fn peer(&self, id: usize) -> &Peer<'p> {
        &self.peers[id]
    }

    /// Channel carrying the values sent by peer `from`.
    pub fn channel(&self, from: usize) -> &Channel {
        &self.channels[from]
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn turns(&self) -> u64 {
        self.turns
    }

    /// Gives the active peer one turn, then hands control to the other one.
    /// Returns the number of instructions executed during the turn.
    pub fn turn(&mut self) -> Result<u64, CPUError> {
        let active = self.active;

        let [first, second] = &mut self.channels;
        let (outbound, inbound) = if active == 0 {
            (first, second)
        } else {
            (second, first)
        };

        let peer = &mut self.peers[active];
        let mut link = Link::new(inbound, outbound, &mut peer.sent);
        let executed = peer.cpu.run(&mut link)?;

        debug!(
            peer = active,
            executed,
            state = ?peer.cpu.state(),
            "turn finished"
        );

        self.turns += 1;
        self.active = 1 - active;

        Ok(executed)
    }

    pub fn run(&mut self) -> Result<(), CPUError> {
        let mut idle = 0;

        while idle < 2 {
            if self.turn()? == 0 {
                idle += 1;
            } else {
                idle = 0;
            }
        }

        let halted = self
            .peers
            .iter()
            .all(|peer| peer.cpu.state() == State::Halted);

        info!(
            turns = self.turns,
            halted,
            sent = ?[self.peers[0].sent, self.peers[1].sent],
            "cooperative run finished"
        );

        Ok(())
    }
}

/// Runs the paired program to completion or deadlock and returns the number of
/// values sent by the peer with id 1.
#[instrument(skip_all, fields(len = program.len()))]
pub fn run_cooperative(program: &[Instruction]) -> Result<u64, CPUError> {
    let mut scheduler = Scheduler::new(program);

    scheduler.run()?;

    Ok(scheduler.peer(1).sent())
}

#[cfg(test)]
mod tests {
    use super::{run_cooperative, Scheduler};
    use crate::{
        cpu::{CPUConfig, CPUError, PortError, State, CPU},
        decoder::tests::{make_program, reg},
        registers::P,
        standalone::Recorder,
    };

    #[test]
    fn second_program_send_count() {
        let program = make_program(&[
            "snd 1", "snd 2", "snd p", "rcv a", "rcv b", "rcv c", "rcv d",
        ]);

        assert_eq!(run_cooperative(&program), Ok(3));
    }

    #[test]
    fn exchanges_values() {
        let program = make_program(&[
            "snd 1", "snd 2", "snd p", "rcv a", "rcv b", "rcv c", "rcv d",
        ]);
        let mut scheduler = Scheduler::new(&program);

        scheduler.run().unwrap();

        let first = &scheduler.peer(0).cpu;
        let second = &scheduler.peer(1).cpu;

        assert_eq!(first.registers.get(reg("c")), 1);
        assert_eq!(second.registers.get(reg("c")), 0);
        assert_eq!(first.state(), State::Suspended);
        assert_eq!(second.state(), State::Suspended);
        assert_eq!(first.registers.pc(), 6);
        assert_eq!(scheduler.peer(0).sent(), 3);
        assert!(scheduler.channel(0).is_empty());
        assert!(scheduler.channel(1).is_empty());
    }

    #[test]
    fn immediate_deadlock_terminates() {
        let program = make_program(&["rcv a", "snd 1"]);
        let mut scheduler = Scheduler::new(&program);

        scheduler.run().unwrap();

        assert_eq!(scheduler.turns(), 2);
        assert_eq!(scheduler.peer(0).cpu.state(), State::Suspended);
        assert_eq!(scheduler.peer(1).cpu.state(), State::Suspended);
        assert_eq!(scheduler.peer(0).cpu.registers.pc(), 0);
        assert_eq!(run_cooperative(&program), Ok(0));
    }

    #[test]
    fn deadlock_after_progress() {
        let program = make_program(&["snd p", "rcv a", "rcv b"]);
        let mut scheduler = Scheduler::new(&program);

        scheduler.run().unwrap();

        assert_eq!(scheduler.peer(0).cpu.registers.get(reg("a")), 1);
        assert_eq!(scheduler.peer(1).cpu.registers.get(reg("a")), 0);
        assert_eq!(scheduler.peer(0).cpu.registers.pc(), 2);
        assert_eq!(scheduler.peer(1).cpu.registers.pc(), 2);
        assert_eq!(scheduler.peer(1).sent(), 1);
    }

    #[test]
    fn fifo_order() {
        let program = make_program(&[
            "jgz p 7",
            "snd 1",
            "snd -2",
            "snd 3",
            "snd 4",
            "snd 5",
            "jgz 1 100",
            "rcv a",
            "rcv b",
            "rcv c",
            "rcv d",
            "rcv e",
        ]);
        let mut scheduler = Scheduler::new(&program);

        scheduler.run().unwrap();

        let receiver = &scheduler.peer(1).cpu;
        let received: Vec<i64> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|name| receiver.registers.get(reg(name)))
            .collect();

        assert_eq!(received, vec![1, -2, 3, 4, 5]);
        assert_eq!(receiver.state(), State::Halted);
        assert_eq!(scheduler.peer(0).cpu.state(), State::Halted);
        assert_eq!(scheduler.channel(0).pushed(), 5);
        assert_eq!(scheduler.channel(0).popped(), 5);
    }

    #[test]
    fn ping_pong_until_halt() {
        let program = make_program(&[
            "jgz p 2",
            "snd 0",
            "rcv a",
            "add a 1",
            "snd a",
            "set b a",
            "add b -10",
            "jgz b 2",
            "jgz 1 -6",
        ]);
        let mut scheduler = Scheduler::new(&program);

        scheduler.run().unwrap();

        assert_eq!(scheduler.peer(0).sent(), 7);
        assert_eq!(scheduler.peer(1).sent(), 6);
        assert_eq!(scheduler.peer(0).cpu.registers.get(reg("a")), 12);
        assert_eq!(scheduler.peer(1).cpu.registers.get(reg("a")), 11);
        assert_eq!(scheduler.peer(0).cpu.state(), State::Halted);
        assert_eq!(scheduler.peer(1).cpu.state(), State::Halted);
        assert_eq!(scheduler.channel(0).iter().copied().collect::<Vec<_>>(), vec![12]);
        assert_eq!(run_cooperative(&program), Ok(6));
    }

    #[test]
    fn seeds_identities() {
        let program = make_program(&["set a 0"]);
        let scheduler = Scheduler::new(&program);

        assert_eq!(scheduler.peer(0).cpu.registers.get(P), 0);
        assert_eq!(scheduler.peer(1).cpu.registers.get(P), 1);
        assert_eq!(scheduler.active(), 0);
    }

    #[test]
    fn matches_standalone_without_io() {
        let program = make_program(&[
            "set a 3", "mul a 7", "add b a", "mod b 4", "jgz b 2", "set c 1", "set d -1",
        ]);

        let mut cpu = CPU::new(&program, CPUConfig::default());
        cpu.run(&mut Recorder::default()).unwrap();

        let mut scheduler = Scheduler::new(&program);
        scheduler.run().unwrap();

        assert_eq!(scheduler.peer(0).cpu.registers, cpu.registers);
        assert_eq!(scheduler.peer(0).cpu.state(), State::Halted);
    }

    #[test]
    fn rcv_literal_fails() {
        let program = make_program(&["snd 1", "rcv 5"]);

        assert!(matches!(
            run_cooperative(&program),
            Err(CPUError::Port {
                pc: 1,
                source: PortError::RegisterExpected { .. },
                ..
            })
        ));
    }
}
