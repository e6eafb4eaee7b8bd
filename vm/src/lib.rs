//! Register machine with two execution modes.
//!
//! A program runs either alone, where `snd` and `rcv` play and recover a sound,
//! or as a pair of peers exchanging values over two FIFO channels under a
//! cooperative [scheduler::Scheduler].

pub mod channel;
pub mod cpu;
pub mod decoder;
pub mod isa;
pub mod registers;
pub mod scheduler;
pub mod standalone;

pub use cpu::{CPUConfig, CPUError, CPU};
pub use decoder::{decode, decode_program, DecodeError};
pub use isa::{Instruction, Operand};
pub use scheduler::{run_cooperative, Scheduler};
pub use standalone::run_standalone;
