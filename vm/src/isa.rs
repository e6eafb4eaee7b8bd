use std::fmt;

use crate::registers::Register;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    Register(Register),
    Literal(i64),
}

impl Operand {
    pub fn as_register(&self) -> Option<Register> {
        match self {
            Operand::Register(register) => Some(*register),
            Operand::Literal(_) => None,
        }
    }
}

impl From<Register> for Operand {
    fn from(register: Register) -> Self {
        Operand::Register(register)
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Operand::Literal(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(register) => write!(f, "{register}"),
            Operand::Literal(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Transmits the operand's value
    Snd(Operand),
    Set(Register, Operand),
    Add(Register, Operand),
    Mul(Register, Operand),
    /// Truncating remainder, sign follows the dividend
    Mod(Register, Operand),
    /// Receives a value; the exact meaning depends on the execution mode
    Rcv(Operand),
    /// Jumps by the second operand when the first is greater than zero
    Jgz(Operand, Operand),
}

impl Instruction {
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Snd(_) => "snd",
            Instruction::Set(..) => "set",
            Instruction::Add(..) => "add",
            Instruction::Mul(..) => "mul",
            Instruction::Mod(..) => "mod",
            Instruction::Rcv(_) => "rcv",
            Instruction::Jgz(..) => "jgz",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.mnemonic();

        match self {
            Instruction::Snd(x) | Instruction::Rcv(x) => write!(f, "{mnemonic} {x}"),
            Instruction::Set(r, x)
            | Instruction::Add(r, x)
            | Instruction::Mul(r, x)
            | Instruction::Mod(r, x) => write!(f, "{mnemonic} {r} {x}"),
            Instruction::Jgz(x, y) => write!(f, "{mnemonic} {x} {y}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Instruction, Operand};
    use crate::registers::Register;

    #[test]
    fn display() {
        let a = Register::from_token("a").unwrap();

        assert_eq!(Instruction::Snd(a.into()).to_string(), "snd a");
        assert_eq!(Instruction::Mod(a, Operand::Literal(5)).to_string(), "mod a 5");
        assert_eq!(
            Instruction::Jgz(a.into(), Operand::Literal(-2)).to_string(),
            "jgz a -2"
        );
    }
}
