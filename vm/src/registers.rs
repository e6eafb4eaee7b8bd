use std::fmt;

use crate::isa::Operand;

/// Number of addressable registers, one per lowercase letter.
pub const COUNT: usize = 26;

/// Identity register, seeded with the instance id in cooperative runs
pub const P: Register = unsafe { Register::new_unchecked(b'p' - b'a') };

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Register(u8);

impl Register {
    pub const fn new(i: u8) -> Option<Self> {
        if (i as usize) < COUNT {
            Some(Self(i))
        } else {
            None
        }
    }

    /// # Safety
    ///
    /// `i` must be less than [COUNT].
    pub const unsafe fn new_unchecked(i: u8) -> Self {
        Self(i)
    }

    /// Parses a token consisting of exactly one lowercase ASCII letter.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.as_bytes() {
            [letter @ b'a'..=b'z'] => Self::new(letter - b'a'),
            _ => None,
        }
    }

    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    pub const fn name(&self) -> char {
        (b'a' + self.0) as char
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Register file of one execution unit. Every register reads as 0 until written.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Registers {
    registers: [i64; COUNT],
    pc: i64,
}

impl Registers {
    pub fn get(&self, register: Register) -> i64 {
        self.registers[register.as_u8() as usize]
    }

    pub fn set(&mut self, register: Register, value: i64) {
        self.registers[register.as_u8() as usize] = value;
    }

    pub fn resolve(&self, operand: Operand) -> i64 {
        match operand {
            Operand::Register(register) => self.get(register),
            Operand::Literal(value) => value,
        }
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.registers
    }

    pub fn pc(&self) -> i64 {
        self.pc
    }

    pub fn pc_mut(&mut self) -> &mut i64 {
        &mut self.pc
    }
}
