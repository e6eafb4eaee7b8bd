use std::str::{FromStr, SplitWhitespace};

use anyhow::Context;
use thiserror::Error;

use crate::{
    isa::{Instruction, Operand},
    registers::Register,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unknown opcode in '{line}'")]
    UnknownOpcode { line: String },
    #[error("Malformed operand '{operand}' in '{line}'")]
    MalformedOperand { operand: String, line: String },
    #[error("Missing operand in '{line}'")]
    MissingOperand { line: String },
    #[error("Unexpected operand '{operand}' in '{line}'")]
    UnexpectedOperand { operand: String, line: String },
}

struct Tokens<'a> {
    line: &'a str,
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            line,
            inner: line.split_whitespace(),
        }
    }

    fn next(&mut self) -> Result<&'a str, DecodeError> {
        self.inner.next().ok_or_else(|| DecodeError::MissingOperand {
            line: self.line.to_owned(),
        })
    }

    fn malformed(&self, operand: &str) -> DecodeError {
        DecodeError::MalformedOperand {
            operand: operand.to_owned(),
            line: self.line.to_owned(),
        }
    }

    fn finish(mut self) -> Result<(), DecodeError> {
        match self.inner.next() {
            Some(operand) => Err(DecodeError::UnexpectedOperand {
                operand: operand.to_owned(),
                line: self.line.to_owned(),
            }),
            None => Ok(()),
        }
    }
}

fn fetch_register(tokens: &mut Tokens) -> Result<Register, DecodeError> {
    let token = tokens.next()?;

    Register::from_token(token).ok_or_else(|| tokens.malformed(token))
}

fn fetch_operand(tokens: &mut Tokens) -> Result<Operand, DecodeError> {
    let token = tokens.next()?;

    if let Some(register) = Register::from_token(token) {
        return Ok(Operand::Register(register));
    }

    token
        .parse::<i64>()
        .map(Operand::Literal)
        .map_err(|_| tokens.malformed(token))
}

fn fetch_unary(
    tokens: &mut Tokens,
    make: fn(Operand) -> Instruction,
) -> Result<Instruction, DecodeError> {
    Ok(make(fetch_operand(tokens)?))
}

fn fetch_binary(
    tokens: &mut Tokens,
    make: fn(Register, Operand) -> Instruction,
) -> Result<Instruction, DecodeError> {
    let target = fetch_register(tokens)?;
    let source = fetch_operand(tokens)?;

    Ok(make(target, source))
}

/// Decodes one source line, e.g. `add a -3`.
pub fn decode(line: &str) -> Result<Instruction, DecodeError> {
    let mut tokens = Tokens::new(line);

    let opcode = tokens.next().map_err(|_| DecodeError::UnknownOpcode {
        line: line.to_owned(),
    })?;

    let instruction = match opcode {
        "snd" => fetch_unary(&mut tokens, Instruction::Snd)?,
        "set" => fetch_binary(&mut tokens, Instruction::Set)?,
        "add" => fetch_binary(&mut tokens, Instruction::Add)?,
        "mul" => fetch_binary(&mut tokens, Instruction::Mul)?,
        "mod" => fetch_binary(&mut tokens, Instruction::Mod)?,
        "rcv" => fetch_unary(&mut tokens, Instruction::Rcv)?,
        "jgz" => {
            let condition = fetch_operand(&mut tokens)?;
            let offset = fetch_operand(&mut tokens)?;

            Instruction::Jgz(condition, offset)
        }
        _ => {
            return Err(DecodeError::UnknownOpcode {
                line: line.to_owned(),
            })
        }
    };

    tokens.finish()?;

    Ok(instruction)
}

impl FromStr for Instruction {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

/// Decodes a whole program, one instruction per non-blank line.
pub fn decode_program(source: &str) -> Result<Vec<Instruction>, anyhow::Error> {
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            decode(line).with_context(|| format!("Failed to decode line {}", i + 1))
        })
        .collect()
}
