//! Assembly line parser.
//!
//! Accepts `OPCODE op1, op2, op3` with optional commas. The opcode's
//! [`Format`] decides whether each position is a register, a literal or an
//! `offset(base)` memory reference, so a bare `8` is register 8 in a register
//! slot and the number 8 in a literal slot.

use crate::common::error::ParseError;
use crate::isa::abi::Reg;
use crate::isa::instruction::Operand;
use crate::isa::opcode::{Format, Opcode};

#[derive(Clone, Copy)]
enum Slot {
    Reg,
    Imm,
    Mem,
}

const fn slots(format: Format) -> &'static [Slot] {
    match format {
        Format::Register => &[Slot::Reg, Slot::Reg, Slot::Reg],
        Format::Immediate | Format::Branch => &[Slot::Reg, Slot::Reg, Slot::Imm],
        Format::Load | Format::Store => &[Slot::Reg, Slot::Mem],
        Format::Jump => &[Slot::Imm],
        Format::JumpRegister => &[Slot::Reg],
        Format::None => &[],
    }
}

/// Removes a trailing `#` or `;` comment.
pub fn strip_comment(line: &str) -> &str {
    line.find(['#', ';']).map_or(line, |pos| &line[..pos])
}

/// Parses a signed literal in decimal or `0x` hexadecimal.
pub fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = if let Some(hex) = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        body.parse::<i64>().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

fn parse_reg(token: &str, line: usize) -> Result<Reg, ParseError> {
    Reg::parse(token).map_err(|source| ParseError::InvalidRegister { line, source })
}

fn parse_mem(token: &str, line: usize) -> Result<Operand, ParseError> {
    let invalid = || ParseError::InvalidOperand {
        line,
        operand: token.to_string(),
    };
    let open = token.find('(').ok_or_else(invalid)?;
    let close = token.rfind(')').ok_or_else(invalid)?;
    if close < open || !token[close + 1..].trim().is_empty() {
        return Err(invalid());
    }
    let offset_text = token[..open].trim();
    let offset = if offset_text.is_empty() {
        0
    } else {
        parse_int(offset_text).ok_or_else(invalid)?
    };
    let base = parse_reg(&token[open + 1..close], line)?;
    Ok(Operand::Mem { offset, base })
}

/// Parses one instruction line into its opcode and operands.
///
/// `line` is the 1-based source line used in error reports.
///
/// # Errors
///
/// Returns a [`ParseError`] for an unknown mnemonic, a wrong operand count,
/// a bad register name or an unparsable operand.
pub fn parse_line(text: &str, line: usize) -> Result<(Opcode, Vec<Operand>), ParseError> {
    let text = strip_comment(text).trim();
    let (mnemonic, rest) = text
        .split_once(char::is_whitespace)
        .unwrap_or((text, ""));
    let opcode: Opcode = mnemonic.parse().map_err(|_| ParseError::UnknownOpcode {
        line,
        mnemonic: mnemonic.to_string(),
    })?;

    let tokens: Vec<&str> = rest
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();
    let expected = slots(opcode.format());
    if tokens.len() != expected.len() {
        return Err(ParseError::OperandCount {
            line,
            opcode,
            expected: expected.len(),
            found: tokens.len(),
        });
    }

    let mut operands = Vec::with_capacity(tokens.len());
    for (token, slot) in tokens.iter().zip(expected) {
        let operand = match slot {
            Slot::Reg => Operand::Reg(parse_reg(token, line)?),
            Slot::Imm => Operand::Imm(parse_int(token).ok_or_else(|| {
                ParseError::InvalidOperand {
                    line,
                    operand: (*token).to_string(),
                }
            })?),
            Slot::Mem => parse_mem(token, line)?,
        };
        operands.push(operand);
    }
    Ok((opcode, operands))
}
