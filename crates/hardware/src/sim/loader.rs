//! Program loader.
//!
//! Reads assembly text into a [`Program`]: one instruction per line, laid out
//! from address 0 with a 4-byte stride. Blank lines, `#`/`;` comments,
//! assembler directives (`.text`, `.data`, ...) and labels (`loop:`) occupy no
//! address. A label may share its line with an instruction.

use std::fs;
use std::path::Path;

use crate::common::error::{ParseError, SimError};
use crate::isa::instruction::{InstId, Instruction, Operand};
use crate::isa::opcode::Opcode;
use crate::isa::parse;

/// One decoded source line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramLine {
    /// Byte address of the instruction.
    pub pc: u64,
    /// 1-based line number in the source.
    pub line: usize,
    /// Operation.
    pub opcode: Opcode,
    /// Operands as written.
    pub operands: Vec<Operand>,
}

impl ProgramLine {
    /// Creates a fetched [`Instruction`] for this line with sequence id `id`.
    pub fn instantiate(&self, id: InstId) -> Instruction {
        Instruction::new(id, self.pc, self.opcode, self.operands.clone())
    }
}

/// A parsed program.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    lines: Vec<ProgramLine>,
}

impl Program {
    /// Parses assembly source.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParseError`], reporting its 1-based source line.
    ///
    /// # Examples
    ///
    /// ```
    /// use sspsim_core::sim::loader::Program;
    ///
    /// let program = Program::parse("# demo\nADD $t0, $t1, $t2\nloop: SUB $t3, $t0, $t1\n").unwrap();
    /// assert_eq!(program.len(), 2);
    /// assert_eq!(program.get(4).map(|l| l.line), Some(3));
    /// ```
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let mut lines = Vec::new();
        for (idx, raw) in source.lines().enumerate() {
            let mut text = parse::strip_comment(raw).trim();
            if let Some((label, rest)) = text.split_once(':')
                && is_label(label)
            {
                text = rest.trim();
            }
            if text.is_empty() || text.starts_with('.') {
                continue;
            }
            let line = idx + 1;
            let (opcode, operands) = parse::parse_line(text, line)?;
            lines.push(ProgramLine {
                pc: 4 * lines.len() as u64,
                line,
                opcode,
                operands,
            });
        }
        tracing::info!(instructions = lines.len(), "program parsed");
        Ok(Self { lines })
    }

    /// Reads and parses the program at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Io`] if the file cannot be read, or
    /// [`SimError::Parse`] if it is malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&source)?)
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The instruction at byte address `pc`, if any.
    pub fn get(&self, pc: u64) -> Option<&ProgramLine> {
        if pc % 4 != 0 {
            return None;
        }
        usize::try_from(pc / 4).ok().and_then(|i| self.lines.get(i))
    }

    /// Address one past the last instruction.
    pub fn end_pc(&self) -> u64 {
        4 * self.lines.len() as u64
    }

    /// All instructions in address order.
    pub fn iter(&self) -> impl Iterator<Item = &ProgramLine> {
        self.lines.iter()
    }
}

fn is_label(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}
