//! Opcode table.
//!
//! Every supported operation is a variant of the closed [`Opcode`] enum. All
//! static properties of an opcode (category, operand format, functional-unit
//! class, base latency, memory width) are answered by exhaustive matches so a
//! new opcode cannot be added without deciding each of them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operation code of an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(missing_docs)]
pub enum Opcode {
    Add,
    Sub,
    Mul,
    Div,
    Addi,
    Subi,
    And,
    Or,
    Xor,
    Slt,
    Andi,
    Ori,
    Xori,
    Slti,
    Lw,
    Lh,
    Lb,
    Sw,
    Sh,
    Sb,
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
    J,
    Jal,
    Jr,
    Jalr,
    Fadd,
    Fsub,
    Fmul,
    Fdiv,
    Nop,
}

/// Broad instruction category used for statistics and routing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Integer add/sub/mul/div.
    Arithmetic,
    /// Bitwise operations and set-less-than.
    Logical,
    /// Loads and stores.
    Memory,
    /// Conditional branches.
    Branch,
    /// Unconditional jumps.
    Jump,
    /// Floating-point arithmetic.
    Float,
    /// No operation.
    Nop,
}

/// Operand layout of an opcode in assembly text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// `op rd, rs1, rs2`
    Register,
    /// `op rd, rs1, imm`
    Immediate,
    /// `op rd, offset(base)`
    Load,
    /// `op rs2, offset(base)`
    Store,
    /// `op rs1, rs2, offset` with the offset counted in instructions.
    Branch,
    /// `op target` with an absolute byte address.
    Jump,
    /// `op rs`
    JumpRegister,
    /// No operands.
    None,
}

impl Format {
    /// Number of comma-separated operands this format expects.
    pub const fn operand_count(self) -> usize {
        match self {
            Self::Register | Self::Immediate | Self::Branch => 3,
            Self::Load | Self::Store => 2,
            Self::Jump | Self::JumpRegister => 1,
            Self::None => 0,
        }
    }
}

/// Functional-unit class that executes an opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    /// Integer ALU; also resolves branches and jumps.
    #[serde(rename = "ALU")]
    Alu,
    /// Floating-point unit.
    #[serde(rename = "FPU")]
    Fpu,
    /// Load/store unit.
    #[serde(rename = "LSU")]
    Lsu,
}

impl UnitKind {
    /// All unit classes in display order.
    pub const ALL: [Self; 3] = [Self::Alu, Self::Fpu, Self::Lsu];

    /// Short upper-case name, also the prefix of unit instance names.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Alu => "ALU",
            Self::Fpu => "FPU",
            Self::Lsu => "LSU",
        }
    }

    /// Dense index for per-class arrays.
    pub const fn index(self) -> usize {
        match self {
            Self::Alu => 0,
            Self::Fpu => 1,
            Self::Lsu => 2,
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Access width of a load or store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MemWidth {
    /// 1 byte.
    Byte,
    /// 2 bytes.
    Half,
    /// 4 bytes.
    #[default]
    Word,
}

impl MemWidth {
    /// Width in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Half => 2,
            Self::Word => 4,
        }
    }

    /// Sign-extends a raw little-endian value of this width to 64 bits.
    pub const fn sign_extend(self, raw: u64) -> u64 {
        match self {
            Self::Byte => raw as u8 as i8 as i64 as u64,
            Self::Half => raw as u16 as i16 as i64 as u64,
            Self::Word => raw as u32 as i32 as i64 as u64,
        }
    }
}

impl Opcode {
    /// Every opcode, in table order.
    pub const ALL: [Self; 35] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Addi,
        Self::Subi,
        Self::And,
        Self::Or,
        Self::Xor,
        Self::Slt,
        Self::Andi,
        Self::Ori,
        Self::Xori,
        Self::Slti,
        Self::Lw,
        Self::Lh,
        Self::Lb,
        Self::Sw,
        Self::Sh,
        Self::Sb,
        Self::Beq,
        Self::Bne,
        Self::Blt,
        Self::Bge,
        Self::Bltu,
        Self::Bgeu,
        Self::J,
        Self::Jal,
        Self::Jr,
        Self::Jalr,
        Self::Fadd,
        Self::Fsub,
        Self::Fmul,
        Self::Fdiv,
        Self::Nop,
    ];

    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::Addi => "ADDI",
            Self::Subi => "SUBI",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Slt => "SLT",
            Self::Andi => "ANDI",
            Self::Ori => "ORI",
            Self::Xori => "XORI",
            Self::Slti => "SLTI",
            Self::Lw => "LW",
            Self::Lh => "LH",
            Self::Lb => "LB",
            Self::Sw => "SW",
            Self::Sh => "SH",
            Self::Sb => "SB",
            Self::Beq => "BEQ",
            Self::Bne => "BNE",
            Self::Blt => "BLT",
            Self::Bge => "BGE",
            Self::Bltu => "BLTU",
            Self::Bgeu => "BGEU",
            Self::J => "J",
            Self::Jal => "JAL",
            Self::Jr => "JR",
            Self::Jalr => "JALR",
            Self::Fadd => "FADD",
            Self::Fsub => "FSUB",
            Self::Fmul => "FMUL",
            Self::Fdiv => "FDIV",
            Self::Nop => "NOP",
        }
    }

    /// Instruction category.
    pub const fn category(self) -> Category {
        match self {
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Addi | Self::Subi => {
                Category::Arithmetic
            }
            Self::And
            | Self::Or
            | Self::Xor
            | Self::Slt
            | Self::Andi
            | Self::Ori
            | Self::Xori
            | Self::Slti => Category::Logical,
            Self::Lw | Self::Lh | Self::Lb | Self::Sw | Self::Sh | Self::Sb => Category::Memory,
            Self::Beq | Self::Bne | Self::Blt | Self::Bge | Self::Bltu | Self::Bgeu => {
                Category::Branch
            }
            Self::J | Self::Jal | Self::Jr | Self::Jalr => Category::Jump,
            Self::Fadd | Self::Fsub | Self::Fmul | Self::Fdiv => Category::Float,
            Self::Nop => Category::Nop,
        }
    }

    /// Operand layout.
    pub const fn format(self) -> Format {
        match self {
            Self::Add
            | Self::Sub
            | Self::Mul
            | Self::Div
            | Self::And
            | Self::Or
            | Self::Xor
            | Self::Slt
            | Self::Fadd
            | Self::Fsub
            | Self::Fmul
            | Self::Fdiv => Format::Register,
            Self::Addi | Self::Subi | Self::Andi | Self::Ori | Self::Xori | Self::Slti => {
                Format::Immediate
            }
            Self::Lw | Self::Lh | Self::Lb => Format::Load,
            Self::Sw | Self::Sh | Self::Sb => Format::Store,
            Self::Beq | Self::Bne | Self::Blt | Self::Bge | Self::Bltu | Self::Bgeu => {
                Format::Branch
            }
            Self::J | Self::Jal => Format::Jump,
            Self::Jr | Self::Jalr => Format::JumpRegister,
            Self::Nop => Format::None,
        }
    }

    /// Functional-unit class that executes this opcode.
    pub const fn unit(self) -> UnitKind {
        match self.category() {
            Category::Memory => UnitKind::Lsu,
            Category::Float => UnitKind::Fpu,
            Category::Arithmetic
            | Category::Logical
            | Category::Branch
            | Category::Jump
            | Category::Nop => UnitKind::Alu,
        }
    }

    /// Base execution latency in cycles.
    pub const fn latency(self) -> u32 {
        match self {
            Self::Mul | Self::Fadd | Self::Fsub => 3,
            Self::Div => 10,
            Self::Fmul => 5,
            Self::Fdiv => 15,
            Self::Lw | Self::Lh | Self::Lb | Self::Sw | Self::Sh | Self::Sb => 2,
            _ => 1,
        }
    }

    /// Memory access width for loads and stores.
    pub const fn width(self) -> Option<MemWidth> {
        match self {
            Self::Lw | Self::Sw => Some(MemWidth::Word),
            Self::Lh | Self::Sh => Some(MemWidth::Half),
            Self::Lb | Self::Sb => Some(MemWidth::Byte),
            _ => None,
        }
    }

    /// Returns true for loads.
    #[inline]
    pub const fn is_load(self) -> bool {
        matches!(self.format(), Format::Load)
    }

    /// Returns true for stores.
    #[inline]
    pub const fn is_store(self) -> bool {
        matches!(self.format(), Format::Store)
    }

    /// Returns true for branches and jumps.
    #[inline]
    pub const fn is_control(self) -> bool {
        matches!(self.category(), Category::Branch | Category::Jump)
    }

    /// Returns true for conditional branches.
    #[inline]
    pub const fn is_conditional(self) -> bool {
        matches!(self.category(), Category::Branch)
    }

    /// Returns true for `DIV` and `FDIV`.
    #[inline]
    pub const fn is_divide(self) -> bool {
        matches!(self, Self::Div | Self::Fdiv)
    }

    /// Returns true when the opcode writes the return-address register.
    #[inline]
    pub const fn links(self) -> bool {
        matches!(self, Self::Jal | Self::Jalr)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Error returned when a mnemonic names no supported opcode.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown opcode `{0}`")]
pub struct UnknownOpcode(pub String);

impl FromStr for Opcode {
    type Err = UnknownOpcode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic() == upper)
            .ok_or_else(|| UnknownOpcode(s.trim().to_string()))
    }
}
