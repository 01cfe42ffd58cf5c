use std::fmt;

use strum_macros::{Display, EnumString};

/// Operation performed by one core instruction.
///
/// The vocabulary is fixed by ICWS'94. `LDP` and `STP` are recognized so
/// that sources using them get a proper diagnostic, but they are rejected
/// at compile time since no P-space backing store exists.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Opcode {
    DAT,
    MOV,
    ADD,
    SUB,
    MUL,
    DIV,
    MOD,
    JMP,
    JMZ,
    JMN,
    DJN,
    SPL,
    CMP,
    SEQ,
    SNE,
    SLT,
    LDP,
    STP,
    NOP,
}

impl Opcode {
    pub fn is_supported(&self) -> bool {
        !matches!(self, Opcode::LDP | Opcode::STP)
    }

    /// Modifier to use when the source does not spell one out, per the
    /// ICWS'94 defaulting table.
    pub fn default_modifier(&self, a_mode: AddressingMode, b_mode: AddressingMode) -> Modifier {
        use AddressingMode::Immediate;

        match self {
            Opcode::MOV | Opcode::SEQ | Opcode::SNE | Opcode::CMP => {
                if a_mode == Immediate {
                    Modifier::AB
                } else if b_mode == Immediate {
                    Modifier::B
                } else {
                    Modifier::I
                }
            }
            Opcode::ADD | Opcode::SUB | Opcode::MUL | Opcode::DIV | Opcode::MOD => {
                if a_mode == Immediate {
                    Modifier::AB
                } else if b_mode == Immediate {
                    Modifier::B
                } else {
                    Modifier::F
                }
            }
            Opcode::SLT | Opcode::LDP | Opcode::STP => {
                if a_mode == Immediate {
                    Modifier::AB
                } else {
                    Modifier::B
                }
            }
            Opcode::DAT | Opcode::NOP => Modifier::F,
            Opcode::JMP | Opcode::JMZ | Opcode::JMN | Opcode::DJN | Opcode::SPL => Modifier::B,
        }
    }
}

/// Selects which instruction fields an opcode reads and writes.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Modifier {
    A,
    B,
    AB,
    BA,
    F,
    X,
    I,
}

/// How an operand's value is turned into a core address.
///
/// All dereferencing is exactly one hop; the last four modes additionally
/// mutate the pointer cell's corresponding field.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy)]
pub enum AddressingMode {
    /// `#` — resolves to the executing instruction's own address.
    Immediate,
    /// `$` — relative to the executing instruction.
    Direct,
    /// `*` — indirect through the referenced cell's A-field.
    IndirectA,
    /// `@` — indirect through the referenced cell's B-field.
    IndirectB,
    /// `{` — as `*`, but the pointer's A-field is decremented before the
    /// dereference.
    PredecrementA,
    /// `<` — as `@`, with the pre-decrement applied to the B-field.
    PredecrementB,
    /// `}` — as `*`, but the pointer's A-field is incremented after the
    /// address is computed from the old value.
    PostincrementA,
    /// `>` — as `@`, with the post-increment applied to the B-field.
    PostincrementB,
}

impl AddressingMode {
    pub fn from_sigil(c: char) -> Option<AddressingMode> {
        match c {
            '#' => Some(AddressingMode::Immediate),
            '$' => Some(AddressingMode::Direct),
            '*' => Some(AddressingMode::IndirectA),
            '@' => Some(AddressingMode::IndirectB),
            '{' => Some(AddressingMode::PredecrementA),
            '<' => Some(AddressingMode::PredecrementB),
            '}' => Some(AddressingMode::PostincrementA),
            '>' => Some(AddressingMode::PostincrementB),
            _ => None,
        }
    }

    pub fn sigil(&self) -> char {
        match self {
            AddressingMode::Immediate => '#',
            AddressingMode::Direct => '$',
            AddressingMode::IndirectA => '*',
            AddressingMode::IndirectB => '@',
            AddressingMode::PredecrementA => '{',
            AddressingMode::PredecrementB => '<',
            AddressingMode::PostincrementA => '}',
            AddressingMode::PostincrementB => '>',
        }
    }
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sigil())
    }
}

/// One of an instruction's two operand slots.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy)]
pub struct Operand {
    pub mode: AddressingMode,
    pub value: i32,
}

impl Operand {
    pub fn new(mode: AddressingMode, value: i32) -> Self {
        Self { mode, value }
    }

    pub fn direct(value: i32) -> Self {
        Self::new(AddressingMode::Direct, value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.mode, self.value)
    }
}

#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy)]
pub struct Instruction {
    pub opcode: Opcode,
    pub modifier: Modifier,
    pub a: Operand,
    pub b: Operand,
}

impl Instruction {
    pub fn new(opcode: Opcode, modifier: Modifier, a: Operand, b: Operand) -> Self {
        Self {
            opcode,
            modifier,
            a,
            b,
        }
    }
}

/// The initial content of every core cell.
impl Default for Instruction {
    fn default() -> Self {
        Self::new(
            Opcode::DAT,
            Modifier::F,
            Operand::direct(0),
            Operand::direct(0),
        )
    }
}

/// Load-file form, e.g. `MOV.I $0, $1`. Parsing this back through the
/// assembler reproduces the instruction.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} {}, {}", self.opcode, self.modifier, self.a, self.b)
    }
}
