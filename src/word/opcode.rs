//! The BasicML operation code table.
//!
//! A word's high-order three digits form its operation field. Twelve field
//! values name instructions; every other value is a data word (NOOP).

use serde::{Deserialize, Serialize};

/// A BasicML operation.
///
/// `Noop` is the catch-all for operation fields that match no instruction:
/// a data word fetched by the program counter executes as a no-op rather
/// than faulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// Read a word from the input device into memory (code 10).
    Read,
    /// Write a word from memory to the output device (code 11).
    Write,
    /// Load a word from memory into the accumulator (code 20).
    Load,
    /// Store the accumulator into memory (code 21).
    Store,
    /// Add a word from memory to the accumulator (code 30).
    Add,
    /// Subtract a word from memory from the accumulator (code 31).
    Subtract,
    /// Multiply the accumulator by a word from memory (code 32).
    Multiply,
    /// Divide the accumulator by a word from memory (code 33).
    Divide,
    /// Branch unconditionally (code 40).
    Branch,
    /// Branch if the accumulator is negative (code 41).
    BranchNeg,
    /// Branch if the accumulator is zero (code 42).
    BranchZero,
    /// Stop execution (code 43).
    Halt,
    /// Anything else: a data word.
    Noop,
}

impl Opcode {
    /// The twelve instruction opcodes, in code order.
    pub const INSTRUCTIONS: [Opcode; 12] = [
        Opcode::Read,
        Opcode::Write,
        Opcode::Load,
        Opcode::Store,
        Opcode::Add,
        Opcode::Subtract,
        Opcode::Multiply,
        Opcode::Divide,
        Opcode::Branch,
        Opcode::BranchNeg,
        Opcode::BranchZero,
        Opcode::Halt,
    ];

    /// Look up an operation-field value.
    ///
    /// Leading zeros are insignificant, so both the 2-digit form (`10`) and
    /// the canonical 3-digit field (`010`) resolve to the same code. Unknown
    /// values fall through to `Noop`.
    pub fn from_code(code: u32) -> Self {
        match code {
            10 => Opcode::Read,
            11 => Opcode::Write,
            20 => Opcode::Load,
            21 => Opcode::Store,
            30 => Opcode::Add,
            31 => Opcode::Subtract,
            32 => Opcode::Multiply,
            33 => Opcode::Divide,
            40 => Opcode::Branch,
            41 => Opcode::BranchNeg,
            42 => Opcode::BranchZero,
            43 => Opcode::Halt,
            _ => Opcode::Noop,
        }
    }

    /// The numeric operation code, or `None` for `Noop`.
    pub fn code(self) -> Option<u32> {
        match self {
            Opcode::Read => Some(10),
            Opcode::Write => Some(11),
            Opcode::Load => Some(20),
            Opcode::Store => Some(21),
            Opcode::Add => Some(30),
            Opcode::Subtract => Some(31),
            Opcode::Multiply => Some(32),
            Opcode::Divide => Some(33),
            Opcode::Branch => Some(40),
            Opcode::BranchNeg => Some(41),
            Opcode::BranchZero => Some(42),
            Opcode::Halt => Some(43),
            Opcode::Noop => None,
        }
    }

    /// The symbolic instruction name.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Read => "READ",
            Opcode::Write => "WRITE",
            Opcode::Load => "LOAD",
            Opcode::Store => "STORE",
            Opcode::Add => "ADD",
            Opcode::Subtract => "SUBTRACT",
            Opcode::Multiply => "MULTIPLY",
            Opcode::Divide => "DIVIDE",
            Opcode::Branch => "BRANCH",
            Opcode::BranchNeg => "BRANCHNEG",
            Opcode::BranchZero => "BRANCHZERO",
            Opcode::Halt => "HALT",
            Opcode::Noop => "NOOP",
        }
    }

    /// Whether this is one of the twelve instructions (not `Noop`).
    pub fn is_instruction(self) -> bool {
        self != Opcode::Noop
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
