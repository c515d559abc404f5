//! # UVSim
//!
//! A virtual machine for BasicML, the fixed-width decimal instruction set
//! of the UVSim teaching computer. Every memory cell holds a signed
//! six-digit word that is either an instruction (operation code + operand
//! address) or raw data; the machine is a single-accumulator CPU with a
//! program counter, a fetch-decode-execute loop, and twelve opcodes
//! covering I/O, data movement, arithmetic, and branching.

pub mod cpu;
pub mod program;
pub mod word;

// Re-export commonly used types
pub use cpu::{Cpu, CpuError, CpuState, ConsoleIo, IoDevice, Memory, MemoryError, PreviewCell};
pub use program::{load_into, load_program, save_program, ProgramError};
pub use word::{Opcode, Sign, Word, WordError};
