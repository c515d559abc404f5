//! CPU emulation for the UVSim machine.
//!
//! This module implements the accumulator architecture:
//! - A bounds-checked word memory (100 cells historically, 250 extended)
//! - One accumulator register and a program counter
//! - The twelve-instruction BasicML set with fetch-decode-execute dispatch
//! - The IO device boundary used by READ and WRITE

pub mod execute;
pub mod io;
pub mod memory;

pub use execute::{Cpu, CpuError, CpuState, PreviewCell};
pub use io::{ConsoleIo, IoDevice};
pub use memory::{Memory, MemoryError, DEFAULT_CAPACITY, EXTENDED_CAPACITY};
