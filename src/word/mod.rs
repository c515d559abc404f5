//! Signed six-digit decimal words, the unit of BasicML memory and computation.
//!
//! This module provides the core value types:
//! - [`Word`] - An immutable signed six-digit value (instruction or data)
//! - [`Opcode`] - The twelve BasicML operation codes plus the NOOP default
//! - [`arith`] - Overflow-wrapping word arithmetic

mod opcode;
mod value;
pub mod arith;

pub use opcode::Opcode;
pub use value::{Sign, Word, WordError};
pub use arith::{add, divide, multiply, subtract};
