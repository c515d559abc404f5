//! The fixed-width signed decimal word.
//!
//! A [`Word`] is the unit of UVSim memory and the accumulator: a sign plus
//! exactly six decimal digits. The high three digits are the operation
//! field, the low three the operand field. A word whose operation field
//! matches one of the twelve BasicML codes is an instruction; anything else
//! is data (NOOP).

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::word::Opcode;

/// The sign of a word.
///
/// Kept separate from the magnitude so that `-000000` survives a
/// parse/format round trip; value comparisons still treat it as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    /// The sign of a raw integer result. Zero is positive.
    pub fn of(value: i64) -> Self {
        if value < 0 {
            Sign::Minus
        } else {
            Sign::Plus
        }
    }

    /// The textual form, `'+'` or `'-'`.
    pub fn as_char(self) -> char {
        match self {
            Sign::Plus => '+',
            Sign::Minus => '-',
        }
    }
}

/// A signed six-digit decimal word.
///
/// Immutable once constructed; arithmetic produces new words. The canonical
/// textual form is always sign + 6 digits, e.g. `+010007` (READ 007) or
/// `-001234` (a data word).
#[derive(Clone, Copy, Serialize, Deserialize)]
pub struct Word {
    sign: Sign,
    magnitude: u32,
}

impl Word {
    /// Largest magnitude a word can hold.
    pub const MAX_MAGNITUDE: u32 = 999_999;

    /// The canonical zero word, `+000000`.
    pub const ZERO: Word = Word {
        sign: Sign::Plus,
        magnitude: 0,
    };

    /// Create the canonical zero word.
    #[inline]
    pub const fn zero() -> Self {
        Self::ZERO
    }

    /// Create a word from a signed integer.
    ///
    /// Fails if the magnitude exceeds six digits. Arithmetic overflow is
    /// handled separately (see [`crate::word::arith`]); this constructor is
    /// for external values, which must already fit.
    pub fn from_int(value: i64) -> Result<Self, WordError> {
        if value.unsigned_abs() > Self::MAX_MAGNITUDE as u64 {
            return Err(WordError::OutOfRange(value));
        }
        Ok(Self {
            sign: Sign::of(value),
            magnitude: value.unsigned_abs() as u32,
        })
    }

    /// Assemble a word from an already-validated sign and magnitude.
    ///
    /// Used by the arithmetic wraparound path, which may produce `-000000`.
    pub(crate) fn from_parts(sign: Sign, magnitude: u32) -> Self {
        debug_assert!(magnitude <= Self::MAX_MAGNITUDE);
        Self { sign, magnitude }
    }

    /// The word's sign as written.
    #[inline]
    pub fn sign(&self) -> Sign {
        self.sign
    }

    /// The signed integer value, in `-999999..=999999`.
    #[inline]
    pub fn numeric_value(&self) -> i32 {
        match self.sign {
            Sign::Plus => self.magnitude as i32,
            Sign::Minus => -(self.magnitude as i32),
        }
    }

    /// True if the numeric value is zero (regardless of written sign).
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.magnitude == 0
    }

    /// The operation field: the high three digits as an integer.
    #[inline]
    pub fn operation_field(&self) -> u32 {
        self.magnitude / 1_000
    }

    /// The operand field: the low three digits, zero-padded.
    pub fn operand_field(&self) -> String {
        format!("{:03}", self.magnitude % 1_000)
    }

    /// The operand field as a memory address.
    #[inline]
    pub fn operand_address(&self) -> usize {
        (self.magnitude % 1_000) as usize
    }

    /// The operation this word decodes to.
    ///
    /// Decoding reads the digit body only, so `-004300` is still HALT.
    #[inline]
    pub fn opcode(&self) -> Opcode {
        Opcode::from_code(self.operation_field())
    }

    /// Whether this word decodes to one of the twelve instructions.
    #[inline]
    pub fn is_instruction(&self) -> bool {
        self.opcode().is_instruction()
    }

    /// The canonical textual form: sign + 6 digits.
    pub fn raw_form(&self) -> String {
        format!("{}{:06}", self.sign.as_char(), self.magnitude)
    }

    /// A human-readable rendering: `"READ 042"` for instructions, `"NOOP"`
    /// for data words.
    pub fn human_readable(&self) -> String {
        let op = self.opcode();
        if op.is_instruction() {
            format!("{} {}", op.name(), self.operand_field())
        } else {
            op.name().to_string()
        }
    }

    /// Widen a 4-digit body to the canonical 6 digits.
    ///
    /// A 4-digit value splits into a 2-digit code and a 2-digit operand. If
    /// the code names an instruction, each field gets a leading zero
    /// (`1007` becomes `010007`); otherwise the whole value is data and
    /// shifts into the low four digits (`7777` becomes `007777`).
    fn upconvert(body: &str) -> String {
        let (code, operand) = body.split_at(2);
        // 2-digit ASCII parse cannot fail here; the caller has already
        // checked every character is a digit.
        let is_known = code
            .parse::<u32>()
            .map(|c| Opcode::from_code(c).is_instruction())
            .unwrap_or(false);
        if is_known {
            format!("0{}0{}", code, operand)
        } else {
            format!("00{}", body)
        }
    }
}

impl FromStr for Word {
    type Err = WordError;

    /// Parse a textual word.
    ///
    /// The input is trimmed; a missing sign defaults to `+`. The body must
    /// be exactly 4 or 6 ASCII digits; 4-digit bodies are upconverted.
    fn from_str(s: &str) -> Result<Self, WordError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(WordError::Empty);
        }

        let (sign, body) = match s.strip_prefix('+') {
            Some(rest) => (Sign::Plus, rest),
            None => match s.strip_prefix('-') {
                Some(rest) => (Sign::Minus, rest),
                None => (Sign::Plus, s),
            },
        };

        if body.is_empty() {
            return Err(WordError::Empty);
        }
        if let Some(bad) = body.chars().find(|c| !c.is_ascii_digit()) {
            return Err(WordError::InvalidDigit(bad));
        }

        let canonical = match body.len() {
            6 => body.to_string(),
            4 => Self::upconvert(body),
            got => return Err(WordError::WrongLength { got }),
        };

        let magnitude = canonical
            .parse::<u32>()
            .map_err(|_| WordError::WrongLength { got: canonical.len() })?;

        Ok(Self { sign, magnitude })
    }
}

impl Default for Word {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialEq for Word {
    fn eq(&self, other: &Self) -> bool {
        self.numeric_value() == other.numeric_value()
    }
}

impl Eq for Word {}

impl Hash for Word {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.numeric_value().hash(state);
    }
}

impl PartialOrd for Word {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Word {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numeric_value().cmp(&other.numeric_value())
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:06}", self.sign.as_char(), self.magnitude)
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({} = {})", self.raw_form(), self.human_readable())
    }
}

/// Errors from constructing or dividing words.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordError {
    /// The input had no digits after trimming and sign removal.
    #[error("empty word")]
    Empty,

    /// The digit body was neither 4 nor 6 characters.
    #[error("word body must be 4 or 6 digits, got {got}")]
    WrongLength { got: usize },

    /// A non-digit character appeared in the body.
    #[error("invalid character '{0}' in word (expected a decimal digit)")]
    InvalidDigit(char),

    /// An integer too large for six digits.
    #[error("value {0} out of range for a six-digit word")]
    OutOfRange(i64),

    /// Division by a zero-valued word.
    #[error("division by zero")]
    DivisionByZero,
}
