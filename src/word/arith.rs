//! Overflow-wrapping arithmetic on six-digit words.
//!
//! All four operations compute the exact integer result, then apply the
//! wraparound policy: when the magnitude exceeds six digits, keep the last
//! six decimal digits and the sign of the raw result. Overflow is defined
//! behavior, never an error; only division by zero fails.

use crate::word::{Sign, Word, WordError};

/// Wrap a raw integer result into a word.
///
/// The magnitude is reduced modulo 10^6; the sign is taken from the raw
/// result before truncation, so `999999 + 2` wraps to `+000001` and
/// `-999999 - 2` wraps to `-000001`.
fn wrap(raw: i64) -> Word {
    let magnitude = (raw.unsigned_abs() % 1_000_000) as u32;
    Word::from_parts(Sign::of(raw), magnitude)
}

/// Add two words with wraparound.
pub fn add(a: Word, b: Word) -> Word {
    wrap(a.numeric_value() as i64 + b.numeric_value() as i64)
}

/// Subtract `b` from `a` with wraparound.
pub fn subtract(a: Word, b: Word) -> Word {
    wrap(a.numeric_value() as i64 - b.numeric_value() as i64)
}

/// Multiply two words with wraparound.
pub fn multiply(a: Word, b: Word) -> Word {
    wrap(a.numeric_value() as i64 * b.numeric_value() as i64)
}

/// Divide `a` by `b`.
///
/// Fails with [`WordError::DivisionByZero`] when the divisor is zero. The
/// quotient uses integer division truncating toward zero, so
/// `-7 / 2 == -3`. The result is wrapped like every other operation, though
/// a quotient of two in-range words can never overflow.
pub fn divide(a: Word, b: Word) -> Result<Word, WordError> {
    if b.is_zero() {
        return Err(WordError::DivisionByZero);
    }
    Ok(wrap(a.numeric_value() as i64 / b.numeric_value() as i64))
}

impl std::ops::Add for Word {
    type Output = Word;

    fn add(self, rhs: Word) -> Word {
        add(self, rhs)
    }
}

impl std::ops::Sub for Word {
    type Output = Word;

    fn sub(self, rhs: Word) -> Word {
        subtract(self, rhs)
    }
}

impl std::ops::Mul for Word {
    type Output = Word;

    fn mul(self, rhs: Word) -> Word {
        multiply(self, rhs)
    }
}

impl std::ops::Neg for Word {
    type Output = Word;

    fn neg(self) -> Word {
        wrap(-(self.numeric_value() as i64))
    }
}
