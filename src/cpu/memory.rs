//! UVSim memory subsystem.
//!
//! Memory is a sparse, bounds-checked store of words over a fixed address
//! range. The historical machine had 100 cells; later variants extended
//! that to 250. Unwritten cells read as the canonical zero word, so the
//! store behaves as if every cell were pre-initialized to `+000000`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::word::Word;

/// The historical memory size: 100 words.
pub const DEFAULT_CAPACITY: usize = 100;

/// The extended memory size used by later variants: 250 words.
pub const EXTENDED_CAPACITY: usize = 250;

/// Sparse word store addressable over `[0, capacity)`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    capacity: usize,
    cells: BTreeMap<usize, Word>,
}

impl Memory {
    /// Create an empty memory with the historical 100-word capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty memory with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            cells: BTreeMap::new(),
        }
    }

    /// Create a memory pre-loaded with `words` at addresses `0..words.len()`.
    pub fn from_words(capacity: usize, words: &[Word]) -> Result<Self, MemoryError> {
        let mut mem = Self::with_capacity(capacity);
        mem.reload(words)?;
        Ok(mem)
    }

    /// The addressable range is `[0, capacity)`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of addresses explicitly written (not the capacity).
    ///
    /// A cell written with a zero word still counts as written.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if no address has been written.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Read the word at `address`.
    ///
    /// Unwritten in-range addresses yield the zero word; only an address
    /// outside `[0, capacity)` is an error.
    pub fn read(&self, address: usize) -> Result<Word, MemoryError> {
        self.check(address)?;
        Ok(self.cells.get(&address).copied().unwrap_or_default())
    }

    /// Write `value` at `address`, overwriting unconditionally.
    pub fn write(&mut self, address: usize, value: Word) -> Result<(), MemoryError> {
        self.check(address)?;
        self.cells.insert(address, value);
        Ok(())
    }

    /// Write `value` at the append cursor and return the address used.
    ///
    /// The cursor is one past the highest address ever written (0 when
    /// nothing has been), not the first zero-valued cell. Fails with
    /// [`MemoryError::MemoryFull`] when the cursor leaves the range.
    pub fn write_next(&mut self, value: Word) -> Result<usize, MemoryError> {
        let address = self.next_free();
        if address >= self.capacity {
            return Err(MemoryError::MemoryFull {
                capacity: self.capacity,
            });
        }
        self.cells.insert(address, value);
        Ok(address)
    }

    /// The append cursor: highest written address + 1, or 0.
    pub fn next_free(&self) -> usize {
        self.cells
            .last_key_value()
            .map(|(&addr, _)| addr + 1)
            .unwrap_or(0)
    }

    /// Forget every written cell.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Replace the entire contents with `words` at addresses `0..len`.
    pub fn reload(&mut self, words: &[Word]) -> Result<(), MemoryError> {
        if words.len() > self.capacity {
            return Err(MemoryError::ProgramTooLarge {
                size: words.len(),
                capacity: self.capacity,
            });
        }
        self.cells.clear();
        for (address, &word) in words.iter().enumerate() {
            self.cells.insert(address, word);
        }
        Ok(())
    }

    /// A read-only window of `min(size, capacity)` contiguous cells around
    /// `center`.
    ///
    /// When centering would push the window past either end of the range,
    /// the whole window shifts to stay inside `[0, capacity)`, so the
    /// result always has exactly `min(size, capacity)` entries. Entries are
    /// `(address, word)` pairs in address order; unwritten cells appear as
    /// zero words.
    pub fn preview(&self, center: usize, size: usize) -> Result<Vec<(usize, Word)>, MemoryError> {
        self.check(center)?;
        let size = size.min(self.capacity);
        let mut start = center.saturating_sub(size / 2);
        if start + size > self.capacity {
            start = self.capacity - size;
        }
        Ok((start..start + size)
            .map(|addr| (addr, self.cells.get(&addr).copied().unwrap_or_default()))
            .collect())
    }

    /// The highest address holding a non-zero word, if any. Used by the
    /// program saver to omit trailing zeros.
    pub fn highest_nonzero(&self) -> Option<usize> {
        self.cells
            .iter()
            .rev()
            .find(|(_, word)| !word.is_zero())
            .map(|(&addr, _)| addr)
    }

    fn check(&self, address: usize) -> Result<(), MemoryError> {
        if address >= self.capacity {
            return Err(MemoryError::AddressOutOfRange {
                address,
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("capacity", &self.capacity)
            .field("written_cells", &self.cells.len())
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Address outside `[0, capacity)`.
    #[error("memory address {address} out of range (capacity {capacity})")]
    AddressOutOfRange { address: usize, capacity: usize },

    /// The append cursor has reached the end of the range.
    #[error("memory full ({capacity} words)")]
    MemoryFull { capacity: usize },

    /// An initial sequence longer than the addressable range.
    #[error("program of {size} words exceeds memory capacity {capacity}")]
    ProgramTooLarge { size: usize, capacity: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn word(s: &str) -> Word {
        s.parse().unwrap()
    }

    #[test]
    fn test_unwritten_cells_read_as_zero() {
        for capacity in [1, DEFAULT_CAPACITY, EXTENDED_CAPACITY] {
            let mem = Memory::with_capacity(capacity);
            for addr in 0..capacity {
                assert_eq!(mem.read(addr).unwrap(), Word::zero());
            }
        }
    }

    #[test]
    fn test_read_write() {
        let mut mem = Memory::new();
        mem.write(10, word("+001234")).unwrap();
        assert_eq!(mem.read(10).unwrap(), word("+001234"));
        mem.write(10, word("-005678")).unwrap();
        assert_eq!(mem.read(10).unwrap(), word("-005678"));
        assert_eq!(mem.len(), 1);
    }

    #[test]
    fn test_bounds() {
        for capacity in [DEFAULT_CAPACITY, EXTENDED_CAPACITY] {
            let mut mem = Memory::with_capacity(capacity);
            assert!(mem.read(capacity - 1).is_ok());
            assert_eq!(
                mem.read(capacity),
                Err(MemoryError::AddressOutOfRange {
                    address: capacity,
                    capacity
                })
            );
            assert!(mem.write(capacity, Word::zero()).is_err());
        }
    }

    #[test]
    fn test_write_next_appends_past_highest() {
        let mut mem = Memory::new();
        assert_eq!(mem.write_next(word("+001111")).unwrap(), 0);
        assert_eq!(mem.write_next(word("+002222")).unwrap(), 1);
        // An explicit write moves the cursor past its address.
        mem.write(50, word("+003333")).unwrap();
        assert_eq!(mem.write_next(word("+004444")).unwrap(), 51);
    }

    #[test]
    fn test_zero_valued_write_counts_as_written() {
        let mut mem = Memory::new();
        mem.write(0, Word::zero()).unwrap();
        assert_eq!(mem.len(), 1);
        assert_eq!(mem.next_free(), 1);
        assert_eq!(mem.write_next(word("+000001")).unwrap(), 1);
    }

    #[test]
    fn test_write_next_full() {
        let mut mem = Memory::with_capacity(2);
        mem.write_next(word("+000001")).unwrap();
        mem.write_next(word("+000002")).unwrap();
        assert_eq!(
            mem.write_next(word("+000003")),
            Err(MemoryError::MemoryFull { capacity: 2 })
        );
    }

    #[test]
    fn test_clear_and_reload() {
        let mut mem = Memory::new();
        mem.write(7, word("+001234")).unwrap();
        mem.clear();
        assert!(mem.is_empty());
        assert_eq!(mem.next_free(), 0);

        mem.reload(&[word("+001007"), word("+001107"), word("+004300")])
            .unwrap();
        assert_eq!(mem.len(), 3);
        assert_eq!(mem.read(0).unwrap(), word("+001007"));
        assert_eq!(mem.read(2).unwrap(), word("+004300"));
        assert_eq!(mem.read(7).unwrap(), Word::zero());
    }

    #[test]
    fn test_reload_too_large() {
        let mut mem = Memory::with_capacity(2);
        let words = vec![Word::zero(); 3];
        assert_eq!(
            mem.reload(&words),
            Err(MemoryError::ProgramTooLarge {
                size: 3,
                capacity: 2
            })
        );
    }

    #[test]
    fn test_preview_centered() {
        let mem = Memory::new();
        let window = mem.preview(50, 5).unwrap();
        let addresses: Vec<usize> = window.iter().map(|&(a, _)| a).collect();
        assert_eq!(addresses, vec![48, 49, 50, 51, 52]);
    }

    #[test]
    fn test_preview_shifts_at_edges() {
        let mem = Memory::new();
        let low: Vec<usize> = mem.preview(0, 5).unwrap().iter().map(|&(a, _)| a).collect();
        assert_eq!(low, vec![0, 1, 2, 3, 4]);
        let high: Vec<usize> = mem
            .preview(99, 5)
            .unwrap()
            .iter()
            .map(|&(a, _)| a)
            .collect();
        assert_eq!(high, vec![95, 96, 97, 98, 99]);
    }

    #[test]
    fn test_preview_size_clamped_to_capacity() {
        let mem = Memory::with_capacity(4);
        let window = mem.preview(2, 10).unwrap();
        assert_eq!(window.len(), 4);
        assert_eq!(window[0].0, 0);
    }

    #[test]
    fn test_preview_rejects_out_of_range_center() {
        let mem = Memory::new();
        assert!(mem.preview(100, 5).is_err());
    }

    #[test]
    fn test_highest_nonzero_skips_trailing_zeros() {
        let mut mem = Memory::new();
        assert_eq!(mem.highest_nonzero(), None);
        mem.write(3, word("+000005")).unwrap();
        mem.write(9, Word::zero()).unwrap();
        assert_eq!(mem.highest_nonzero(), Some(3));
    }

    proptest! {
        #[test]
        fn prop_preview_window_invariants(
            capacity in 1usize..=EXTENDED_CAPACITY,
            center_frac in 0.0f64..1.0,
            size in 0usize..=EXTENDED_CAPACITY,
        ) {
            let mem = Memory::with_capacity(capacity);
            let center = ((capacity as f64 - 1.0) * center_frac) as usize;
            let window = mem.preview(center, size).unwrap();

            let expected = size.min(capacity);
            prop_assert_eq!(window.len(), expected);
            for (i, &(addr, _)) in window.iter().enumerate() {
                prop_assert!(addr < capacity);
                if i > 0 {
                    prop_assert_eq!(addr, window[i - 1].0 + 1);
                }
            }
            // When the centered window fits without clamping, the center is in it.
            if expected > 0 && center >= expected / 2 && center + expected / 2 < capacity {
                prop_assert!(window.iter().any(|&(addr, _)| addr == center));
            }
        }
    }
}
