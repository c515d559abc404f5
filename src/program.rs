//! Program file loader and saver.
//!
//! Programs are newline-delimited word strings: one word per line, each a
//! signed 4- or 6-digit body as accepted by the word parser. The loader
//! appends words in file order starting at address 0; the saver writes the
//! canonical form of every cell up to the highest non-zero word, omitting
//! trailing zeros.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use thiserror::Error;

use crate::cpu::{Memory, MemoryError};
use crate::word::{Word, WordError};

/// Parse a program file into its word sequence.
///
/// Blank lines are skipped; anything else must parse as a word. Parse
/// failures carry the 1-based line number.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Vec<Word>, ProgramError> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let mut words = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let word = line
            .parse::<Word>()
            .map_err(|source| ProgramError::Parse {
                line: index + 1,
                source,
            })?;
        words.push(word);
    }
    Ok(words)
}

/// Load a program file into memory, replacing its contents.
///
/// Words are appended in file order from address 0. Returns the number of
/// words loaded.
pub fn load_into<P: AsRef<Path>>(path: P, mem: &mut Memory) -> Result<usize, ProgramError> {
    let words = load_program(path)?;
    mem.clear();
    for &word in &words {
        mem.write_next(word)?;
    }
    Ok(words.len())
}

/// Save memory as a program file.
///
/// Writes `raw_form` per line from address 0 through the highest non-zero
/// word; an all-zero memory produces an empty file.
pub fn save_program<P: AsRef<Path>>(path: P, mem: &Memory) -> Result<(), ProgramError> {
    let mut file = File::create(path.as_ref())?;
    if let Some(highest) = mem.highest_nonzero() {
        for address in 0..=highest {
            writeln!(file, "{}", mem.read(address)?)?;
        }
    }
    Ok(())
}

/// Errors that can occur loading or saving program files.
#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error on line {line}: {source}")]
    Parse { line: usize, source: WordError },

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
}
