//! The input/output device boundary.
//!
//! The CPU touches the outside world only through [`IoDevice`]: READ pulls
//! one line of text, WRITE emits a word, and `err` carries diagnostics and
//! re-prompts. Front ends (console, GUI, test harness) supply the
//! implementation.

use std::io::{self, BufRead, Write as _};

use crate::word::Word;

/// One line of input, one word of output, one diagnostic channel.
pub trait IoDevice {
    /// Obtain one line of external input. Must not return until input is
    /// available; end-of-input is an error, not an empty line.
    fn read(&mut self) -> io::Result<String>;

    /// Emit one word's value to the user.
    fn write(&mut self, word: &Word) -> io::Result<()>;

    /// Emit a diagnostic or prompt string, distinct from normal output.
    fn err(&mut self, message: &str) -> io::Result<()>;
}

/// Console device: prompts on stdout, reads stdin, diagnostics on stderr.
#[derive(Debug, Default)]
pub struct ConsoleIo;

impl ConsoleIo {
    pub fn new() -> Self {
        Self
    }
}

impl IoDevice for ConsoleIo {
    fn read(&mut self) -> io::Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, ">>> ")?;
        stdout.flush()?;

        let mut line = String::new();
        let bytes = io::stdin().lock().read_line(&mut line)?;
        if bytes == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "end of input while a READ instruction was waiting",
            ));
        }
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }

    fn write(&mut self, word: &Word) -> io::Result<()> {
        writeln!(io::stdout(), "{}", word)
    }

    fn err(&mut self, message: &str) -> io::Result<()> {
        writeln!(io::stderr(), "{}", message)
    }
}

/// In-memory device for tests: queued inputs, captured outputs.
#[cfg(test)]
pub struct ScriptedIo {
    inputs: std::collections::VecDeque<String>,
    pub written: Vec<String>,
    pub errors: Vec<String>,
}

#[cfg(test)]
impl ScriptedIo {
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            written: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

#[cfg(test)]
impl IoDevice for ScriptedIo {
    fn read(&mut self) -> io::Result<String> {
        self.inputs.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "scripted input exhausted")
        })
    }

    fn write(&mut self, word: &Word) -> io::Result<()> {
        self.written.push(word.raw_form());
        Ok(())
    }

    fn err(&mut self, message: &str) -> io::Result<()> {
        self.errors.push(message.to_string());
        Ok(())
    }
}
