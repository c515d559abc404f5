//! CPU execution engine for the UVSim.
//!
//! Implements the fetch-decode-execute cycle over BasicML words: a single
//! accumulator, a program counter, and twelve instructions dispatched from
//! the word's operation field. Single-step execution is first-class so that
//! front ends can trace, cancel, or drive the machine interactively.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpu::io::IoDevice;
use crate::cpu::memory::{Memory, MemoryError};
use crate::word::{arith, Opcode, Word, WordError};

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// Executing instructions.
    Running,
    /// Stopped; only a reset (or a fresh CPU) runs again.
    Halted,
}

/// One row of a memory-inspector window: address, canonical word text, and
/// the decoded human-readable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewCell {
    pub address: usize,
    pub raw: String,
    pub text: String,
}

/// The UVSim CPU: accumulator, program counter, halted state.
///
/// The CPU does not own its memory or IO device; both are borrowed per
/// call, and exactly one CPU drives them for the lifetime of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cpu {
    acc: Word,
    current: usize,
    limit: usize,
    state: CpuState,
    waiting_for_input: bool,
}

impl Cpu {
    /// Create a CPU for an addressable space of `capacity` words, with a
    /// zeroed accumulator and the program counter at 0.
    pub fn new(capacity: usize) -> Self {
        Self {
            acc: Word::zero(),
            current: 0,
            limit: capacity,
            state: CpuState::Running,
            waiting_for_input: false,
        }
    }

    /// The accumulator register.
    #[inline]
    pub fn acc(&self) -> Word {
        self.acc
    }

    /// The program counter: the address of the next instruction to fetch.
    #[inline]
    pub fn current(&self) -> usize {
        self.current
    }

    /// The current execution state.
    #[inline]
    pub fn state(&self) -> CpuState {
        self.state
    }

    /// True once the CPU has halted.
    #[inline]
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// True while a READ instruction is blocked awaiting external input.
    #[inline]
    pub fn waiting_for_input(&self) -> bool {
        self.waiting_for_input
    }

    /// Return the CPU to its initial state.
    pub fn reset(&mut self) {
        self.acc = Word::zero();
        self.current = 0;
        self.state = CpuState::Running;
        self.waiting_for_input = false;
    }

    /// Set the program counter.
    ///
    /// Fails if `address` is outside the addressable range. The last valid
    /// address is a sentinel: setting the counter there halts the CPU
    /// immediately, before any instruction at that address could execute.
    pub fn set_current(&mut self, address: usize) -> Result<(), CpuError> {
        if address >= self.limit {
            return Err(CpuError::CounterOutOfRange {
                address,
                limit: self.limit,
            });
        }
        self.current = address;
        if address == self.limit - 1 {
            self.state = CpuState::Halted;
        }
        Ok(())
    }

    /// Execute a single instruction.
    ///
    /// A halted CPU (or one whose counter has left the range, treated as a
    /// graceful end-of-program) returns without effect. Otherwise the word
    /// at the counter is fetched and dispatched, and the counter advances
    /// by one unless the instruction was a taken branch: a branch target is
    /// the next address executed, never target+1.
    pub fn step(&mut self, mem: &mut Memory, io: &mut dyn IoDevice) -> Result<(), CpuError> {
        if self.state == CpuState::Halted {
            return Ok(());
        }
        if self.current >= self.limit {
            self.state = CpuState::Halted;
            return Ok(());
        }

        let word = mem.read(self.current)?;
        let advance = self.execute(word, mem, io)?;
        if advance && self.state == CpuState::Running {
            self.set_current(self.current + 1)?;
        }
        Ok(())
    }

    /// Run from `start` until the CPU halts. Returns the number of steps
    /// executed.
    pub fn run(
        &mut self,
        mem: &mut Memory,
        io: &mut dyn IoDevice,
        start: usize,
    ) -> Result<u64, CpuError> {
        self.run_traced(mem, io, start, |_, _| {})
    }

    /// Run from `start` with a per-step trace callback.
    ///
    /// Before each step the callback receives the program counter and a
    /// preview window centered on it. The callback is a read-only
    /// diagnostic hook; it has no way to mutate the machine.
    pub fn run_traced<F>(
        &mut self,
        mem: &mut Memory,
        io: &mut dyn IoDevice,
        start: usize,
        mut on_step: F,
    ) -> Result<u64, CpuError>
    where
        F: FnMut(usize, &[PreviewCell]),
    {
        self.set_current(start)?;
        let mut steps = 0u64;
        while self.state == CpuState::Running {
            let window = self.preview(mem, TRACE_WINDOW)?;
            on_step(self.current, &window);
            self.step(mem, io)?;
            steps += 1;
        }
        Ok(steps)
    }

    /// A diagnostic window of memory centered on the program counter.
    pub fn preview(&self, mem: &Memory, size: usize) -> Result<Vec<PreviewCell>, CpuError> {
        let center = self.current.min(mem.capacity().saturating_sub(1));
        let cells = mem.preview(center, size)?;
        Ok(cells
            .into_iter()
            .map(|(address, word)| PreviewCell {
                address,
                raw: word.raw_form(),
                text: word.human_readable(),
            })
            .collect())
    }

    /// Dispatch one fetched word. Returns whether the counter should
    /// advance (false when a taken branch already moved it).
    fn execute(
        &mut self,
        word: Word,
        mem: &mut Memory,
        io: &mut dyn IoDevice,
    ) -> Result<bool, CpuError> {
        let operand = word.operand_address();
        match word.opcode() {
            Opcode::Read => {
                let value = self.read_word(io)?;
                mem.write(operand, value)?;
            }

            Opcode::Write => {
                let value = mem.read(operand)?;
                io.write(&value)?;
            }

            Opcode::Load => {
                self.acc = mem.read(operand)?;
            }

            Opcode::Store => {
                mem.write(operand, self.acc)?;
            }

            Opcode::Add => {
                self.acc = arith::add(self.acc, mem.read(operand)?);
            }

            Opcode::Subtract => {
                self.acc = arith::subtract(self.acc, mem.read(operand)?);
            }

            Opcode::Multiply => {
                self.acc = arith::multiply(self.acc, mem.read(operand)?);
            }

            Opcode::Divide => {
                self.acc = arith::divide(self.acc, mem.read(operand)?)?;
            }

            Opcode::Branch => {
                self.set_current(operand)?;
                return Ok(false);
            }

            Opcode::BranchNeg => {
                if self.acc.numeric_value() < 0 {
                    self.set_current(operand)?;
                    return Ok(false);
                }
            }

            Opcode::BranchZero => {
                if self.acc.numeric_value() == 0 {
                    self.set_current(operand)?;
                    return Ok(false);
                }
            }

            Opcode::Halt => {
                self.state = CpuState::Halted;
            }

            // The counter ran over a data word. Defined behavior: no effect.
            Opcode::Noop => {}
        }
        Ok(true)
    }

    /// Block on the IO device until it yields a parseable word.
    ///
    /// Malformed input is the one error recovered locally: the problem is
    /// reported through `io.err` and the read is reissued. I/O failures
    /// (including end of input) still propagate.
    fn read_word(&mut self, io: &mut dyn IoDevice) -> Result<Word, CpuError> {
        self.waiting_for_input = true;
        let result = loop {
            let line = match io.read() {
                Ok(line) => line,
                Err(e) => break Err(CpuError::Io(e)),
            };
            match line.parse::<Word>() {
                Ok(word) => break Ok(word),
                Err(e) => {
                    if let Err(io_err) =
                        io.err(&format!("invalid word ({e}); enter a signed 4- or 6-digit value"))
                    {
                        break Err(CpuError::Io(io_err));
                    }
                }
            }
        };
        self.waiting_for_input = false;
        result
    }
}

/// Preview width used by the run-loop trace hook.
const TRACE_WINDOW: usize = 9;

/// Errors that can occur during CPU execution.
#[derive(Debug, Error)]
pub enum CpuError {
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("word error: {0}")]
    Word(#[from] WordError),

    #[error("program counter {address} out of range (capacity {limit})")]
    CounterOutOfRange { address: usize, limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::io::ScriptedIo;
    use crate::cpu::memory::DEFAULT_CAPACITY;

    fn word(s: &str) -> Word {
        s.parse().unwrap()
    }

    fn machine(program: &[&str]) -> (Cpu, Memory) {
        let words: Vec<Word> = program.iter().map(|s| word(s)).collect();
        let mut mem = Memory::new();
        mem.reload(&words).unwrap();
        (Cpu::new(DEFAULT_CAPACITY), mem)
    }

    #[test]
    fn test_init() {
        let cpu = Cpu::new(DEFAULT_CAPACITY);
        assert!(!cpu.is_halted());
        assert_eq!(cpu.current(), 0);
        assert_eq!(cpu.acc(), Word::zero());
        assert!(!cpu.waiting_for_input());
    }

    #[test]
    fn test_counter_sentinel_halts() {
        for capacity in [DEFAULT_CAPACITY, 250] {
            let mut cpu = Cpu::new(capacity);
            cpu.set_current(capacity - 1).unwrap();
            assert!(cpu.is_halted());
        }
    }

    #[test]
    fn test_counter_out_of_range() {
        let mut cpu = Cpu::new(DEFAULT_CAPACITY);
        assert!(matches!(
            cpu.set_current(DEFAULT_CAPACITY),
            Err(CpuError::CounterOutOfRange { address: 100, .. })
        ));
        // A failed set leaves the counter untouched.
        assert_eq!(cpu.current(), 0);
    }

    #[test]
    fn test_halt_instruction() {
        let (mut cpu, mut mem) = machine(&["+004300"]);
        let mut io = ScriptedIo::empty();
        let steps = cpu.run(&mut mem, &mut io, 0).unwrap();
        assert_eq!(steps, 1);
        assert!(cpu.is_halted());
    }

    #[test]
    fn test_step_after_halt_has_no_effect() {
        let (mut cpu, mut mem) = machine(&["+004300"]);
        let mut io = ScriptedIo::empty();
        cpu.run(&mut mem, &mut io, 0).unwrap();
        let pc = cpu.current();
        cpu.step(&mut mem, &mut io).unwrap();
        assert_eq!(cpu.current(), pc);
        assert!(cpu.is_halted());
    }

    #[test]
    fn test_read_then_write_scenario() {
        // READ into 7, WRITE from 7, HALT.
        let (mut cpu, mut mem) = machine(&["+1007", "+1107", "+4300"]);
        let mut io = ScriptedIo::new(["+1234"]);
        cpu.run(&mut mem, &mut io, 0).unwrap();

        assert!(cpu.is_halted());
        assert_eq!(io.written, vec!["+001234"]);
        assert_eq!(mem.read(7).unwrap(), word("+001234"));
    }

    #[test]
    fn test_read_reprompts_on_malformed_input() {
        let (mut cpu, mut mem) = machine(&["+1007", "+4300"]);
        let mut io = ScriptedIo::new(["garbage", "+12", "+1234"]);
        cpu.run(&mut mem, &mut io, 0).unwrap();

        assert_eq!(io.errors.len(), 2);
        assert_eq!(mem.read(7).unwrap(), word("+001234"));
        assert!(!cpu.waiting_for_input());
    }

    #[test]
    fn test_read_propagates_end_of_input() {
        let (mut cpu, mut mem) = machine(&["+1007"]);
        let mut io = ScriptedIo::empty();
        assert!(matches!(
            cpu.run(&mut mem, &mut io, 0),
            Err(CpuError::Io(_))
        ));
    }

    #[test]
    fn test_load_add_halt() {
        // LOAD 005, ADD 006, HALT; data at 5 and 6.
        let (mut cpu, mut mem) = machine(&["+020005", "+030006", "+004300"]);
        mem.write(5, word("+000010")).unwrap();
        mem.write(6, word("+000005")).unwrap();

        let mut io = ScriptedIo::empty();
        cpu.run(&mut mem, &mut io, 0).unwrap();

        assert_eq!(cpu.acc(), word("+000015"));
        assert!(cpu.is_halted());
    }

    #[test]
    fn test_store() {
        let (mut cpu, mut mem) = machine(&["+020005", "+021009", "+004300"]);
        mem.write(5, word("-000042")).unwrap();

        let mut io = ScriptedIo::empty();
        cpu.run(&mut mem, &mut io, 0).unwrap();

        assert_eq!(mem.read(9).unwrap(), word("-000042"));
    }

    #[test]
    fn test_subtract_multiply_divide() {
        // acc := mem[10] (=+000100), -= mem[11] (=+000040), *= mem[12] (=-000002),
        // /= mem[13] (=+000012)  =>  (100-40)*-2/12 = -10
        let (mut cpu, mut mem) = machine(&[
            "+020010", "+031011", "+032012", "+033013", "+004300",
        ]);
        mem.write(10, word("+000100")).unwrap();
        mem.write(11, word("+000040")).unwrap();
        mem.write(12, word("-000002")).unwrap();
        mem.write(13, word("+000012")).unwrap();

        let mut io = ScriptedIo::empty();
        cpu.run(&mut mem, &mut io, 0).unwrap();

        assert_eq!(cpu.acc(), word("-000010"));
    }

    #[test]
    fn test_divide_by_zero_propagates() {
        let (mut cpu, mut mem) = machine(&["+020005", "+033006", "+004300"]);
        mem.write(5, word("+000009")).unwrap();
        // mem[6] is an unwritten zero.

        let mut io = ScriptedIo::empty();
        let result = cpu.run(&mut mem, &mut io, 0);
        assert!(matches!(result, Err(CpuError::Word(WordError::DivisionByZero))));
    }

    #[test]
    fn test_branch_does_not_double_advance() {
        let (mut cpu, mut mem) = machine(&["+040005"]);
        let mut io = ScriptedIo::empty();
        cpu.step(&mut mem, &mut io).unwrap();
        assert_eq!(cpu.current(), 5);
    }

    #[test]
    fn test_branchneg_taken_and_fallthrough() {
        // Negative accumulator takes the branch.
        let (mut cpu, mut mem) = machine(&["+020005", "+041009"]);
        mem.write(5, word("-000001")).unwrap();
        let mut io = ScriptedIo::empty();
        cpu.step(&mut mem, &mut io).unwrap();
        cpu.step(&mut mem, &mut io).unwrap();
        assert_eq!(cpu.current(), 9);

        // Non-negative accumulator falls through.
        let (mut cpu, mut mem) = machine(&["+020005", "+041009"]);
        mem.write(5, word("+000001")).unwrap();
        let mut io = ScriptedIo::empty();
        cpu.step(&mut mem, &mut io).unwrap();
        cpu.step(&mut mem, &mut io).unwrap();
        assert_eq!(cpu.current(), 2);
    }

    #[test]
    fn test_branchzero_taken_and_fallthrough() {
        let (mut cpu, mut mem) = machine(&["+042007"]);
        let mut io = ScriptedIo::empty();
        cpu.step(&mut mem, &mut io).unwrap();
        assert_eq!(cpu.current(), 7);

        let (mut cpu, mut mem) = machine(&["+020005", "+042009"]);
        mem.write(5, word("+000003")).unwrap();
        let mut io = ScriptedIo::empty();
        cpu.step(&mut mem, &mut io).unwrap();
        cpu.step(&mut mem, &mut io).unwrap();
        assert_eq!(cpu.current(), 2);
    }

    #[test]
    fn test_branch_target_out_of_range() {
        let (mut cpu, mut mem) = machine(&["+040999"]);
        let mut io = ScriptedIo::empty();
        assert!(matches!(
            cpu.step(&mut mem, &mut io),
            Err(CpuError::CounterOutOfRange { address: 999, .. })
        ));
    }

    #[test]
    fn test_data_word_executes_as_noop() {
        // Two data words, then HALT.
        let (mut cpu, mut mem) = machine(&["+001234", "-777777", "+004300"]);
        let mut io = ScriptedIo::empty();
        let steps = cpu.run(&mut mem, &mut io, 0).unwrap();
        assert_eq!(steps, 3);
        assert_eq!(cpu.acc(), Word::zero());
        assert!(cpu.is_halted());
    }

    #[test]
    fn test_running_off_the_end_halts_gracefully() {
        // An empty program: every cell is a zero data word. The counter
        // walks the whole space and halts at the sentinel.
        let mut cpu = Cpu::new(5);
        let mut mem = Memory::with_capacity(5);
        let mut io = ScriptedIo::empty();
        cpu.run(&mut mem, &mut io, 0).unwrap();
        assert!(cpu.is_halted());
        assert_eq!(cpu.current(), 4);
    }

    #[test]
    fn test_reset() {
        let (mut cpu, mut mem) = machine(&["+020005", "+004300"]);
        mem.write(5, word("+000007")).unwrap();
        let mut io = ScriptedIo::empty();
        cpu.run(&mut mem, &mut io, 0).unwrap();
        assert!(cpu.is_halted());

        cpu.reset();
        assert!(!cpu.is_halted());
        assert_eq!(cpu.current(), 0);
        assert_eq!(cpu.acc(), Word::zero());
    }

    #[test]
    fn test_trace_callback_sees_each_step() {
        let (mut cpu, mut mem) = machine(&["+001234", "+004300"]);
        let mut io = ScriptedIo::empty();
        let mut trace: Vec<usize> = Vec::new();
        cpu.run_traced(&mut mem, &mut io, 0, |pc, window| {
            assert!(!window.is_empty());
            assert!(window.iter().any(|cell| cell.address == pc));
            trace.push(pc);
        })
        .unwrap();
        assert_eq!(trace, vec![0, 1]);
    }

    #[test]
    fn test_preview_cells_render_words() {
        let (cpu, mem) = machine(&["+010042"]);
        let window = cpu.preview(&mem, 3).unwrap();
        assert_eq!(window[0].address, 0);
        assert_eq!(window[0].raw, "+010042");
        assert_eq!(window[0].text, "READ 042");
        assert_eq!(window[1].text, "NOOP");
    }
}
