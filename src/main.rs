//! UVSim - CLI Entry Point
//!
//! Commands:
//! - `uvsim run <program>` - Load a BasicML program and run it to halt
//! - `uvsim disasm <program>` - Print a listing of a program file

use clap::{Parser, Subcommand};
use serde::Serialize;

use uvsim::cpu::DEFAULT_CAPACITY;
use uvsim::{load_program, Cpu, ConsoleIo, Memory};

#[derive(Parser)]
#[command(name = "uvsim")]
#[command(version = "0.1.0")]
#[command(about = "A virtual machine for BasicML six-digit decimal programs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the program file to execute
        program: String,
        /// Memory capacity in words (historical 100, extended 250)
        #[arg(short, long, default_value_t = DEFAULT_CAPACITY)]
        capacity: usize,
        /// Address to start execution from
        #[arg(short, long, default_value_t = 0)]
        start: usize,
        /// Show a memory window before each step
        #[arg(short, long)]
        trace: bool,
        /// Write the final CPU and memory state as JSON
        #[arg(long)]
        dump_state: Option<String>,
    },
    /// Print a listing of a program file
    Disasm {
        /// Path to the program file
        program: String,
    },
}

/// Snapshot written by `--dump-state`.
#[derive(Serialize)]
struct Snapshot<'a> {
    cpu: &'a Cpu,
    memory: &'a Memory,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            program,
            capacity,
            start,
            trace,
            dump_state,
        } => run_program(&program, capacity, start, trace, dump_state.as_deref()),
        Commands::Disasm { program } => disassemble_file(&program),
    }
}

fn run_program(path: &str, capacity: usize, start: usize, trace: bool, dump_state: Option<&str>) {
    let words = match load_program(path) {
        Ok(words) => words,
        Err(e) => {
            eprintln!("failed to load {}: {}", path, e);
            std::process::exit(1);
        }
    };
    println!("loaded {} words from {}", words.len(), path);

    let mut mem = Memory::with_capacity(capacity);
    if let Err(e) = mem.reload(&words) {
        eprintln!("failed to load program into memory: {}", e);
        std::process::exit(1);
    }

    let mut cpu = Cpu::new(capacity);
    let mut io = ConsoleIo::new();

    println!();
    println!("--- execution ---");

    let result = if trace {
        cpu.run_traced(&mut mem, &mut io, start, |pc, window| {
            for cell in window {
                let marker = if cell.address == pc { ">" } else { " " };
                println!("{} {:03}  {}  {}", marker, cell.address, cell.raw, cell.text);
            }
            println!();
        })
    } else {
        cpu.run(&mut mem, &mut io, start)
    };

    let steps = match result {
        Ok(steps) => steps,
        Err(e) => {
            eprintln!("CPU error at address {}: {}", cpu.current(), e);
            std::process::exit(1);
        }
    };

    println!();
    println!("--- result ---");
    println!("steps:       {}", steps);
    println!("state:       {:?}", cpu.state());
    println!("accumulator: {} ({})", cpu.acc(), cpu.acc().numeric_value());
    println!("counter:     {:03}", cpu.current());

    if let Some(out_path) = dump_state {
        let snapshot = Snapshot {
            cpu: &cpu,
            memory: &mem,
        };
        let json = match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("failed to serialize state: {}", e);
                std::process::exit(1);
            }
        };
        if let Err(e) = std::fs::write(out_path, json) {
            eprintln!("failed to write {}: {}", out_path, e);
            std::process::exit(1);
        }
        println!("state written to {}", out_path);
    }
}

fn disassemble_file(path: &str) {
    let words = match load_program(path) {
        Ok(words) => words,
        Err(e) => {
            eprintln!("failed to load {}: {}", path, e);
            std::process::exit(1);
        }
    };

    for (address, word) in words.iter().enumerate() {
        println!("{:03}: {}  {}", address, word.raw_form(), word.human_readable());
    }
}
