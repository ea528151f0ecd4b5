//! Command-line front end for the assembler and the virtual machine.
//!
//! # Usage
//! ```text
//! uvm assemble <source> <output> [test]
//! uvm run <program> <dump> <start> <end>
//! ```
//!
//! # Commands
//! - `assemble`: compile assembly source into a JSON program file; the
//!   optional trailing `test` prints a human-readable listing of the
//!   assembled program
//! - `run`: load a program file, execute it on a fresh machine, then write
//!   an XML dump of the inclusive memory range `[start, end]`
//!
//! Both commands exit 0 on success and 1 on any failure, reporting
//! human-readable diagnostics on stderr.

use std::env;
use std::process;

use uvm::machine::assembler::{assemble_file, listing};
use uvm::machine::program::Program;
use uvm::machine::vm::Machine;
use uvm::{error, info};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let ok = match args[1].as_str() {
        "assemble" => cmd_assemble(&args),
        "run" => cmd_run(&args),
        other => {
            error!("Unknown command: {}\n", other);
            print_usage(&args[0]);
            false
        }
    };

    process::exit(if ok { 0 } else { 1 });
}

/// `assemble <source> <output> [test]`
fn cmd_assemble(args: &[String]) -> bool {
    if args.len() < 4 {
        error!("Usage: {} assemble <source> <output> [test]", args[0]);
        return false;
    }
    let source = &args[2];
    let output = &args[3];
    let test_mode = args.len() > 4 && args[4].eq_ignore_ascii_case("test");

    let program = match assemble_file(source) {
        Ok(p) => p,
        Err(e) => {
            error!("Assembly failed: {}", e);
            return false;
        }
    };

    if test_mode {
        println!("Program listing:");
        print!("{}", listing(&program));
    }

    if let Err(e) = program.save(output) {
        error!("Failed to write program: {}", e);
        return false;
    }

    info!(
        "Assembled {} -> {} ({} instructions)",
        source,
        output,
        program.len()
    );
    true
}

/// `run <program> <dump> <start> <end>`
fn cmd_run(args: &[String]) -> bool {
    if args.len() < 6 {
        error!("Usage: {} run <program> <dump> <start> <end>", args[0]);
        return false;
    }
    let program_path = &args[2];
    let dump_path = &args[3];

    let start = match args[4].parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            error!("Invalid start address: {}", args[4]);
            return false;
        }
    };
    let end = match args[5].parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            error!("Invalid end address: {}", args[5]);
            return false;
        }
    };

    let program = match Program::load(program_path) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to load program: {}", e);
            return false;
        }
    };
    info!("Loaded {} ({} instructions)", program_path, program.len());

    let mut machine = Machine::new();
    match machine.run(&program) {
        Ok(executed) => info!("Executed {} instructions", executed),
        Err(e) => {
            error!("Execution failed: {}", e);
            return false;
        }
    }

    if let Err(e) = machine.dump(start, end).write_to(dump_path) {
        error!("Failed to write memory dump: {}", e);
        return false;
    }
    info!("Memory dump saved to {}", dump_path);
    true
}

const USAGE: &str = "\
Toy Machine

USAGE:
    {program} <COMMAND>

COMMANDS:
    assemble <source> <output> [test]     Assemble source text into a JSON program
    run <program> <dump> <start> <end>    Execute a program, then dump memory cells
                                          [start, end] as XML

OPTIONS:
    -h, --help    Print this help message

EXAMPLES:
    # Assemble, printing the decoded program listing
    {program} assemble program.asm program.json test

    # Run and dump memory cells 0-1000
    {program} run program.json dump.xml 0 1000
";

fn print_usage(program: &str) {
    info!("{}", USAGE.replace("{program}", program));
}
