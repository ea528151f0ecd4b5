//! Assembly language parser.
//!
//! Converts newline-delimited source text into a validated [`Program`].
//!
//! # Syntax
//!
//! ```text
//! # whole-line comment
//! LOAD 25 0        extra tokens after the operands are ignored
//! READ 0 1
//! WRITE 0 50 1
//! SQRT 100 200
//! ```
//!
//! - Mnemonics are case-insensitive; operands are whitespace-separated
//!   decimal integers
//! - A line is a comment only if its first non-whitespace character is `#`;
//!   tokenization is whitespace-split, not comment-aware, so there is no
//!   inline comment syntax — tokens past an instruction's fixed arity are
//!   silently ignored
//! - Register operands of `LOAD`/`READ`/`WRITE` must be in `0..=255`;
//!   `WRITE`'s offset and both `SQRT` addresses are left for the machine to
//!   bounds-check at execution time

use crate::machine::errors::VmError;
use crate::machine::isa::Instruction;
use crate::machine::program::Program;
use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

const COMMENT_CHAR: char = '#';

/// Highest valid register index.
const MAX_REGISTER: i64 = 255;

/// Reads one integer operand from a token list.
fn int_operand(line: usize, ops: &[&str], idx: usize) -> Result<i64, VmError> {
    let tok = *ops.get(idx).ok_or_else(|| VmError::MalformedInstruction {
        line,
        reason: format!("missing operand {}", idx + 1),
    })?;
    tok.parse::<i64>().map_err(|_| VmError::MalformedInstruction {
        line,
        reason: format!("operand '{tok}' is not an integer"),
    })
}

/// Reads a 32-bit operand (a `LOAD` constant or `WRITE` offset).
fn value_operand(line: usize, ops: &[&str], idx: usize) -> Result<i32, VmError> {
    let v = int_operand(line, ops, idx)?;
    i32::try_from(v).map_err(|_| VmError::MalformedInstruction {
        line,
        reason: format!("operand {v} does not fit in 32 bits"),
    })
}

/// Reads a memory-address operand (`SQRT` only). The value is not checked
/// against any memory size here; execution does that against the live array.
fn addr_operand(line: usize, ops: &[&str], idx: usize) -> Result<usize, VmError> {
    let v = int_operand(line, ops, idx)?;
    usize::try_from(v).map_err(|_| VmError::MalformedInstruction {
        line,
        reason: format!("operand {v} is not a valid address"),
    })
}

/// Checks a parsed register index against the register file range.
fn check_reg(line: usize, value: i64) -> Result<u8, VmError> {
    if !(0..=MAX_REGISTER).contains(&value) {
        return Err(VmError::OperandOutOfRange { line, value });
    }
    Ok(value as u8)
}

/// Parses one instruction line that has already been split into tokens.
///
/// `ops` holds the operand tokens (everything after the mnemonic). Operands
/// are parsed first and range-checked second, so a non-integer operand is
/// always reported as malformed rather than out of range.
fn parse_instruction(line: usize, mnemonic: &str, ops: &[&str]) -> Result<Instruction, VmError> {
    match mnemonic {
        "LOAD" => {
            let value = value_operand(line, ops, 0)?;
            let dst = int_operand(line, ops, 1)?;
            Ok(Instruction::Load {
                value,
                dst: check_reg(line, dst)?,
            })
        }
        "READ" => {
            let src = int_operand(line, ops, 0)?;
            let dst = int_operand(line, ops, 1)?;
            Ok(Instruction::Read {
                src: check_reg(line, src)?,
                dst: check_reg(line, dst)?,
            })
        }
        "WRITE" => {
            let src = int_operand(line, ops, 0)?;
            let offset = value_operand(line, ops, 1)?;
            let addr = int_operand(line, ops, 2)?;
            Ok(Instruction::Write {
                src: check_reg(line, src)?,
                offset,
                addr: check_reg(line, addr)?,
            })
        }
        "SQRT" => Ok(Instruction::Sqrt {
            src: addr_operand(line, ops, 0)?,
            dst: addr_operand(line, ops, 1)?,
        }),
        _ => Err(VmError::UnknownOpcode {
            line,
            mnemonic: mnemonic.to_string(),
        }),
    }
}

/// Assembles newline-delimited source text into a [`Program`].
///
/// Blank lines and whole-line `#` comments are skipped. The first error
/// aborts the pass immediately with its 1-based line number; no partial
/// program is ever returned.
pub fn assemble_source(source: &str) -> Result<Program, VmError> {
    let mut instructions = Vec::new();

    for (line_no, raw) in source.lines().enumerate() {
        let line_no = line_no + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with(COMMENT_CHAR) {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let mnemonic = tokens[0].to_ascii_uppercase();
        instructions.push(parse_instruction(line_no, &mnemonic, &tokens[1..])?);
    }

    Ok(Program::new(instructions))
}

/// Assembles a source file from disk.
pub fn assemble_file<P: AsRef<Path>>(path: P) -> Result<Program, VmError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            VmError::SourceNotFound {
                path: path.display().to_string(),
            }
        } else {
            VmError::PersistenceFailure {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        }
    })?;
    assemble_source(&source)
}

/// Renders a human-readable listing of a program, one numbered line per
/// instruction. Inspection aid only; has no bearing on the persisted format.
pub fn listing(program: &Program) -> String {
    let mut out = String::new();
    for (i, instr) in program.iter().enumerate() {
        let _ = match *instr {
            Instruction::Load { value, dst } => {
                writeln!(out, "{i:3}: LOAD {value} -> reg[{dst}]")
            }
            Instruction::Read { src, dst } => {
                writeln!(out, "{i:3}: READ reg[{src}] -> reg[{dst}]")
            }
            Instruction::Write { src, offset, addr } => {
                writeln!(out, "{i:3}: WRITE reg[{src}] -> mem[reg[{addr}]+{offset}]")
            }
            Instruction::Sqrt { src, dst } => {
                writeln!(out, "{i:3}: SQRT mem[{src}] -> mem[{dst}]")
            }
        };
    }
    out
}
