//! Two-stage toy machine: a text assembler and a virtual machine.
//!
//! The assembler translates newline-delimited source text into a validated
//! [`program::Program`], persisted as a JSON intermediate representation.
//! The machine loads that file — the sole contract between the two stages —
//! and executes it against a flat register file and memory array, after
//! which a memory range can be snapshotted as an XML document.
//!
//! # Architecture
//!
//! - **Registers**: 256 integer registers by default, addressed by index
//! - **Memory**: 1024 integer cells by default, flat address space
//! - **Execution model**: strictly sequential fetch-decode-execute; four
//!   opcodes, no jumps, no arithmetic beyond integer square root
//! - **Validation split**: register operands are checked at assembly time;
//!   memory addresses only at execution time against the live array
//!
//! # Modules
//!
//! - [`assembler`]: source parsing, validation, and the program listing
//! - [`dump`]: memory-range snapshots and their XML rendering
//! - [`errors`]: assembly and execution error types
//! - [`isa`]: instruction set and the persisted record codec
//! - [`program`]: program container and JSON IR persistence
//! - [`vm`]: machine state and the execution loop

pub mod assembler;
pub mod dump;
pub mod errors;
pub mod isa;
pub mod program;
pub mod vm;
