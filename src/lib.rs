//! A minimal two-stage toy machine.
//!
//! Demonstrates the classic fetch-decode-execute cycle with a tiny fixed
//! instruction set: an assembler turns text source into a persisted JSON
//! program, and a virtual machine executes that program against a flat
//! register file and memory array.

pub mod machine;
pub mod utils;
