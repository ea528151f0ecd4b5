//! Instruction set definitions.
//!
//! Four opcodes: load-constant, memory-read, memory-write, and integer
//! square root. In memory an instruction is a plain tagged enum; the numeric
//! opcode tags only exist in the persisted record format (see
//! [`program`](super::program)).
//!
//! # Persisted record format
//!
//! Each instruction serializes as a fixed-length integer array whose first
//! element is the opcode tag:
//!
//! - `[0, value, dst]` — `LOAD`
//! - `[2, src, dst]` — `READ`
//! - `[6, src, offset, addr]` — `WRITE`
//! - `[7, src, dst]` — `SQRT`
//!
//! The tags are non-contiguous: the tag space was numbered for a larger
//! instruction set that was never built, and the persisted format keeps the
//! original values.

use serde::de::{self, IgnoredAny, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Opcode tag for `LOAD` in the persisted representation.
pub const TAG_LOAD: i64 = 0;
/// Opcode tag for `READ`.
pub const TAG_READ: i64 = 2;
/// Opcode tag for `WRITE`.
pub const TAG_WRITE: i64 = 6;
/// Opcode tag for `SQRT`.
pub const TAG_SQRT: i64 = 7;

/// A single decoded machine instruction.
///
/// Register indices always fit in `0..=255`; the assembler enforces this for
/// `Load`, `Read` and `Write` before an instruction is ever built from
/// source. `Sqrt` carries raw memory addresses that are only validated when
/// the instruction executes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// `LOAD value dst` ; `reg[dst] = value`
    Load { value: i32, dst: u8 },
    /// `READ src dst` ; `reg[dst] = mem[reg[src]]`
    Read { src: u8, dst: u8 },
    /// `WRITE src offset addr` ; `mem[reg[addr] + offset] = reg[src]`
    Write { src: u8, offset: i32, addr: u8 },
    /// `SQRT src dst` ; `mem[dst] = isqrt(mem[src])`
    Sqrt { src: usize, dst: usize },
}

impl Instruction {
    /// Returns the assembly mnemonic for this instruction.
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Load { .. } => "LOAD",
            Instruction::Read { .. } => "READ",
            Instruction::Write { .. } => "WRITE",
            Instruction::Sqrt { .. } => "SQRT",
        }
    }

    /// Returns the opcode tag used in the persisted representation.
    pub const fn tag(&self) -> i64 {
        match self {
            Instruction::Load { .. } => TAG_LOAD,
            Instruction::Read { .. } => TAG_READ,
            Instruction::Write { .. } => TAG_WRITE,
            Instruction::Sqrt { .. } => TAG_SQRT,
        }
    }
}

impl Serialize for Instruction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Instruction::Load { value, dst } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(&TAG_LOAD)?;
                seq.serialize_element(&value)?;
                seq.serialize_element(&dst)?;
                seq.end()
            }
            Instruction::Read { src, dst } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(&TAG_READ)?;
                seq.serialize_element(&src)?;
                seq.serialize_element(&dst)?;
                seq.end()
            }
            Instruction::Write { src, offset, addr } => {
                let mut seq = serializer.serialize_seq(Some(4))?;
                seq.serialize_element(&TAG_WRITE)?;
                seq.serialize_element(&src)?;
                seq.serialize_element(&offset)?;
                seq.serialize_element(&addr)?;
                seq.end()
            }
            Instruction::Sqrt { src, dst } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(&TAG_SQRT)?;
                seq.serialize_element(&src)?;
                seq.serialize_element(&dst)?;
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Instruction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(InstructionVisitor)
    }
}

struct InstructionVisitor;

impl InstructionVisitor {
    /// Reads the next operand of a record, failing if the record is too short.
    fn operand<'de, A, T>(seq: &mut A, found: usize) -> Result<T, A::Error>
    where
        A: SeqAccess<'de>,
        T: Deserialize<'de>,
    {
        seq.next_element()?
            .ok_or_else(|| de::Error::invalid_length(found, &InstructionVisitor))
    }
}

impl<'de> Visitor<'de> for InstructionVisitor {
    type Value = Instruction;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an instruction record `[tag, operands...]`")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Instruction, A::Error> {
        let tag: i64 = Self::operand(&mut seq, 0)?;
        let instr = match tag {
            TAG_LOAD => Instruction::Load {
                value: Self::operand(&mut seq, 1)?,
                dst: Self::operand(&mut seq, 2)?,
            },
            TAG_READ => Instruction::Read {
                src: Self::operand(&mut seq, 1)?,
                dst: Self::operand(&mut seq, 2)?,
            },
            TAG_WRITE => Instruction::Write {
                src: Self::operand(&mut seq, 1)?,
                offset: Self::operand(&mut seq, 2)?,
                addr: Self::operand(&mut seq, 3)?,
            },
            TAG_SQRT => Instruction::Sqrt {
                src: Self::operand(&mut seq, 1)?,
                dst: Self::operand(&mut seq, 2)?,
            },
            other => {
                return Err(de::Error::custom(format_args!(
                    "unknown opcode tag {other}"
                )));
            }
        };
        // an oversized record would otherwise survive a decode/re-encode trip
        // with its extra operands silently dropped
        if seq.next_element::<IgnoredAny>()?.is_some() {
            return Err(de::Error::custom(format_args!(
                "trailing operands in {} record",
                instr.mnemonic()
            )));
        }
        Ok(instr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_uses_wire_tags() {
        let cases = [
            (Instruction::Load { value: 25, dst: 0 }, "[0,25,0]"),
            (Instruction::Read { src: 1, dst: 2 }, "[2,1,2]"),
            (
                Instruction::Write {
                    src: 0,
                    offset: 50,
                    addr: 1,
                },
                "[6,0,50,1]",
            ),
            (Instruction::Sqrt { src: 100, dst: 200 }, "[7,100,200]"),
        ];
        for (instr, expected) in cases {
            assert_eq!(serde_json::to_string(&instr).unwrap(), expected);
        }
    }

    #[test]
    fn decode_negative_operands() {
        let instr: Instruction = serde_json::from_str("[0, -42, 3]").unwrap();
        assert_eq!(instr, Instruction::Load { value: -42, dst: 3 });

        let instr: Instruction = serde_json::from_str("[6, 0, -50, 1]").unwrap();
        assert_eq!(
            instr,
            Instruction::Write {
                src: 0,
                offset: -50,
                addr: 1
            }
        );
    }

    #[test]
    fn decode_unknown_tag() {
        let err = serde_json::from_str::<Instruction>("[5, 1, 2]").unwrap_err();
        assert!(err.to_string().contains("unknown opcode tag 5"));
    }

    #[test]
    fn decode_short_record() {
        assert!(serde_json::from_str::<Instruction>("[0, 25]").is_err());
        assert!(serde_json::from_str::<Instruction>("[6, 0, 50]").is_err());
        assert!(serde_json::from_str::<Instruction>("[]").is_err());
    }

    #[test]
    fn decode_oversized_record() {
        let err = serde_json::from_str::<Instruction>("[2, 1, 2, 3]").unwrap_err();
        assert!(err.to_string().contains("trailing operands in READ record"));
    }

    #[test]
    fn decode_register_out_of_byte_range() {
        // register operands are u8 on the wire; 300 cannot be an index
        assert!(serde_json::from_str::<Instruction>("[2, 300, 0]").is_err());
        assert!(serde_json::from_str::<Instruction>("[2, -1, 0]").is_err());
    }

    #[test]
    fn mnemonics_and_tags() {
        let sqrt = Instruction::Sqrt { src: 0, dst: 0 };
        assert_eq!(sqrt.mnemonic(), "SQRT");
        assert_eq!(sqrt.tag(), TAG_SQRT);
        assert_eq!(Instruction::Load { value: 0, dst: 0 }.tag(), 0);
        assert_eq!(Instruction::Read { src: 0, dst: 0 }.tag(), 2);
        assert_eq!(
            Instruction::Write {
                src: 0,
                offset: 0,
                addr: 0
            }
            .tag(),
            6
        );
    }
}
