//! Program container and IR persistence.
//!
//! A [`Program`] is an ordered, immutable sequence of instructions, produced
//! once by the assembler and consumed top-to-bottom by the machine. The
//! persisted intermediate representation is a JSON array with one integer
//! record per instruction:
//!
//! ```text
//! [
//!   [0, 25, 0],
//!   [6, 0, 50, 1]
//! ]
//! ```
//!
//! Decoding a file and re-encoding it yields an identical record sequence;
//! unknown opcode tags, wrong record arity, and trailing data are all decode
//! errors. The file is the sole contract between the assembler and the
//! machine — nothing in-process is shared between the two stages.

use crate::machine::errors::VmError;
use crate::machine::isa::Instruction;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs;
use std::path::Path;

/// An assembled program.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Wraps an already-validated instruction sequence.
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Number of instructions in the program.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the program contains no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The instruction at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// Iterates the instructions in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }

    /// Writes the program to `path` as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), VmError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| persistence(path, e))?;
        fs::write(path, json).map_err(|e| persistence(path, e))
    }

    /// Loads a program previously written by [`save`](Self::save).
    ///
    /// The file is an independently editable artifact, so decoding rejects
    /// anything the codec cannot represent losslessly.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, VmError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| persistence(path, e))?;
        serde_json::from_str(&data).map_err(|e| persistence(path, e))
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

fn persistence(path: &Path, err: impl Display) -> VmError {
    VmError::PersistenceFailure {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::path::PathBuf;

    fn sample() -> Program {
        Program::new(vec![
            Instruction::Load { value: 25, dst: 0 },
            Instruction::Load { value: 100, dst: 1 },
            Instruction::Write {
                src: 0,
                offset: 0,
                addr: 1,
            },
            Instruction::Write {
                src: 1,
                offset: 50,
                addr: 1,
            },
            Instruction::Sqrt { src: 100, dst: 200 },
            Instruction::Read { src: 1, dst: 2 },
        ])
    }

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("uvm-test-{}-{}", std::process::id(), name))
    }

    #[test]
    fn roundtrip_empty_program() {
        let encoded = serde_json::to_string(&Program::default()).unwrap();
        assert_eq!(encoded, "[]");
        let decoded: Program = serde_json::from_str(&encoded).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn roundtrip_preserves_order_and_operands() {
        let program = sample();
        let encoded = serde_json::to_string(&program).unwrap();
        let decoded: Program = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, program);
        // and a second trip produces byte-identical output
        assert_eq!(serde_json::to_string(&decoded).unwrap(), encoded);
    }

    #[test]
    fn encoded_form_is_tagged_records() {
        let program = Program::new(vec![
            Instruction::Load { value: 25, dst: 0 },
            Instruction::Write {
                src: 0,
                offset: 0,
                addr: 1,
            },
        ]);
        assert_eq!(
            serde_json::to_string(&program).unwrap(),
            "[[0,25,0],[6,0,0,1]]"
        );
    }

    #[test]
    fn decode_rejects_unknown_tag() {
        let err = serde_json::from_str::<Program>("[[0, 1, 0], [9, 1, 2]]").unwrap_err();
        assert!(err.to_string().contains("unknown opcode tag 9"));
    }

    #[test]
    fn decode_rejects_trailing_data() {
        assert!(serde_json::from_str::<Program>("[[0, 1, 0]] []").is_err());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let path = temp_path("roundtrip.json");
        let program = sample();
        program.save(&path).unwrap();
        let loaded = Program::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, program);
    }

    #[test]
    fn load_missing_file() {
        let err = Program::load("/nonexistent/program.json").unwrap_err();
        assert!(matches!(err, VmError::PersistenceFailure { .. }));
    }

    #[test]
    fn load_rejects_hand_edited_garbage() {
        let path = temp_path("garbage.json");
        std::fs::write(&path, "[[0, 1, 0], [6, 0]]").unwrap();
        let err = Program::load(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, VmError::PersistenceFailure { .. }));
    }
}
