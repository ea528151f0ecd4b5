//! Machine state and the execution loop.
//!
//! A [`Machine`] owns a flat memory array, a register file, and a program
//! counter, and executes a [`Program`] strictly in sequence: the counter
//! starts at zero and advances by exactly one after every successfully
//! executed instruction — the instruction set has no jumps.
//!
//! Execution halts on the first failure without rolling back effects already
//! committed by earlier instructions; the final state stays inspectable
//! either way. Each machine is owned exclusively by one run invocation and is
//! never shared or exposed as global state.

use crate::machine::dump::MemoryDump;
use crate::machine::errors::VmError;
use crate::machine::isa::Instruction;
use crate::machine::program::Program;

/// The value type of a single register or memory cell.
pub type Word = i64;

/// Default memory size in cells.
pub const DEFAULT_MEMORY_SIZE: usize = 1024;
/// Default number of registers.
pub const DEFAULT_REGISTER_COUNT: usize = 256;

/// Machine state for a single execution run.
#[derive(Debug)]
pub struct Machine {
    memory: Vec<Word>,
    registers: Vec<Word>,
    pc: usize,
}

impl Machine {
    /// Creates a machine with the default dimensions: 1024 memory cells and
    /// 256 registers, all zeroed.
    pub fn new() -> Self {
        Self::with_dimensions(DEFAULT_MEMORY_SIZE, DEFAULT_REGISTER_COUNT)
    }

    /// Creates a machine with explicit memory and register file sizes.
    pub fn with_dimensions(memory_size: usize, register_count: usize) -> Self {
        Self {
            memory: vec![0; memory_size],
            registers: vec![0; register_count],
            pc: 0,
        }
    }

    /// Executes `program` from the first instruction until the program is
    /// exhausted, returning the number of instructions executed.
    ///
    /// On failure the error names the failing instruction index, the counter
    /// stays on that instruction, and every effect committed by earlier
    /// instructions is kept.
    pub fn run(&mut self, program: &Program) -> Result<usize, VmError> {
        self.pc = 0;
        let mut executed = 0;
        while let Some(instr) = program.get(self.pc) {
            self.exec(self.pc, instr)?;
            self.pc += 1;
            executed += 1;
        }
        Ok(executed)
    }

    fn exec(&mut self, index: usize, instr: &Instruction) -> Result<(), VmError> {
        match *instr {
            Instruction::Load { value, dst } => self.op_load(index, value, dst),
            Instruction::Read { src, dst } => self.op_read(index, src, dst),
            Instruction::Write { src, offset, addr } => self.op_write(index, src, offset, addr),
            Instruction::Sqrt { src, dst } => self.op_sqrt(index, src, dst),
        }
    }

    /// Reads register `reg`.
    ///
    /// The assembler already range-checks register operands, but the program
    /// file is an independently editable artifact, so the index is checked
    /// again against the live register file.
    fn reg(&self, index: usize, reg: u8) -> Result<Word, VmError> {
        self.registers
            .get(reg as usize)
            .copied()
            .ok_or(VmError::RegisterOutOfBounds {
                index,
                register: reg,
                count: self.registers.len(),
            })
    }

    /// Stores `value` into register `reg`, with the same defensive check as
    /// [`reg`](Self::reg).
    fn set_reg(&mut self, index: usize, reg: u8, value: Word) -> Result<(), VmError> {
        let count = self.registers.len();
        let slot =
            self.registers
                .get_mut(reg as usize)
                .ok_or(VmError::RegisterOutOfBounds {
                    index,
                    register: reg,
                    count,
                })?;
        *slot = value;
        Ok(())
    }

    /// Resolves a signed address to a memory cell index.
    fn cell_index(&self, index: usize, op: &'static str, address: i64) -> Result<usize, VmError> {
        match usize::try_from(address) {
            Ok(cell) if cell < self.memory.len() => Ok(cell),
            _ => Err(VmError::MemoryOutOfBounds {
                index,
                op,
                address,
                size: self.memory.len(),
            }),
        }
    }

    fn op_load(&mut self, index: usize, value: i32, dst: u8) -> Result<(), VmError> {
        self.set_reg(index, dst, Word::from(value))
    }

    fn op_read(&mut self, index: usize, src: u8, dst: u8) -> Result<(), VmError> {
        let address = self.reg(index, src)?;
        let cell = self.cell_index(index, "READ", address)?;
        let value = self.memory[cell];
        self.set_reg(index, dst, value)
    }

    fn op_write(&mut self, index: usize, src: u8, offset: i32, addr: u8) -> Result<(), VmError> {
        // effective address: signed base register plus signed offset,
        // checked before the store
        let address = self.reg(index, addr)?.saturating_add(Word::from(offset));
        let cell = self.cell_index(index, "WRITE", address)?;
        self.memory[cell] = self.reg(index, src)?;
        Ok(())
    }

    fn op_sqrt(&mut self, index: usize, src: usize, dst: usize) -> Result<(), VmError> {
        // the only place SQRT addresses are ever validated
        let size = self.memory.len();
        if src >= size {
            return Err(VmError::MemoryOutOfBounds {
                index,
                op: "SQRT",
                address: src as i64,
                size,
            });
        }
        if dst >= size {
            return Err(VmError::MemoryOutOfBounds {
                index,
                op: "SQRT",
                address: dst as i64,
                size,
            });
        }
        let value = self.memory[src];
        // negative radicands clamp to zero: the instruction set has no
        // representation for a signalled error value
        let root = if value < 0 {
            0
        } else {
            (value as u64).isqrt() as Word
        };
        self.memory[dst] = root;
        Ok(())
    }

    /// The full memory array.
    pub fn memory(&self) -> &[Word] {
        &self.memory
    }

    /// The register file.
    pub fn registers(&self) -> &[Word] {
        &self.registers
    }

    /// Current program counter.
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Captures a read-only snapshot of the inclusive address range
    /// `[start, end]`, clipped to the memory array.
    pub fn dump(&self, start: i64, end: i64) -> MemoryDump {
        MemoryDump::capture(&self.memory, start, end)
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
