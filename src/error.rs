use std::io;

use thiserror::Error;

/// Failure to get a program into memory.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("ROM is empty")]
    Empty,

    #[error("ROM size incorrect. Max size is {max} bytes but {size} bytes were provided")]
    RomTooLarge { size: usize, max: usize },

    #[error("error reading Chip-8 ROM: {0}")]
    Io(#[from] io::Error),
}

/// Failure while executing a single cycle.
///
/// Every variant is fatal: the instruction that produced it has no effect and the
/// machine refuses to run further.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("unimplemented opcode {opcode:#06X} at {pc:#05X}")]
    UnimplementedOpcode { opcode: u16, pc: u16 },

    #[error("call stack overflow at {pc:#05X}")]
    StackOverflow { pc: u16 },

    #[error("return with empty call stack at {pc:#05X}")]
    StackUnderflow { pc: u16 },

    #[error("memory access out of bounds at {address:#06X}")]
    MemoryOutOfBounds { address: usize },

    #[error("key {0:#04X} is not on the keypad")]
    InvalidKey(u8),

    #[error("machine is halted")]
    Halted,
}
