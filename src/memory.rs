use std::fs;
use std::ops::{Deref, Range};
use std::path::Path;

use crate::error::{CpuError, LoadError};

/// Number of bytes in the Chip8's memory.
pub const MEM_BYTES: usize = 4096;
/// Address where programs are loaded and execution starts.
pub const PROGRAM_START: usize = 0x200;
/// Maximum allowed bytes of a user's ROM.
pub const MAX_ROM_BYTES: usize = MEM_BYTES - PROGRAM_START;
/// Bytes per font glyph.
pub const GLYPH_BYTES: usize = 5;

// Hex digit glyphs 0..=F, 4 pixels wide and 5 rows tall, stored at address 0.
const FONT: [u8; 16 * GLYPH_BYTES] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// The Chip8's flat 4K address space.
///
/// Every accessor is bounds-checked and reports [`CpuError::MemoryOutOfBounds`] with the first
/// offending address instead of panicking.
#[derive(Debug, Clone)]
pub struct Memory {
    bytes: [u8; MEM_BYTES],
    rom_len: usize,
}

impl Memory {
    /// Returns zeroed memory with the font loaded.
    pub fn new() -> Self {
        let mut memory = Memory {
            bytes: [0; MEM_BYTES],
            rom_len: 0,
        };
        memory.load_font();
        memory
    }

    fn load_font(&mut self) {
        self.bytes[..FONT.len()].copy_from_slice(&FONT);
    }

    /// Copies `code` to [`PROGRAM_START`], clearing whatever program was there before.
    ///
    /// Fails without touching memory if the program would run past the end of memory.
    pub fn load_program(&mut self, code: &[u8]) -> Result<(), LoadError> {
        if code.len() > MAX_ROM_BYTES {
            return Err(LoadError::RomTooLarge {
                size: code.len(),
                max: MAX_ROM_BYTES,
            });
        }
        self.bytes[PROGRAM_START..].fill(0);
        self.bytes[PROGRAM_START..PROGRAM_START + code.len()].copy_from_slice(code);
        self.rom_len = code.len();
        Ok(())
    }

    /// Length of the loaded program in bytes.
    pub fn rom_len(&self) -> usize {
        self.rom_len
    }

    /// The loaded program.
    pub fn program(&self) -> &[u8] {
        &self.bytes[PROGRAM_START..PROGRAM_START + self.rom_len]
    }

    /// Reads the big-endian instruction word at `address`.
    pub fn word(&self, address: usize) -> Result<u16, CpuError> {
        let bytes = self.slice(address, 2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn slice(&self, start: usize, len: usize) -> Result<&[u8], CpuError> {
        let range = Self::range(start, len)?;
        Ok(&self.bytes[range])
    }

    pub fn slice_mut(&mut self, start: usize, len: usize) -> Result<&mut [u8], CpuError> {
        let range = Self::range(start, len)?;
        Ok(&mut self.bytes[range])
    }

    /// The whole address space.
    pub fn as_bytes(&self) -> &[u8; MEM_BYTES] {
        &self.bytes
    }

    fn range(start: usize, len: usize) -> Result<Range<usize>, CpuError> {
        if start >= MEM_BYTES {
            return Err(CpuError::MemoryOutOfBounds { address: start });
        }
        let end = start + len;
        if end > MEM_BYTES {
            // first address that doesn't exist
            return Err(CpuError::MemoryOutOfBounds { address: MEM_BYTES });
        }
        Ok(start..end)
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

/// A Chip8 program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    code: Vec<u8>,
}

impl Rom {
    /// Returns a new Chip8 ROM.
    ///
    /// This function returns Err if `code.len() > MAX_ROM_BYTES || code.is_empty()`.
    pub fn with_code(code: Vec<u8>) -> Result<Self, LoadError> {
        if code.is_empty() {
            return Err(LoadError::Empty);
        }
        if code.len() > MAX_ROM_BYTES {
            return Err(LoadError::RomTooLarge {
                size: code.len(),
                max: MAX_ROM_BYTES,
            });
        }
        Ok(Rom { code })
    }

    /// Reads a raw ROM image from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let code = fs::read(path)?;
        Self::with_code(code)
    }
}

impl Deref for Rom {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rom_with_code_creates_new_proper_rom() {
        let code = vec![10; MAX_ROM_BYTES];
        let rom = Rom::with_code(code).unwrap();
        assert_eq!(rom.len(), MAX_ROM_BYTES);
    }

    #[test]
    fn rom_with_code_rejects_too_large() {
        let code = vec![1; MAX_ROM_BYTES + 1];
        let rom = Rom::with_code(code);
        assert!(matches!(
            rom,
            Err(LoadError::RomTooLarge { size, max: MAX_ROM_BYTES }) if size == MAX_ROM_BYTES + 1
        ));
    }

    #[test]
    fn rom_with_code_rejects_too_small() {
        let rom = Rom::with_code(Vec::new());
        assert!(matches!(rom, Err(LoadError::Empty)));
    }

    #[test]
    fn rom_from_missing_file_is_io_error() {
        let rom = Rom::from_file("this/rom/does/not/exist.ch8");
        assert!(matches!(rom, Err(LoadError::Io(_))));
    }

    #[test]
    fn memory_new_loads_font() {
        let memory = Memory::new();
        assert_eq!(&memory.as_bytes()[0..5], &[0xF0, 0x90, 0x90, 0x90, 0xF0]);
        assert_eq!(&memory.as_bytes()[75..80], &[0xF0, 0x80, 0xF0, 0x80, 0x80]);
        assert_eq!(&memory.as_bytes()[80..], &[0; MEM_BYTES - 80]);
    }

    #[test]
    fn memory_load_program_loads_into_memory() {
        let mut memory = Memory::new();
        memory.load_program(&[255; MAX_ROM_BYTES]).unwrap();
        assert_eq!(&memory.as_bytes()[PROGRAM_START..], &[255; MAX_ROM_BYTES]);
        assert_eq!(memory.rom_len(), MAX_ROM_BYTES);
    }

    #[test]
    fn memory_load_program_loads_smaller_rom_into_memory() {
        let mut memory = Memory::new();
        memory.load_program(&[255; 100]).unwrap();
        assert_eq!(&memory.as_bytes()[0x200..0x200 + 100], &[255; 100]);
        assert_eq!(&memory.as_bytes()[0x200 + 100..], &[0; MAX_ROM_BYTES - 100]);
        assert_eq!(memory.program(), &[255; 100]);
    }

    #[test]
    fn memory_reload_clears_previous_program() {
        let mut memory = Memory::new();
        memory.load_program(&[0xAA; 10]).unwrap();
        memory.load_program(&[0xBB; 4]).unwrap();
        assert_eq!(&memory.as_bytes()[0x200..0x20A], &[0xBB, 0xBB, 0xBB, 0xBB, 0, 0, 0, 0, 0, 0]);
        assert_eq!(memory.rom_len(), 4);
    }

    #[test]
    fn memory_load_program_rejects_overflow_untouched() {
        let mut memory = Memory::new();
        memory.load_program(&[0x12, 0x34]).unwrap();
        let res = memory.load_program(&[1; MAX_ROM_BYTES + 1]);
        assert!(matches!(res, Err(LoadError::RomTooLarge { .. })));
        assert_eq!(memory.program(), &[0x12, 0x34]);
    }

    #[test]
    fn memory_word_is_big_endian() {
        let mut memory = Memory::new();
        memory.load_program(&[0xAA, 0xBB]).unwrap();
        assert_eq!(memory.word(0x200).unwrap(), 0xAABB);
    }

    #[test]
    fn memory_word_at_last_byte_is_out_of_bounds() {
        let memory = Memory::new();
        assert_eq!(memory.word(0xFFE).unwrap(), 0);
        assert_eq!(
            memory.word(0xFFF),
            Err(CpuError::MemoryOutOfBounds { address: MEM_BYTES })
        );
    }

    #[test]
    fn memory_slice_mut_rejects_spill() {
        let mut memory = Memory::new();
        assert!(memory.slice_mut(0xFFD, 3).is_ok());
        assert!(memory.slice_mut(0xFFD, 4).is_err());
        assert!(memory.slice_mut(MEM_BYTES + 10, 0).is_err());
    }
}
