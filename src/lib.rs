//! A Chip-8 interpreter core.
//!
//! [`Chip8`] owns memory, registers, timers, the key table and the framebuffer, and advances
//! one fetch-decode-execute cycle per [`Chip8::step`]. Rendering, input polling and pacing are
//! left to the host; see `src/main.rs` for a terminal one.
//!
//! ```
//! use rip8::Chip8;
//!
//! let mut chip8 = Chip8::new();
//! chip8.load_program(&[0x60, 0x05, 0xA2, 0xEA]).unwrap();
//! chip8.step().unwrap();
//! chip8.step().unwrap();
//! assert_eq!(chip8.registers()[0], 5);
//! assert_eq!(chip8.index(), 0x2EA);
//! ```

pub mod chip8;
pub mod display;
pub mod error;
pub mod instruction;
pub mod memory;
pub mod stack;

pub use chip8::{Chip8, MachineState, StepOutcome};
pub use display::Framebuffer;
pub use error::{CpuError, LoadError};
pub use instruction::Instruction;
pub use memory::Rom;
