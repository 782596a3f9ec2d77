use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::display::Framebuffer;
use crate::error::{CpuError, LoadError};
use crate::instruction::Instruction;
use crate::memory::{Memory, Rom, GLYPH_BYTES, PROGRAM_START};
use crate::stack::CallStack;

/// Number of general purpose registers, V0 through VF.
pub const NUM_REGISTERS: usize = 16;
/// Number of keys on the hex keypad.
pub const NUM_KEYS: usize = 16;
// VF doubles as the carry/borrow/collision flag.
const FLAG: usize = 0x0F;

/// What the machine will do on the next [`Chip8::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineState {
    /// Fetching and executing instructions.
    Running,
    /// Blocked on Fx0A until a key is down; the key index goes to V`register`.
    WaitingForKey { register: u8 },
    /// Stopped by a fatal error; every further step fails.
    Halted(CpuError),
}

/// Result of one successful [`Chip8::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// The framebuffer was cleared or drawn to during this step.
    pub display_changed: bool,
    /// The machine is blocked until a key is pressed.
    pub waiting_for_key: bool,
}

// Where the program counter goes once an instruction has executed.
enum Advance {
    Next,
    Skip,
    Goto(u16),
}

impl Advance {
    fn skip_if(cond: bool) -> Self {
        if cond {
            Advance::Skip
        } else {
            Advance::Next
        }
    }
}

/// A Chip8 interpreter.
///
/// The host owns the run loop: it feeds key state in with [`Chip8::set_key_state`], calls
/// [`Chip8::step`] at whatever pace it likes and redraws from [`Chip8::framebuffer`] when
/// [`Chip8::take_redraw`] says so. Timers tick once per step.
#[derive(Debug)]
pub struct Chip8 {
    memory: Memory,
    registers: [u8; NUM_REGISTERS],
    stack: CallStack,
    pc: u16,
    index: u16,
    dt: u8,
    st: u8,
    keys: [bool; NUM_KEYS],
    display: Framebuffer,
    state: MachineState,
    update_screen: bool,
    rng: StdRng,
}

impl Chip8 {
    /// Returns a new Chip8 interpreter with an entropy-seeded random source.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Returns a new Chip8 interpreter whose Cxkk results are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Chip8 {
            memory: Memory::new(),
            registers: [0; NUM_REGISTERS],
            stack: CallStack::new(),
            pc: PROGRAM_START as u16,
            index: 0,
            dt: 0,
            st: 0,
            keys: [false; NUM_KEYS],
            display: Framebuffer::new(),
            state: MachineState::Running,
            update_screen: true,
            rng,
        }
    }

    /// Loads the provided bytes into memory at 0x200.
    pub fn load_program(&mut self, code: &[u8]) -> Result<(), LoadError> {
        self.memory.load_program(code)?;
        debug!("loaded {} byte program", code.len());
        Ok(())
    }

    /// Loads a validated ROM image.
    pub fn load_rom(&mut self, rom: &Rom) -> Result<(), LoadError> {
        self.load_program(rom)
    }

    /// Runs a single cycle.
    ///
    /// While waiting on Fx0A no instruction is fetched; the step either consumes a pressed
    /// key or does nothing. On error the instruction has no effect, the machine halts and
    /// the error is returned; later calls return [`CpuError::Halted`].
    pub fn step(&mut self) -> Result<StepOutcome, CpuError> {
        match self.state {
            MachineState::Halted(_) => return Err(CpuError::Halted),
            MachineState::WaitingForKey { register } => {
                if let Some(key) = self.pressed_key() {
                    debug!("key {key:X} pressed, stored in V{register:X}");
                    self.registers[register as usize] = key;
                    self.state = MachineState::Running;
                }
                self.tick_timers();
                return Ok(self.outcome(false));
            }
            MachineState::Running => {}
        }

        match self.execute_next() {
            Ok(display_changed) => {
                self.tick_timers();
                Ok(self.outcome(display_changed))
            }
            Err(e) => {
                warn!("halting: {e}");
                self.state = MachineState::Halted(e.clone());
                Err(e)
            }
        }
    }

    // Fetches, decodes and executes the instruction at PC. Returns whether the display changed.
    fn execute_next(&mut self) -> Result<bool, CpuError> {
        let pc = self.pc;
        let word = self.memory.word(pc as usize)?;
        let instr = Instruction::decode(word)
            .ok_or(CpuError::UnimplementedOpcode { opcode: word, pc })?;
        trace!("{pc:#05X}    {word:#06X}    {instr}");

        let mut display_changed = false;
        let advance = self.execute(instr, &mut display_changed)?;
        self.pc = match advance {
            Advance::Next => pc + 2,
            Advance::Skip => pc + 4,
            Advance::Goto(addr) => addr,
        };
        Ok(display_changed)
    }

    // Every fallible check happens before the first write, so an Err leaves the machine as it was.
    fn execute(&mut self, instr: Instruction, display_changed: &mut bool) -> Result<Advance, CpuError> {
        let pc = self.pc;
        let advance = match instr {
            // clear display
            Instruction::Clear => {
                debug!("clearing screen");
                self.display.clear();
                self.update_screen = true;
                *display_changed = true;
                Advance::Next
            }

            // return from subroutine, landing after the call
            Instruction::Return => {
                let addr = self.stack.pop().ok_or(CpuError::StackUnderflow { pc })?;
                Advance::Goto(addr + 2)
            }

            // jump to addr
            Instruction::Jump { nnn } => Advance::Goto(nnn),

            // call subroutine at nnn
            Instruction::Call { nnn } => {
                if !self.stack.push(pc) {
                    return Err(CpuError::StackOverflow { pc });
                }
                Advance::Goto(nnn)
            }

            // skip if Vx == kk
            Instruction::SkipEqByte { x, kk } => Advance::skip_if(self.v(x) == kk),

            // skip if Vx != kk
            Instruction::SkipNeByte { x, kk } => Advance::skip_if(self.v(x) != kk),

            // skip if Vx == Vy
            Instruction::SkipEqReg { x, y } => Advance::skip_if(self.v(x) == self.v(y)),

            // skip if Vx != Vy
            Instruction::SkipNeReg { x, y } => Advance::skip_if(self.v(x) != self.v(y)),

            Instruction::LoadByte { x, kk } => {
                self.set_v(x, kk);
                Advance::Next
            }

            // wrapping add, VF untouched
            Instruction::AddByte { x, kk } => {
                self.set_v(x, self.v(x).wrapping_add(kk));
                Advance::Next
            }

            Instruction::Move { x, y } => {
                self.set_v(x, self.v(y));
                Advance::Next
            }

            Instruction::Or { x, y } => {
                self.set_v(x, self.v(x) | self.v(y));
                Advance::Next
            }

            Instruction::And { x, y } => {
                self.set_v(x, self.v(x) & self.v(y));
                Advance::Next
            }

            Instruction::Xor { x, y } => {
                self.set_v(x, self.v(x) ^ self.v(y));
                Advance::Next
            }

            // VF is written before Vx, so with x == F the sum wins
            Instruction::AddReg { x, y } => {
                let (sum, carry) = self.v(x).overflowing_add(self.v(y));
                self.registers[FLAG] = u8::from(carry);
                self.set_v(x, sum);
                Advance::Next
            }

            // VF = 1 when no borrow occurs (Vx >= Vy)
            Instruction::SubReg { x, y } => {
                let (diff, borrow) = self.v(x).overflowing_sub(self.v(y));
                self.registers[FLAG] = u8::from(!borrow);
                self.set_v(x, diff);
                Advance::Next
            }

            // shifts Vx itself, Vy plays no part
            Instruction::ShiftRight { x } => {
                let vx = self.v(x);
                self.registers[FLAG] = vx & 0x01;
                self.set_v(x, vx >> 1);
                Advance::Next
            }

            Instruction::LoadIndex { nnn } => {
                self.index = nnn;
                Advance::Next
            }

            // jump to V0 + nnn
            Instruction::JumpOffset { nnn } => Advance::Goto(u16::from(self.v(0)) + nnn),

            Instruction::Random { x, kk } => {
                let r: u8 = self.rng.gen();
                self.set_v(x, r & kk);
                Advance::Next
            }

            // draw n bytes from I at (Vx, Vy); VF is only written on collision
            Instruction::Draw { x, y, n } => {
                let sprite = self.memory.slice(self.index as usize, n as usize)?;
                let (px, py) = (self.v(x) as usize, self.v(y) as usize);
                if self.display.draw(px, py, sprite) {
                    self.registers[FLAG] = 1;
                }
                self.update_screen = true;
                *display_changed = true;
                Advance::Next
            }

            Instruction::SkipKeyPressed { x } => Advance::skip_if(self.key(self.v(x))?),

            Instruction::SkipKeyNotPressed { x } => Advance::skip_if(!self.key(self.v(x))?),

            Instruction::LoadDelay { x } => {
                self.set_v(x, self.dt);
                Advance::Next
            }

            // block until keypress; step() resolves it
            Instruction::WaitKey { x } => {
                debug!("waiting for key press into V{x:X}");
                self.state = MachineState::WaitingForKey { register: x };
                Advance::Next
            }

            Instruction::SetDelay { x } => {
                self.dt = self.v(x);
                Advance::Next
            }

            Instruction::SetSound { x } => {
                self.st = self.v(x);
                Advance::Next
            }

            Instruction::AddIndex { x } => {
                self.index = self.index.wrapping_add(u16::from(self.v(x)));
                Advance::Next
            }

            // I = address of the font glyph for Vx
            Instruction::LoadGlyph { x } => {
                self.index = u16::from(self.v(x)) * GLYPH_BYTES as u16;
                Advance::Next
            }

            // mem[I] = hundreds, I+1 = tens, I+2 = ones of Vx
            Instruction::StoreBcd { x } => {
                let vx = self.v(x);
                let out = self.memory.slice_mut(self.index as usize, 3)?;
                out.copy_from_slice(&[vx / 100, (vx / 10) % 10, vx % 10]);
                Advance::Next
            }

            // store V0 through Vx starting at memory[I], I unchanged
            Instruction::StoreRegisters { x } => {
                let count = x as usize + 1;
                let out = self.memory.slice_mut(self.index as usize, count)?;
                out.copy_from_slice(&self.registers[..count]);
                Advance::Next
            }

            // read V0 through Vx from memory starting at I, I unchanged
            Instruction::LoadRegisters { x } => {
                let count = x as usize + 1;
                let src = self.memory.slice(self.index as usize, count)?;
                self.registers[..count].copy_from_slice(src);
                Advance::Next
            }
        };
        Ok(advance)
    }

    fn tick_timers(&mut self) {
        self.dt = self.dt.saturating_sub(1);
        self.st = self.st.saturating_sub(1);
    }

    fn outcome(&self, display_changed: bool) -> StepOutcome {
        StepOutcome {
            display_changed,
            waiting_for_key: self.is_paused(),
        }
    }

    fn v(&self, reg: u8) -> u8 {
        self.registers[reg as usize]
    }

    fn set_v(&mut self, reg: u8, val: u8) {
        self.registers[reg as usize] = val;
    }

    fn key(&self, key: u8) -> Result<bool, CpuError> {
        self.keys
            .get(key as usize)
            .copied()
            .ok_or(CpuError::InvalidKey(key))
    }

    // Lowest-numbered key currently down.
    fn pressed_key(&self) -> Option<u8> {
        self.keys.iter().position(|&down| down).map(|key| key as u8)
    }

    /// Records whether `key` (0x0..=0xF) is held down.
    pub fn set_key_state(&mut self, key: u8, pressed: bool) -> Result<(), CpuError> {
        let slot = self
            .keys
            .get_mut(key as usize)
            .ok_or(CpuError::InvalidKey(key))?;
        *slot = pressed;
        Ok(())
    }

    /// Whether the machine is blocked on Fx0A.
    pub fn is_paused(&self) -> bool {
        matches!(self.state, MachineState::WaitingForKey { .. })
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.state, MachineState::Halted(_))
    }

    /// The error that halted the machine, if any.
    pub fn halt_reason(&self) -> Option<&CpuError> {
        match &self.state {
            MachineState::Halted(e) => Some(e),
            _ => None,
        }
    }

    /// Returns whether the framebuffer changed since the last call, and clears the flag.
    ///
    /// Starts out set so the first frame always gets drawn.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::replace(&mut self.update_screen, false)
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.display
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn registers(&self) -> &[u8; NUM_REGISTERS] {
        &self.registers
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn delay_timer(&self) -> u8 {
        self.dt
    }

    pub fn sound_timer(&self) -> u8 {
        self.st
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn key_states(&self) -> &[bool; NUM_KEYS] {
        &self.keys
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}
