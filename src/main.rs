use std::io::{self, Stdout, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use log::info;
use rip8::chip8::NUM_KEYS;
use rip8::{Chip8, Framebuffer, Rom};

// Time budget for one step, about 500 Hz.
const CYCLE: Duration = Duration::from_millis(2);
// Terminals only report presses, so a key counts as held for this many cycles.
const KEY_HOLD_CYCLES: u16 = 100;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Runs a Chip-8 ROM in the terminal. Esc quits.
struct Cli {
    /// The binary ROM file to run
    #[arg(value_name = "ROM")]
    rom: PathBuf,

    /// Seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let rom = Rom::from_file(&args.rom)
        .with_context(|| format!("loading {}", args.rom.display()))?;
    let mut chip8 = match args.seed {
        Some(seed) => Chip8::with_seed(seed),
        None => Chip8::new(),
    };
    chip8.load_rom(&rom)?;
    info!("running {} ({} bytes)", args.rom.display(), rom.len());

    let mut out = io::stdout();
    let res = {
        let _guard = TerminalGuard::enter(&mut out)?;
        run(&mut chip8, &mut out)
    };
    res.with_context(|| format!("stopped at {:#05X}", chip8.pc()))
}

// Steps the machine until Esc, Ctrl-C or an interpreter error.
fn run(chip8: &mut Chip8, out: &mut Stdout) -> anyhow::Result<()> {
    let mut keypad = Keypad::default();
    loop {
        let start = Instant::now();

        while event::poll(Duration::ZERO)? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            match key.code {
                KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                KeyCode::Char(c) => {
                    if let Some(k) = keymap(c.to_ascii_lowercase()) {
                        match key.kind {
                            KeyEventKind::Release => keypad.release(k),
                            _ => keypad.press(k),
                        }
                    }
                }
                _ => {}
            }
        }

        for (key, down) in keypad.tick().into_iter().enumerate() {
            chip8.set_key_state(key as u8, down)?;
        }
        chip8.step()?;

        if chip8.take_redraw() {
            draw(out, chip8.framebuffer())?;
        }

        if let Some(rest) = CYCLE.checked_sub(start.elapsed()) {
            thread::sleep(rest);
        }
    }
}

// Hex keypad on the left of a qwerty keyboard:
//
//   1 2 3 C      1 2 3 4
//   4 5 6 D      q w e r
//   7 8 9 E      a s d f
//   A 0 B F      z x c v
fn keymap(c: char) -> Option<u8> {
    let key = match c {
        '1' => 0x1,
        '2' => 0x2,
        '3' => 0x3,
        '4' => 0xC,
        'q' => 0x4,
        'w' => 0x5,
        'e' => 0x6,
        'r' => 0xD,
        'a' => 0x7,
        's' => 0x8,
        'd' => 0x9,
        'f' => 0xE,
        'z' => 0xA,
        'x' => 0x0,
        'c' => 0xB,
        'v' => 0xF,
        _ => return None,
    };
    Some(key)
}

/// Held-key emulation on top of press events.
#[derive(Debug, Default)]
struct Keypad {
    remaining: [u16; NUM_KEYS],
}

impl Keypad {
    fn press(&mut self, key: u8) {
        self.remaining[key as usize] = KEY_HOLD_CYCLES;
    }

    fn release(&mut self, key: u8) {
        self.remaining[key as usize] = 0;
    }

    /// Returns which keys are down this cycle and ages every press by one cycle.
    fn tick(&mut self) -> [bool; NUM_KEYS] {
        let mut down = [false; NUM_KEYS];
        for (slot, left) in down.iter_mut().zip(self.remaining.iter_mut()) {
            *slot = *left > 0;
            *left = left.saturating_sub(1);
        }
        down
    }
}

// Two pixel rows per terminal line.
fn half_blocks(fb: &Framebuffer) -> Vec<String> {
    fb.rows()
        .chunks(2)
        .map(|pair| {
            pair[0]
                .iter()
                .zip(pair[1].iter())
                .map(|(&top, &bottom)| match (top, bottom) {
                    (true, true) => '\u{2588}',
                    (true, false) => '\u{2580}',
                    (false, true) => '\u{2584}',
                    (false, false) => ' ',
                })
                .collect()
        })
        .collect()
}

fn draw(out: &mut impl Write, fb: &Framebuffer) -> io::Result<()> {
    for (line, text) in half_blocks(fb).into_iter().enumerate() {
        queue!(out, MoveTo(0, line as u16), Print(text))?;
    }
    out.flush()
}

/// Raw mode and the alternate screen for as long as it lives.
struct TerminalGuard;

impl TerminalGuard {
    fn enter(out: &mut Stdout) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(out, EnterAlternateScreen, Hide)?;
        Ok(TerminalGuard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // nothing useful to do if restoring fails
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}
