use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rip8::memory::{Memory, PROGRAM_START};
use rip8::{Instruction, Rom};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// A Chip-8 disassembler.
struct Cli {
    /// The binary ROM file to disassemble
    #[arg(long, value_name = "BINARY")]
    rom: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();
    let rom = Rom::from_file(&args.rom)
        .with_context(|| format!("loading {}", args.rom.display()))?;

    let mut memory = Memory::new();
    memory.load_program(&rom)?;

    let mut out = BufWriter::new(io::stdout().lock());
    disassemble(memory.program(), &mut out)?;
    out.flush()?;
    Ok(())
}

// One line per word. Data mixed into the code shows up as `???` or a trailing `DB`.
fn disassemble(code: &[u8], out: &mut impl Write) -> io::Result<()> {
    for (i, chunk) in code.chunks(2).enumerate() {
        let addr = PROGRAM_START + i * 2;
        match *chunk {
            [hi, lo] => {
                let word = u16::from_be_bytes([hi, lo]);
                match Instruction::decode(word) {
                    Some(instr) => writeln!(out, "{addr:#05X}: {word:04X}  {instr}")?,
                    None => writeln!(out, "{addr:#05X}: {word:04X}  ???")?,
                }
            }
            [byte] => writeln!(out, "{addr:#05X}: {byte:02X}    DB {byte:#04X}")?,
            _ => unreachable!("chunks(2) yields one or two bytes"),
        }
    }
    Ok(())
}
