use std::fmt;

/// A decoded Chip8 instruction.
///
/// `x` and `y` are register indices, `kk` an immediate byte, `nnn` a 12-bit address
/// and `n` the sprite height of a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    Clear,
    /// 00EE
    Return,
    /// 1nnn
    Jump { nnn: u16 },
    /// 2nnn
    Call { nnn: u16 },
    /// 3xkk
    SkipEqByte { x: u8, kk: u8 },
    /// 4xkk
    SkipNeByte { x: u8, kk: u8 },
    /// 5xy0
    SkipEqReg { x: u8, y: u8 },
    /// 6xkk
    LoadByte { x: u8, kk: u8 },
    /// 7xkk
    AddByte { x: u8, kk: u8 },
    /// 8xy0
    Move { x: u8, y: u8 },
    /// 8xy1
    Or { x: u8, y: u8 },
    /// 8xy2
    And { x: u8, y: u8 },
    /// 8xy3
    Xor { x: u8, y: u8 },
    /// 8xy4
    AddReg { x: u8, y: u8 },
    /// 8xy5
    SubReg { x: u8, y: u8 },
    /// 8xy6, shifts Vx in place; Vy is ignored
    ShiftRight { x: u8 },
    /// 9xy0
    SkipNeReg { x: u8, y: u8 },
    /// Annn
    LoadIndex { nnn: u16 },
    /// Bnnn
    JumpOffset { nnn: u16 },
    /// Cxkk
    Random { x: u8, kk: u8 },
    /// Dxyn
    Draw { x: u8, y: u8, n: u8 },
    /// Ex9E
    SkipKeyPressed { x: u8 },
    /// ExA1
    SkipKeyNotPressed { x: u8 },
    /// Fx07
    LoadDelay { x: u8 },
    /// Fx0A
    WaitKey { x: u8 },
    /// Fx15
    SetDelay { x: u8 },
    /// Fx18
    SetSound { x: u8 },
    /// Fx1E
    AddIndex { x: u8 },
    /// Fx29
    LoadGlyph { x: u8 },
    /// Fx33
    StoreBcd { x: u8 },
    /// Fx55
    StoreRegisters { x: u8 },
    /// Fx65
    LoadRegisters { x: u8 },
}

impl Instruction {
    /// Decodes a big-endian instruction word.
    ///
    /// Returns `None` for every word without defined behavior, which includes `0nnn` machine
    /// calls and the `8xy7`/`8xyE` forms this interpreter leaves unimplemented.
    pub fn decode(word: u16) -> Option<Self> {
        let x = ((word & 0x0F00) >> 8) as u8;
        let y = ((word & 0x00F0) >> 4) as u8;
        let n = (word & 0x000F) as u8;
        let kk = (word & 0x00FF) as u8;
        let nnn = word & 0x0FFF;

        let instr = match (word & 0xF000) >> 12 {
            0x0 => match word {
                0x00E0 => Instruction::Clear,
                0x00EE => Instruction::Return,
                _ => return None,
            },
            0x1 => Instruction::Jump { nnn },
            0x2 => Instruction::Call { nnn },
            0x3 => Instruction::SkipEqByte { x, kk },
            0x4 => Instruction::SkipNeByte { x, kk },
            0x5 if n == 0 => Instruction::SkipEqReg { x, y },
            0x6 => Instruction::LoadByte { x, kk },
            0x7 => Instruction::AddByte { x, kk },
            0x8 => match n {
                0x0 => Instruction::Move { x, y },
                0x1 => Instruction::Or { x, y },
                0x2 => Instruction::And { x, y },
                0x3 => Instruction::Xor { x, y },
                0x4 => Instruction::AddReg { x, y },
                0x5 => Instruction::SubReg { x, y },
                0x6 => Instruction::ShiftRight { x },
                _ => return None,
            },
            0x9 if n == 0 => Instruction::SkipNeReg { x, y },
            0xA => Instruction::LoadIndex { nnn },
            0xB => Instruction::JumpOffset { nnn },
            0xC => Instruction::Random { x, kk },
            0xD => Instruction::Draw { x, y, n },
            0xE => match kk {
                0x9E => Instruction::SkipKeyPressed { x },
                0xA1 => Instruction::SkipKeyNotPressed { x },
                _ => return None,
            },
            0xF => match kk {
                0x07 => Instruction::LoadDelay { x },
                0x0A => Instruction::WaitKey { x },
                0x15 => Instruction::SetDelay { x },
                0x18 => Instruction::SetSound { x },
                0x1E => Instruction::AddIndex { x },
                0x29 => Instruction::LoadGlyph { x },
                0x33 => Instruction::StoreBcd { x },
                0x55 => Instruction::StoreRegisters { x },
                0x65 => Instruction::LoadRegisters { x },
                _ => return None,
            },
            _ => return None,
        };
        Some(instr)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            Clear => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump { nnn } => write!(f, "JP {nnn:#05X}"),
            Call { nnn } => write!(f, "CALL {nnn:#05X}"),
            SkipEqByte { x, kk } => write!(f, "SE V{x:X}, {kk:#04X}"),
            SkipNeByte { x, kk } => write!(f, "SNE V{x:X}, {kk:#04X}"),
            SkipEqReg { x, y } => write!(f, "SE V{x:X}, V{y:X}"),
            LoadByte { x, kk } => write!(f, "LD V{x:X}, {kk:#04X}"),
            AddByte { x, kk } => write!(f, "ADD V{x:X}, {kk:#04X}"),
            Move { x, y } => write!(f, "LD V{x:X}, V{y:X}"),
            Or { x, y } => write!(f, "OR V{x:X}, V{y:X}"),
            And { x, y } => write!(f, "AND V{x:X}, V{y:X}"),
            Xor { x, y } => write!(f, "XOR V{x:X}, V{y:X}"),
            AddReg { x, y } => write!(f, "ADD V{x:X}, V{y:X}"),
            SubReg { x, y } => write!(f, "SUB V{x:X}, V{y:X}"),
            ShiftRight { x } => write!(f, "SHR V{x:X}"),
            SkipNeReg { x, y } => write!(f, "SNE V{x:X}, V{y:X}"),
            LoadIndex { nnn } => write!(f, "LD I, {nnn:#05X}"),
            JumpOffset { nnn } => write!(f, "JP V0, {nnn:#05X}"),
            Random { x, kk } => write!(f, "RND V{x:X}, {kk:#04X}"),
            Draw { x, y, n } => write!(f, "DRW V{x:X}, V{y:X}, {n}"),
            SkipKeyPressed { x } => write!(f, "SKP V{x:X}"),
            SkipKeyNotPressed { x } => write!(f, "SKNP V{x:X}"),
            LoadDelay { x } => write!(f, "LD V{x:X}, DT"),
            WaitKey { x } => write!(f, "LD V{x:X}, K"),
            SetDelay { x } => write!(f, "LD DT, V{x:X}"),
            SetSound { x } => write!(f, "LD ST, V{x:X}"),
            AddIndex { x } => write!(f, "ADD I, V{x:X}"),
            LoadGlyph { x } => write!(f, "LD F, V{x:X}"),
            StoreBcd { x } => write!(f, "LD B, V{x:X}"),
            StoreRegisters { x } => write!(f, "LD [I], V{x:X}"),
            LoadRegisters { x } => write!(f, "LD V{x:X}, [I]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_system_group() {
        assert_eq!(Instruction::decode(0x00E0), Some(Instruction::Clear));
        assert_eq!(Instruction::decode(0x00EE), Some(Instruction::Return));
        assert_eq!(Instruction::decode(0x0000), None);
        assert_eq!(Instruction::decode(0x0123), None); // SYS addr
        assert_eq!(Instruction::decode(0x01E0), None);
    }

    #[test]
    fn decode_address_operand_is_low_12_bits() {
        assert_eq!(Instruction::decode(0x1ABC), Some(Instruction::Jump { nnn: 0xABC }));
        assert_eq!(Instruction::decode(0x2FFF), Some(Instruction::Call { nnn: 0xFFF }));
        assert_eq!(Instruction::decode(0xA2EA), Some(Instruction::LoadIndex { nnn: 0x2EA }));
        assert_eq!(Instruction::decode(0xB123), Some(Instruction::JumpOffset { nnn: 0x123 }));
    }

    #[test]
    fn decode_register_and_byte_operands() {
        assert_eq!(Instruction::decode(0x3A42), Some(Instruction::SkipEqByte { x: 0xA, kk: 0x42 }));
        assert_eq!(Instruction::decode(0x4B00), Some(Instruction::SkipNeByte { x: 0xB, kk: 0x00 }));
        assert_eq!(Instruction::decode(0x6005), Some(Instruction::LoadByte { x: 0, kk: 5 }));
        assert_eq!(Instruction::decode(0x7FFF), Some(Instruction::AddByte { x: 0xF, kk: 0xFF }));
        assert_eq!(Instruction::decode(0xC30F), Some(Instruction::Random { x: 3, kk: 0x0F }));
    }

    #[test]
    fn decode_register_pair_requires_zero_low_nibble() {
        assert_eq!(Instruction::decode(0x5120), Some(Instruction::SkipEqReg { x: 1, y: 2 }));
        assert_eq!(Instruction::decode(0x5121), None);
        assert_eq!(Instruction::decode(0x9AB0), Some(Instruction::SkipNeReg { x: 0xA, y: 0xB }));
        assert_eq!(Instruction::decode(0x9AB1), None);
    }

    #[test]
    fn decode_arithmetic_group() {
        assert_eq!(Instruction::decode(0x81E0), Some(Instruction::Move { x: 1, y: 0xE }));
        assert_eq!(Instruction::decode(0x8AB4), Some(Instruction::AddReg { x: 0xA, y: 0xB }));
        assert_eq!(Instruction::decode(0x8AB5), Some(Instruction::SubReg { x: 0xA, y: 0xB }));
        assert_eq!(Instruction::decode(0x8C26), Some(Instruction::ShiftRight { x: 0xC }));
        // left unimplemented
        assert_eq!(Instruction::decode(0x8127), None);
        assert_eq!(Instruction::decode(0x812E), None);
        assert_eq!(Instruction::decode(0x8128), None);
    }

    // Vy for OR/AND/XOR comes from the third nibble, same as every other 8xy_ form.
    // A variant that shifts the register value instead of the masked opcode would read
    // V[0xE0] here, which doesn't exist.
    #[test]
    fn decode_logic_ops_take_vy_from_third_nibble() {
        assert_eq!(Instruction::decode(0x82E1), Some(Instruction::Or { x: 2, y: 0xE }));
        assert_eq!(Instruction::decode(0x89A2), Some(Instruction::And { x: 9, y: 0xA }));
        assert_eq!(Instruction::decode(0x8823), Some(Instruction::Xor { x: 8, y: 2 }));
    }

    #[test]
    fn decode_draw() {
        assert_eq!(Instruction::decode(0xDAB5), Some(Instruction::Draw { x: 0xA, y: 0xB, n: 5 }));
        assert_eq!(Instruction::decode(0xD010), Some(Instruction::Draw { x: 0, y: 1, n: 0 }));
    }

    #[test]
    fn decode_key_and_misc_groups() {
        assert_eq!(Instruction::decode(0xE39E), Some(Instruction::SkipKeyPressed { x: 3 }));
        assert_eq!(Instruction::decode(0xE3A1), Some(Instruction::SkipKeyNotPressed { x: 3 }));
        assert_eq!(Instruction::decode(0xE3A2), None);
        assert_eq!(Instruction::decode(0xF107), Some(Instruction::LoadDelay { x: 1 }));
        assert_eq!(Instruction::decode(0xF20A), Some(Instruction::WaitKey { x: 2 }));
        assert_eq!(Instruction::decode(0xF315), Some(Instruction::SetDelay { x: 3 }));
        assert_eq!(Instruction::decode(0xF418), Some(Instruction::SetSound { x: 4 }));
        assert_eq!(Instruction::decode(0xF51E), Some(Instruction::AddIndex { x: 5 }));
        assert_eq!(Instruction::decode(0xF629), Some(Instruction::LoadGlyph { x: 6 }));
        assert_eq!(Instruction::decode(0xF733), Some(Instruction::StoreBcd { x: 7 }));
        assert_eq!(Instruction::decode(0xF855), Some(Instruction::StoreRegisters { x: 8 }));
        assert_eq!(Instruction::decode(0xF965), Some(Instruction::LoadRegisters { x: 9 }));
        assert_eq!(Instruction::decode(0xF075), None);
    }

    #[test]
    fn display_mnemonics() {
        let cases = [
            (0x00E0, "CLS"),
            (0x00EE, "RET"),
            (0x1208, "JP 0x208"),
            (0x220A, "CALL 0x20A"),
            (0x3DAB, "SE VD, 0xAB"),
            (0x5AB0, "SE VA, VB"),
            (0x6A4B, "LD VA, 0x4B"),
            (0x8AB4, "ADD VA, VB"),
            (0x8C26, "SHR VC"),
            (0xA2EA, "LD I, 0x2EA"),
            (0xB1F7, "JP V0, 0x1F7"),
            (0xDAB5, "DRW VA, VB, 5"),
            (0xE09E, "SKP V0"),
            (0xF20A, "LD V2, K"),
            (0xFA33, "LD B, VA"),
            (0xFE55, "LD [I], VE"),
            (0xFE65, "LD VE, [I]"),
        ];
        for (word, text) in cases {
            let instr = Instruction::decode(word).unwrap();
            assert_eq!(instr.to_string(), text, "word {word:#06X}");
        }
    }
}
