use std::fmt;

use crate::opcode::Opcode;

/// One decoded CHIP-8 instruction. Register operands are indices 0x0..=0xF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearScreen,
    /// 00EE
    Return,
    /// 1nnn
    Jump { addr: u16 },
    /// 2nnn
    Call { addr: u16 },
    /// 3xkk
    SkipIfEqual { x: u8, kk: u8 },
    /// 4xkk
    SkipIfNotEqual { x: u8, kk: u8 },
    /// 5xy0
    SkipIfRegistersEqual { x: u8, y: u8 },
    /// 6xkk
    Load { x: u8, kk: u8 },
    /// 7xkk, wraps without touching VF
    AddImmediate { x: u8, kk: u8 },
    /// 8xy0
    Move { x: u8, y: u8 },
    /// 8xy1
    Or { x: u8, y: u8 },
    /// 8xy2
    And { x: u8, y: u8 },
    /// 8xy3
    Xor { x: u8, y: u8 },
    /// 8xy4, VF = carry
    Add { x: u8, y: u8 },
    /// 8xy5, VF = Vx > Vy
    Sub { x: u8, y: u8 },
    /// 8xy6, VF = bit shifted out
    ShiftRight { x: u8 },
    /// 8xy7, Vx = Vy - Vx, VF = Vy > Vx
    SubReverse { x: u8, y: u8 },
    /// 8xyE, VF = bit shifted out
    ShiftLeft { x: u8 },
    /// 9xy0
    SkipIfRegistersNotEqual { x: u8, y: u8 },
    /// Annn
    LoadIndex { addr: u16 },
    /// Bnnn
    JumpOffset { addr: u16 },
    /// Cxkk
    Random { x: u8, kk: u8 },
    /// Dxyn
    Draw { x: u8, y: u8, rows: u8 },
    /// Ex9E
    SkipIfKeyPressed { x: u8 },
    /// ExA1
    SkipIfKeyNotPressed { x: u8 },
    /// Fx07
    ReadDelay { x: u8 },
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
    /// anything else, including 0nnn machine routines
    Unknown(u16),
}

impl Instruction {
    /// bytes in, instruction out; never fails, unassigned words become Unknown
    pub fn decode(op: u16) -> Self {
        use Instruction::*;

        let (x, y, kk, addr) = (op.x(), op.y(), op.kk(), op.addr());
        match (op.family(), op.n()) {
            (0x0, _) if op == 0x00E0 => ClearScreen,
            (0x0, _) if op == 0x00EE => Return,
            (0x1, _) => Jump { addr },
            (0x2, _) => Call { addr },
            (0x3, _) => SkipIfEqual { x, kk },
            (0x4, _) => SkipIfNotEqual { x, kk },
            (0x5, 0x0) => SkipIfRegistersEqual { x, y },
            (0x6, _) => Load { x, kk },
            (0x7, _) => AddImmediate { x, kk },
            (0x8, 0x0) => Move { x, y },
            (0x8, 0x1) => Or { x, y },
            (0x8, 0x2) => And { x, y },
            (0x8, 0x3) => Xor { x, y },
            (0x8, 0x4) => Add { x, y },
            (0x8, 0x5) => Sub { x, y },
            (0x8, 0x6) => ShiftRight { x },
            (0x8, 0x7) => SubReverse { x, y },
            (0x8, 0xE) => ShiftLeft { x },
            (0x9, 0x0) => SkipIfRegistersNotEqual { x, y },
            (0xA, _) => LoadIndex { addr },
            (0xB, _) => JumpOffset { addr },
            (0xC, _) => Random { x, kk },
            (0xD, rows) => Draw { x, y, rows },
            (0xE, _) => match kk {
                0x9E => SkipIfKeyPressed { x },
                0xA1 => SkipIfKeyNotPressed { x },
                _ => Unknown(op),
            },
            (0xF, _) => match kk {
                0x07 => ReadDelay { x },
                0x0A => WaitKey { x },
                0x15 => SetDelay { x },
                0x18 => SetSound { x },
                0x1E => AddIndex { x },
                0x29 => LoadGlyph { x },
                0x33 => StoreBcd { x },
                0x55 => StoreRegisters { x },
                0x65 => LoadRegisters { x },
                _ => Unknown(op),
            },
            _ => Unknown(op),
        }
    }
}

/// assembler-ish mnemonics, handy in trace logs
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match *self {
            ClearScreen => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump { addr } => write!(f, "JP {:#05X}", addr),
            Call { addr } => write!(f, "CALL {:#05X}", addr),
            SkipIfEqual { x, kk } => write!(f, "SE V{:X}, {:#04X}", x, kk),
            SkipIfNotEqual { x, kk } => write!(f, "SNE V{:X}, {:#04X}", x, kk),
            SkipIfRegistersEqual { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            Load { x, kk } => write!(f, "LD V{:X}, {:#04X}", x, kk),
            AddImmediate { x, kk } => write!(f, "ADD V{:X}, {:#04X}", x, kk),
            Move { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            Add { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            ShiftRight { x } => write!(f, "SHR V{:X}", x),
            SubReverse { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            ShiftLeft { x } => write!(f, "SHL V{:X}", x),
            SkipIfRegistersNotEqual { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            LoadIndex { addr } => write!(f, "LD I, {:#05X}", addr),
            JumpOffset { addr } => write!(f, "JP V0, {:#05X}", addr),
            Random { x, kk } => write!(f, "RND V{:X}, {:#04X}", x, kk),
            Draw { x, y, rows } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, rows),
            SkipIfKeyPressed { x } => write!(f, "SKP V{:X}", x),
            SkipIfKeyNotPressed { x } => write!(f, "SKNP V{:X}", x),
            ReadDelay { x } => write!(f, "LD V{:X}, DT", x),
            WaitKey { x } => write!(f, "LD V{:X}, K", x),
            SetDelay { x } => write!(f, "LD DT, V{:X}", x),
            SetSound { x } => write!(f, "LD ST, V{:X}", x),
            AddIndex { x } => write!(f, "ADD I, V{:X}", x),
            LoadGlyph { x } => write!(f, "LD F, V{:X}", x),
            StoreBcd { x } => write!(f, "LD B, V{:X}", x),
            StoreRegisters { x } => write!(f, "LD [I], V{:X}", x),
            LoadRegisters { x } => write!(f, "LD V{:X}, [I]", x),
            Unknown(op) => write!(f, "??? {:04X}", op),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Instruction::*;
    use super::*;

    #[test]
    fn test_decode_system_family() {
        assert_eq!(Instruction::decode(0x00E0), ClearScreen);
        assert_eq!(Instruction::decode(0x00EE), Return);
        // 0nnn machine routines aren't emulated
        assert_eq!(Instruction::decode(0x0123), Unknown(0x0123));
    }

    #[test]
    fn test_decode_operands() {
        assert_eq!(Instruction::decode(0x1A5F), Jump { addr: 0xA5F });
        assert_eq!(Instruction::decode(0x2123), Call { addr: 0x123 });
        assert_eq!(Instruction::decode(0x3411), SkipIfEqual { x: 4, kk: 0x11 });
        assert_eq!(Instruction::decode(0x6AC5), Load { x: 0xA, kk: 0xC5 });
        assert_eq!(
            Instruction::decode(0xD01F),
            Draw {
                x: 0,
                y: 1,
                rows: 0xF
            }
        );
        assert_eq!(Instruction::decode(0xB300), JumpOffset { addr: 0x300 });
    }

    #[test]
    fn test_decode_alu_family() {
        assert_eq!(Instruction::decode(0x8124), Add { x: 1, y: 2 });
        assert_eq!(Instruction::decode(0x8125), Sub { x: 1, y: 2 });
        assert_eq!(Instruction::decode(0x8126), ShiftRight { x: 1 });
        assert_eq!(Instruction::decode(0x8127), SubReverse { x: 1, y: 2 });
        assert_eq!(Instruction::decode(0x812E), ShiftLeft { x: 1 });
        assert_eq!(Instruction::decode(0x8128), Unknown(0x8128));
    }

    #[test]
    fn test_decode_nested_families() {
        assert_eq!(Instruction::decode(0x5120), SkipIfRegistersEqual { x: 1, y: 2 });
        assert_eq!(Instruction::decode(0x5121), Unknown(0x5121));
        assert_eq!(Instruction::decode(0x9120), SkipIfRegistersNotEqual { x: 1, y: 2 });
        assert_eq!(Instruction::decode(0x9121), Unknown(0x9121));
        assert_eq!(Instruction::decode(0xE39E), SkipIfKeyPressed { x: 3 });
        assert_eq!(Instruction::decode(0xE3A1), SkipIfKeyNotPressed { x: 3 });
        assert_eq!(Instruction::decode(0xE3A2), Unknown(0xE3A2));
        assert_eq!(Instruction::decode(0xF50A), WaitKey { x: 5 });
        assert_eq!(Instruction::decode(0xF533), StoreBcd { x: 5 });
        assert_eq!(Instruction::decode(0xF565), LoadRegisters { x: 5 });
        assert_eq!(Instruction::decode(0xF5FF), Unknown(0xF5FF));
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(Instruction::decode(0xA22A).to_string(), "LD I, 0x22A");
        assert_eq!(Instruction::decode(0xD01F).to_string(), "DRW V0, V1, 15");
        assert_eq!(Instruction::decode(0xFFFF).to_string(), "??? FFFF");
    }
}
