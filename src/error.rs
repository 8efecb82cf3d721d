use std::io;
use thiserror::Error;

/// Everything that can stop a CHIP-8 run. Unknown opcodes are not in here:
/// the interpreter logs and skips them.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("program image is too large ({size} bytes), at most {max_size} bytes fit above 0x200")]
    ImageTooLarge { size: usize, max_size: usize },

    #[error("failed to read program image")]
    ImageRead(#[source] io::Error),

    #[error("stack underflow: return at {pc:#05X} with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error("stack overflow: call at {pc:#05X} with {depth} subroutines already nested")]
    StackOverflow { pc: u16, depth: usize },

    #[error("sprite of {rows} rows at {addr:#06X} runs past the end of memory")]
    SpriteOutOfBounds { addr: u16, rows: u8 },

    #[error("BCD of V{reg:X} written at {addr:#06X} runs past the end of memory")]
    BcdOutOfBounds { addr: u16, reg: u8 },

    #[error("storing V0..=V{last:X} at {addr:#06X} runs past the end of memory")]
    RegisterStoreOutOfBounds { addr: u16, last: u8 },

    #[error("loading V0..=V{last:X} from {addr:#06X} runs past the end of memory")]
    RegisterLoadOutOfBounds { addr: u16, last: u8 },

    #[error("display failed")]
    Display(#[source] io::Error),
}
