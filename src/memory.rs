use std::io;

use crate::error::Chip8Error;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// how much RAM we have
pub const MEMORY_SIZE: usize = 4096;

/// where the program is loaded
pub const PROGRAM_ADDR: u16 = 0x0200;

/// the font lives at the very bottom of RAM, so glyph n is at n * GLYPH_HEIGHT
pub const FONT_ADDR: u16 = 0x0000;
pub const GLYPH_HEIGHT: u16 = 5;
pub const FONT_SIZE: usize = FONT.len();

/// largest program image that fits between PROGRAM_ADDR and the top of RAM
pub const MAX_IMAGE_SIZE: usize = MEMORY_SIZE - PROGRAM_ADDR as usize;

/// Defines the CHIP-8 memory map, 4K configuration:
///   0x0000-0x004f  hex digit font
///   0x0050-0x01ff  reserved (interpreter area on the COSMAC VIP)
///   0x0200-0x0fff  program and data
///
/// the stack, registers and display are not memory mapped here; they live in
/// their own structures
pub struct Memory {
    bytes: Box<[u8]>,
}

impl Memory {
    /// zeroed RAM with the font baked in at FONT_ADDR
    pub fn new() -> Self {
        let mut bytes = vec![0u8; MEMORY_SIZE].into_boxed_slice();
        let font_addr = FONT_ADDR as usize;
        bytes[font_addr..font_addr + FONT_SIZE].copy_from_slice(&FONT);
        Memory { bytes }
    }

    /// read a whole program image and copy it in at 0x200
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, Chip8Error> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).map_err(Chip8Error::ImageRead)?;
        self.load_image(&buf)?;
        Ok(buf.len())
    }

    /// copy an in-memory image in at 0x200. nothing is written if it doesn't fit
    pub fn load_image(&mut self, image: &[u8]) -> Result<(), Chip8Error> {
        if image.len() > MAX_IMAGE_SIZE {
            return Err(Chip8Error::ImageTooLarge {
                size: image.len(),
                max_size: MAX_IMAGE_SIZE,
            });
        }
        let start = PROGRAM_ADDR as usize;
        self.bytes[start..start + image.len()].copy_from_slice(image);
        Ok(())
    }

    /// big-endian two-byte word, or None if it would straddle the top of RAM
    pub fn get_word(&self, addr: u16) -> Option<u16> {
        let word = self.get_ro_slice(addr, 2)?;
        Some(u16::from_be_bytes([word[0], word[1]]))
    }

    /// r/o slice of `len` bytes at `addr`, None if any of it is outside RAM
    pub fn get_ro_slice(&self, addr: u16, len: usize) -> Option<&[u8]> {
        let a = addr as usize;
        self.bytes.get(a..a.checked_add(len)?)
    }

    /// r/w slice of `len` bytes at `addr`, None if any of it is outside RAM
    pub fn get_rw_slice(&mut self, addr: u16, len: usize) -> Option<&mut [u8]> {
        let a = addr as usize;
        self.bytes.get_mut(a..a.checked_add(len)?)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

const FONT: [u8; 80] = [
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
