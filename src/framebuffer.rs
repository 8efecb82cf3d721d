pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;
pub const PIXEL_COUNT: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT;

/// sprites are one byte per row, msb leftmost
pub const SPRITE_WIDTH: usize = 8;

// a sprite row must be exactly one RAM cell wide for the bit walk in draw_sprite
const _: () = assert!(SPRITE_WIDTH == u8::BITS as usize);

/// 64x32 monochrome grid, row-major. never resized.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: [bool; PIXEL_COUNT],
}

impl Framebuffer {
    pub fn new() -> Self {
        Framebuffer {
            pixels: [false; PIXEL_COUNT],
        }
    }

    pub fn clear(&mut self) {
        self.pixels = [false; PIXEL_COUNT];
    }

    /// None if (x, y) is off the grid
    pub fn get(&self, x: usize, y: usize) -> Option<bool> {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return None;
        }
        Some(self.pixels[y * DISPLAY_WIDTH + x])
    }

    pub fn pixels(&self) -> &[bool] {
        &self.pixels
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.pixels.chunks(DISPLAY_WIDTH)
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }

    /// XOR a sprite onto the grid and report whether any lit pixel was erased.
    ///
    /// The origin wraps around the grid; the sprite body doesn't. Columns past
    /// the right edge and rows past the bottom edge are clipped.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let x0 = x % DISPLAY_WIDTH;
        let y0 = y % DISPLAY_HEIGHT;
        let mut collision = false;

        for (row, &bits) in sprite.iter().enumerate() {
            let py = y0 + row;
            if py >= DISPLAY_HEIGHT {
                break;
            }
            for col in 0..SPRITE_WIDTH {
                let px = x0 + col;
                if px >= DISPLAY_WIDTH {
                    break;
                }
                if bits & (0x80 >> col) == 0 {
                    continue;
                }
                let pixel = &mut self.pixels[py * DISPLAY_WIDTH + px];
                collision |= *pixel;
                *pixel = !*pixel;
            }
        }
        collision
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|&p| if p { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLYPH_ZERO: [u8; 5] = [0xF0, 0x90, 0x90, 0x90, 0xF0];

    #[test]
    fn test_blank() {
        let fb = Framebuffer::new();
        assert_eq!(fb.pixels().len(), 2048);
        assert_eq!(fb.lit_count(), 0);
        assert_eq!(fb.rows().count(), 32);
    }

    #[test]
    fn test_draw_one_row() {
        let mut fb = Framebuffer::new();
        let collision = fb.draw_sprite(8, 2, &[0b1010_1011]);
        assert!(!collision);
        let row: Vec<bool> = (8..16).map(|x| fb.get(x, 2).unwrap()).collect();
        assert_eq!(
            row,
            [true, false, true, false, true, false, true, true]
        );
        assert_eq!(fb.get(7, 2), Some(false));
        assert_eq!(fb.get(16, 2), Some(false));
        assert_eq!(fb.lit_count(), 5);
    }

    #[test]
    fn test_draw_glyph_twice_erases() {
        let mut fb = Framebuffer::new();
        assert!(!fb.draw_sprite(0, 0, &GLYPH_ZERO));
        assert_eq!(fb.lit_count(), 14);
        // every lit pixel gets hit again, so this one collides
        assert!(fb.draw_sprite(0, 0, &GLYPH_ZERO));
        assert_eq!(fb, Framebuffer::new());
    }

    #[test]
    fn test_partial_overlap_collides() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(0, 0, &[0b1100_0000]);
        assert!(fb.draw_sprite(1, 0, &[0b1000_0000]));
        assert_eq!(fb.get(0, 0), Some(true));
        assert_eq!(fb.get(1, 0), Some(false));
    }

    #[test]
    fn test_no_collision_when_bits_dont_meet() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(0, 0, &[0b1010_1010]);
        assert!(!fb.draw_sprite(0, 0, &[0b0101_0101]));
        assert_eq!(fb.lit_count(), 8);
    }

    #[test]
    fn test_clip_right_edge() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(60, 0, &[0xFF]);
        assert_eq!(fb.lit_count(), 4);
        // nothing spilled onto the next row
        assert_eq!(fb.get(0, 1), Some(false));
        assert_eq!(fb.get(63, 0), Some(true));
    }

    #[test]
    fn test_clip_bottom_edge() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(0, 30, &[0x80; 5]);
        assert_eq!(fb.lit_count(), 2);
        assert_eq!(fb.get(0, 0), Some(false));
        assert_eq!(fb.get(0, 31), Some(true));
    }

    #[test]
    fn test_origin_wraps() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(64 + 3, 32 + 1, &[0x80]);
        assert_eq!(fb.get(3, 1), Some(true));
        assert_eq!(fb.lit_count(), 1);
    }

    #[test]
    fn test_clear() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(10, 10, &GLYPH_ZERO);
        fb.clear();
        assert_eq!(fb.lit_count(), 0);
    }
}
