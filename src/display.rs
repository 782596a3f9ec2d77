use std::fmt;

/// Width of the display in pixels.
pub const WIDTH: usize = 64;
/// Height of the display in pixels.
pub const HEIGHT: usize = 32;
/// Sprites are always one byte wide.
const SPRITE_WIDTH: usize = 8;

/// The monochrome pixel grid, indexed `[row][column]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: [[bool; WIDTH]; HEIGHT],
}

impl Framebuffer {
    pub fn new() -> Self {
        Framebuffer {
            pixels: [[false; WIDTH]; HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill([false; WIDTH]);
    }

    /// XORs `sprite` onto the grid with its top-left corner at (`x`, `y`).
    ///
    /// Each byte is one row, most significant bit leftmost. Pixels landing past the right or
    /// bottom edge are dropped rather than wrapped. Returns true if any lit pixel was
    /// turned off.
    pub fn draw(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut collision = false;
        for (row, &byte) in sprite.iter().enumerate() {
            let py = y + row;
            if py >= HEIGHT {
                break;
            }
            for col in 0..SPRITE_WIDTH {
                let px = x + col;
                if px >= WIDTH {
                    break;
                }
                let bit = (byte >> (SPRITE_WIDTH - 1 - col)) & 0x01 == 0x01;
                if !bit {
                    continue;
                }
                let cell = &mut self.pixels[py][px];
                if *cell {
                    collision = true;
                }
                *cell ^= bit;
            }
        }
        collision
    }

    /// Returns whether the pixel at (`x`, `y`) is lit; anything off-grid is unlit.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }

    pub fn rows(&self) -> &[[bool; WIDTH]; HEIGHT] {
        &self.pixels
    }

    pub fn is_clear(&self) -> bool {
        self.pixels.iter().flatten().all(|lit| !lit)
    }

    #[cfg(test)]
    pub(crate) fn fill(&mut self) {
        self.pixels.fill([true; WIDTH]);
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.pixels {
            for &lit in row {
                f.write_str(if lit { "#" } else { "-" })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
