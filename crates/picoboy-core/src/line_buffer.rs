use std::sync::atomic::{AtomicU32, Ordering};

use crate::hardware::LCD_WIDTH;

const WORDS: usize = LCD_WIDTH / 4;

/// One scanline of raw pixel bytes shared between the two cores.
///
/// The emulation core publishes a line while the busy flag is clear; the
/// display core reads it after popping the matching `DrawLine`, before the
/// flag is cleared again. Storage is word-sized, the way the bulk copy moves
/// it, and the command channel provides the ordering between the two sides.
pub struct PixelLineBuffer {
    words: [AtomicU32; WORDS],
}

impl Default for PixelLineBuffer {
    fn default() -> Self {
        Self {
            words: std::array::from_fn(|_| AtomicU32::new(0)),
        }
    }
}

impl PixelLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `line`. Only the emulation core calls this, and only while no
    /// transfer is outstanding.
    pub fn publish(&self, line: &[u8; LCD_WIDTH]) {
        for (slot, chunk) in self.words.iter().zip(line.chunks_exact(4)) {
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            slot.store(word, Ordering::Relaxed);
        }
    }

    /// Copies the current line out.
    pub fn snapshot(&self) -> [u8; LCD_WIDTH] {
        let mut line = [0u8; LCD_WIDTH];
        for (chunk, slot) in line.chunks_exact_mut(4).zip(self.words.iter()) {
            chunk.copy_from_slice(&slot.load(Ordering::Relaxed).to_le_bytes());
        }
        line
    }
}
