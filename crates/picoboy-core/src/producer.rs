use std::sync::Arc;

use log::warn;

use crate::busy::BusyFlag;
use crate::channel::CommandSender;
use crate::command::Command;
use crate::dirty::DirtyLineFilter;
use crate::hardware::{LCD_HEIGHT, LCD_WIDTH};
use crate::line_hash::{Crc32Hasher, LineHasher};
use crate::line_buffer::PixelLineBuffer;

/// Per-scanline callback the emulator drives once each line is rendered.
pub trait ScanlineSink {
    fn draw_line(&mut self, row: u8, pixels: &[u8; LCD_WIDTH]);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineOutcome {
    Forwarded,
    Suppressed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProducerStats {
    pub forwarded: u64,
    pub suppressed: u64,
    /// Forwarded lines that had to wait for the previous transfer.
    pub busy_waits: u64,
}

/// Emulation-core side of the pipeline.
///
/// Owns the dirty-line table and the staging copy of the current line, and
/// is the only writer of the command channel.
pub struct ScanlineProducer<H: LineHasher = Crc32Hasher> {
    hasher: H,
    filter: DirtyLineFilter,
    staging: [u8; LCD_WIDTH],
    line: Arc<PixelLineBuffer>,
    busy: BusyFlag,
    commands: CommandSender,
    stats: ProducerStats,
}

impl<H: LineHasher> ScanlineProducer<H> {
    pub fn new(
        hasher: H,
        line: Arc<PixelLineBuffer>,
        busy: BusyFlag,
        commands: CommandSender,
    ) -> Self {
        Self {
            hasher,
            filter: DirtyLineFilter::new(),
            staging: [0; LCD_WIDTH],
            line,
            busy,
            commands,
            stats: ProducerStats::default(),
        }
    }

    /// Hashes a rendered scanline and hands it to the display core if it
    /// differs from what that row last showed.
    ///
    /// Spins while the previous line is still being transferred, and while
    /// the command channel is full.
    pub fn submit_line(&mut self, row: u8, pixels: &[u8; LCD_WIDTH]) -> LineOutcome {
        if row as usize >= LCD_HEIGHT {
            warn!("scanline {row} is outside the picture; dropped");
            self.stats.suppressed += 1;
            return LineOutcome::Suppressed;
        }

        let hash = self.hasher.copy_and_hash(pixels, &mut self.staging);
        if !self.filter.should_forward(row as usize, hash) {
            self.stats.suppressed += 1;
            return LineOutcome::Suppressed;
        }

        // The shared line may still be feeding the previous transfer.
        if self.busy.wait_clear() {
            self.stats.busy_waits += 1;
        }
        self.line.publish(&self.staging);
        self.busy.set();
        self.commands.push(Command::DrawLine(row));
        self.stats.forwarded += 1;
        LineOutcome::Forwarded
    }

    /// Queues a color-depth change. Takes effect on the display core in
    /// queue order, without disturbing line transfers.
    pub fn set_idle_mode(&mut self, idle: bool) {
        self.commands.push(Command::SetIdleMode(idle));
    }

    pub fn stats(&self) -> ProducerStats {
        self.stats
    }
}

impl<H: LineHasher> ScanlineSink for ScanlineProducer<H> {
    fn draw_line(&mut self, row: u8, pixels: &[u8; LCD_WIDTH]) {
        self.submit_line(row, pixels);
    }
}
