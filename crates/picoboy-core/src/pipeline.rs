use std::sync::Arc;

use crate::busy::BusyFlag;
use crate::channel::command_channel;
use crate::display::{DisplayController, TransferEngine};
use crate::drive::DisplayDriveLoop;
use crate::hardware::{DEFAULT_CHANNEL_CAPACITY, Geometry};
use crate::line_buffer::PixelLineBuffer;
use crate::line_hash::Crc32Hasher;
use crate::palette::Palette;
use crate::producer::ScanlineProducer;

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub channel_capacity: usize,
    pub palette: Palette,
    pub geometry: Geometry,
    /// Stream lines through the transfer engine. When off, or when no engine
    /// is supplied, the display core writes every line inline.
    pub async_transfer: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            palette: Palette::default(),
            geometry: Geometry::default(),
            async_transfer: true,
        }
    }
}

/// Wires both halves of the pipeline around one command channel, one busy
/// flag and one shared pixel line.
///
/// The producer belongs on the emulation core, the drive loop on the
/// display core.
pub fn build<C: DisplayController + 'static>(
    config: &PipelineConfig,
    controller: C,
    engine: Option<Box<dyn TransferEngine>>,
) -> (ScanlineProducer, DisplayDriveLoop<C>) {
    let (tx, rx) = command_channel(config.channel_capacity);
    let busy = BusyFlag::new();
    let line = Arc::new(PixelLineBuffer::new());
    let engine = if config.async_transfer { engine } else { None };

    let producer = ScanlineProducer::new(Crc32Hasher::new(), Arc::clone(&line), busy.clone(), tx);
    let drive = DisplayDriveLoop::new(
        controller,
        engine,
        rx,
        busy,
        line,
        config.palette,
        config.geometry,
    );
    (producer, drive)
}
