//! Simulated ILI9225-class panel plus a DMA engine that streams into it from
//! its own thread and signals completion like an end-of-transfer interrupt.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel as cb;
use log::{debug, trace};
use picoboy_core::display::{CompletionHandler, DisplayController, TransferEngine};
use picoboy_core::hardware::{PANEL_COLS, PANEL_ROWS, Window};
use picoboy_core::palette::rgb565_to_rgb888;

/// Bits clocked out per RGB565 pixel.
const BITS_PER_PIXEL: u64 = 16;

#[inline]
/// Color shown for `px` while the panel is in 8-color idle mode: each channel
/// collapses to fully on or off by its top bit.
pub fn idle_color(px: u16) -> u16 {
    let r = if px & 0x8000 != 0 { 0xF800 } else { 0 };
    let g = if px & 0x0400 != 0 { 0x07E0 } else { 0 };
    let b = if px & 0x0010 != 0 { 0x001F } else { 0 };
    r | g | b
}

pub struct PanelState {
    pixels: Vec<u16>,
    window: Window,
    row: u16,
    col: u16,
    streaming: bool,
    idle: bool,
    powered: bool,
    pixels_written: u64,
    /// Pixels that arrived outside a begin/end pair.
    stray_pixels: u64,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            pixels: vec![0; PANEL_ROWS * PANEL_COLS],
            window: Window::full_panel(),
            row: 0,
            col: 0,
            streaming: false,
            idle: false,
            powered: false,
            pixels_written: 0,
            stray_pixels: 0,
        }
    }
}

impl PanelState {
    fn write(&mut self, pixels: &[u16]) {
        if !self.streaming {
            self.stray_pixels += pixels.len() as u64;
            return;
        }
        for &px in pixels {
            let idx = self.row as usize * PANEL_COLS + self.col as usize;
            if let Some(slot) = self.pixels.get_mut(idx) {
                *slot = px;
            }
            self.advance();
        }
        self.pixels_written += pixels.len() as u64;
    }

    fn advance(&mut self) {
        if self.col < self.window.last_col {
            self.col += 1;
            return;
        }
        self.col = self.window.first_col;
        self.row = if self.row < self.window.last_row {
            self.row + 1
        } else {
            self.window.first_row
        };
    }

    /// Raw RGB565 value stored at a panel address.
    pub fn pixel(&self, row: usize, col: usize) -> u16 {
        self.pixels[row * PANEL_COLS + col]
    }

    /// Color currently visible at a panel address.
    pub fn visible(&self, row: usize, col: usize) -> u16 {
        let px = self.pixel(row, col);
        if self.idle { idle_color(px) } else { px }
    }

    /// Visible contents as packed 8-bit RGB, row-major.
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for row in 0..PANEL_ROWS {
            for col in 0..PANEL_COLS {
                out.extend_from_slice(&rgb565_to_rgb888(self.visible(row, col)));
            }
        }
        out
    }

    pub fn idle(&self) -> bool {
        self.idle
    }

    pub fn powered(&self) -> bool {
        self.powered
    }

    pub fn pixels_written(&self) -> u64 {
        self.pixels_written
    }

    pub fn stray_pixels(&self) -> u64 {
        self.stray_pixels
    }
}

pub type SharedPanel = Arc<Mutex<PanelState>>;

pub fn shared_panel() -> SharedPanel {
    Arc::new(Mutex::new(PanelState::default()))
}

pub fn lock(panel: &SharedPanel) -> MutexGuard<'_, PanelState> {
    panel.lock().unwrap_or_else(|e| e.into_inner())
}

/// Register-level side of the panel.
pub struct PanelController {
    panel: SharedPanel,
}

impl PanelController {
    pub fn new(panel: SharedPanel) -> Self {
        Self { panel }
    }
}

impl DisplayController for PanelController {
    fn init(&mut self) {
        let mut panel = lock(&self.panel);
        *panel = PanelState::default();
        panel.powered = true;
    }

    fn set_window(&mut self, window: Window) {
        let mut panel = lock(&self.panel);
        panel.window = window;
        panel.row = window.first_row;
        panel.col = window.first_col;
    }

    fn set_target_row(&mut self, row: u16) {
        let mut panel = lock(&self.panel);
        panel.row = row;
        panel.col = panel.window.first_col;
    }

    fn begin_pixel_transfer(&mut self) {
        lock(&self.panel).streaming = true;
    }

    fn end_pixel_transfer(&mut self) {
        lock(&self.panel).streaming = false;
    }

    fn write_pixels(&mut self, pixels: &[u16]) {
        lock(&self.panel).write(pixels);
    }

    fn set_color_depth_mode(&mut self, idle: bool) {
        lock(&self.panel).idle = idle;
    }
}

enum DmaRequest {
    Attach(CompletionHandler),
    Transfer(Vec<u16>),
}

/// Bulk-transfer engine running on its own thread.
///
/// Each transfer takes as long as clocking its pixels out at `bus_clock_hz`
/// would (instantaneous when 0), then the completion handler runs on the
/// engine thread.
pub struct DmaEngine {
    requests: Option<cb::Sender<DmaRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl DmaEngine {
    pub fn spawn(panel: SharedPanel, bus_clock_hz: u32) -> io::Result<Self> {
        let (tx, rx) = cb::unbounded();
        let worker = thread::Builder::new()
            .name("dma".into())
            .spawn(move || dma_thread_main(rx, panel, bus_clock_hz))?;
        Ok(Self {
            requests: Some(tx),
            worker: Some(worker),
        })
    }

    fn send(&self, request: DmaRequest) {
        if let Some(tx) = self.requests.as_ref() {
            // The worker only exits once this sender is gone.
            let _ = tx.send(request);
        }
    }
}

fn transfer_time(pixels: usize, bus_clock_hz: u32) -> Option<Duration> {
    if bus_clock_hz == 0 {
        return None;
    }
    let nanos = pixels as u64 * BITS_PER_PIXEL * 1_000_000_000 / bus_clock_hz as u64;
    Some(Duration::from_nanos(nanos))
}

fn dma_thread_main(rx: cb::Receiver<DmaRequest>, panel: SharedPanel, bus_clock_hz: u32) {
    let mut on_complete: Option<CompletionHandler> = None;
    let mut transfers = 0u64;
    for request in rx {
        match request {
            DmaRequest::Attach(handler) => on_complete = Some(handler),
            DmaRequest::Transfer(pixels) => {
                if let Some(time) = transfer_time(pixels.len(), bus_clock_hz) {
                    thread::sleep(time);
                }
                lock(&panel).write(&pixels);
                transfers += 1;
                trace!("dma: {} pixels done", pixels.len());
                if let Some(handler) = on_complete.as_mut() {
                    handler();
                }
            }
        }
    }
    debug!("dma: engine stopped after {transfers} transfers");
}

impl TransferEngine for DmaEngine {
    fn attach(&mut self, on_complete: CompletionHandler) {
        self.send(DmaRequest::Attach(on_complete));
    }

    fn start(&mut self, pixels: &[u16]) {
        self.send(DmaRequest::Transfer(pixels.to_vec()));
    }
}

impl Drop for DmaEngine {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> (PanelController, SharedPanel) {
        let panel = shared_panel();
        let mut controller = PanelController::new(Arc::clone(&panel));
        controller.init();
        (controller, panel)
    }

    #[test]
    fn pixels_wrap_inside_the_window() {
        let (mut c, panel) = controller();
        c.set_window(Window {
            first_row: 2,
            last_row: 3,
            first_col: 5,
            last_col: 6,
        });
        c.begin_pixel_transfer();
        c.write_pixels(&[1, 2, 3, 4, 5]);
        c.end_pixel_transfer();

        let p = lock(&panel);
        assert_eq!(p.pixel(2, 5), 5);
        assert_eq!(p.pixel(2, 6), 2);
        assert_eq!(p.pixel(3, 5), 3);
        assert_eq!(p.pixel(3, 6), 4);
        assert_eq!(p.pixels_written(), 5);
    }

    #[test]
    fn target_row_restarts_at_window_column() {
        let (mut c, panel) = controller();
        c.set_window(Window {
            first_row: 0,
            last_row: 175,
            first_col: 31,
            last_col: 190,
        });
        c.set_target_row(40);
        c.begin_pixel_transfer();
        c.write_pixels(&[0xABCD]);
        c.end_pixel_transfer();
        assert_eq!(lock(&panel).pixel(40, 31), 0xABCD);
    }

    #[test]
    fn writes_outside_a_stream_are_dropped() {
        let (mut c, panel) = controller();
        c.write_pixels(&[7, 7]);
        let p = lock(&panel);
        assert_eq!(p.stray_pixels(), 2);
        assert_eq!(p.pixel(0, 0), 0);
    }

    #[test]
    fn idle_mode_reduces_to_eight_colors() {
        assert_eq!(idle_color(0xFFFF), 0xFFFF);
        assert_eq!(idle_color(0x7BEF), 0);
        assert_eq!(idle_color(0x8000), 0xF800);

        let (mut c, panel) = controller();
        c.begin_pixel_transfer();
        c.write_pixels(&[0x9CD3]);
        c.set_color_depth_mode(true);
        let p = lock(&panel);
        assert_eq!(p.pixel(0, 0), 0x9CD3);
        assert_eq!(p.visible(0, 0), idle_color(0x9CD3));
    }

    #[test]
    fn dma_engine_writes_then_signals_completion() {
        let (mut c, panel) = controller();
        c.begin_pixel_transfer();

        let mut engine = DmaEngine::spawn(Arc::clone(&panel), 0).unwrap();
        let (done_tx, done_rx) = cb::bounded(1);
        engine.attach(Box::new(move || {
            let _ = done_tx.send(());
        }));
        engine.start(&[1, 2, 3]);
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        assert_eq!(lock(&panel).pixel(0, 2), 3);
        drop(engine);
    }

    #[test]
    fn transfer_time_follows_bus_clock() {
        assert_eq!(transfer_time(160, 0), None);
        assert_eq!(
            transfer_time(160, 32_000_000),
            Some(Duration::from_micros(80))
        );
    }
}
