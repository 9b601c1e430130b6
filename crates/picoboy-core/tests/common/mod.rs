#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel as cb;
use picoboy_core::display::{CompletionHandler, DisplayController, TransferEngine};
use picoboy_core::hardware::{LCD_WIDTH, Window};

pub const WAIT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Init,
    Window(Window),
    TargetRow(u16),
    Begin,
    End,
    Pixels(Vec<u16>),
    IdleMode(bool),
}

/// Controller that records every call in order.
#[derive(Default)]
pub struct RecordingController {
    pub ops: Vec<Op>,
}

impl DisplayController for RecordingController {
    fn init(&mut self) {
        self.ops.push(Op::Init);
    }

    fn set_window(&mut self, window: Window) {
        self.ops.push(Op::Window(window));
    }

    fn set_target_row(&mut self, row: u16) {
        self.ops.push(Op::TargetRow(row));
    }

    fn begin_pixel_transfer(&mut self) {
        self.ops.push(Op::Begin);
    }

    fn end_pixel_transfer(&mut self) {
        self.ops.push(Op::End);
    }

    fn write_pixels(&mut self, pixels: &[u16]) {
        self.ops.push(Op::Pixels(pixels.to_vec()));
    }

    fn set_color_depth_mode(&mut self, idle: bool) {
        self.ops.push(Op::IdleMode(idle));
    }
}

/// Operations issued after the panel clear, i.e. after the second window
/// change and the cursor reset that follows it.
pub fn ops_after_init(ops: &[Op]) -> &[Op] {
    let last_window = ops
        .iter()
        .rposition(|op| matches!(op, Op::Window(_)))
        .expect("init sets a window");
    &ops[last_window + 2..]
}

/// Game Boy rows drawn after init, in order.
pub fn drawn_rows(ops: &[Op], row_offset: u16) -> Vec<u16> {
    ops_after_init(ops)
        .iter()
        .filter_map(|op| match op {
            Op::TargetRow(r) => Some(r - row_offset),
            _ => None,
        })
        .collect()
}

/// Transfer engine whose completions are fired by the test.
pub struct ManualEngine {
    handler: Arc<Mutex<Option<CompletionHandler>>>,
    started_tx: cb::Sender<Vec<u16>>,
}

/// Test-side handle of a [`ManualEngine`].
#[derive(Clone)]
pub struct ManualEngineHandle {
    handler: Arc<Mutex<Option<CompletionHandler>>>,
    started_rx: cb::Receiver<Vec<u16>>,
}

pub fn manual_engine() -> (ManualEngine, ManualEngineHandle) {
    let handler = Arc::new(Mutex::new(None));
    let (started_tx, started_rx) = cb::unbounded();
    (
        ManualEngine {
            handler: Arc::clone(&handler),
            started_tx,
        },
        ManualEngineHandle {
            handler,
            started_rx,
        },
    )
}

impl TransferEngine for ManualEngine {
    fn attach(&mut self, on_complete: CompletionHandler) {
        *self.handler.lock().unwrap() = Some(on_complete);
    }

    fn start(&mut self, pixels: &[u16]) {
        self.started_tx.send(pixels.to_vec()).unwrap();
    }
}

impl ManualEngineHandle {
    /// Waits for the next transfer to start and returns its pixels.
    pub fn next_transfer(&self) -> Vec<u16> {
        self.started_rx
            .recv_timeout(WAIT)
            .expect("transfer did not start")
    }

    /// Returns a started transfer if one arrives within `timeout`.
    pub fn transfer_within(&self, timeout: Duration) -> Option<Vec<u16>> {
        self.started_rx.recv_timeout(timeout).ok()
    }

    /// Signals completion of the outstanding transfer.
    pub fn complete(&self) {
        let mut handler = self.handler.lock().unwrap();
        let on_complete = handler.as_mut().expect("engine attached");
        on_complete();
    }
}

/// Transfer engine that completes inside `start`.
pub struct InstantEngine {
    handler: Option<CompletionHandler>,
    pub lines: Arc<Mutex<Vec<Vec<u16>>>>,
}

impl InstantEngine {
    pub fn new() -> Self {
        Self {
            handler: None,
            lines: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl TransferEngine for InstantEngine {
    fn attach(&mut self, on_complete: CompletionHandler) {
        self.handler = Some(on_complete);
    }

    fn start(&mut self, pixels: &[u16]) {
        self.lines.lock().unwrap().push(pixels.to_vec());
        if let Some(handler) = self.handler.as_mut() {
            handler();
        }
    }
}

pub fn solid_line(byte: u8) -> [u8; LCD_WIDTH] {
    [byte; LCD_WIDTH]
}

/// A line that differs from every other `row` and `seed` combination.
pub fn patterned_line(row: u8, seed: u8) -> [u8; LCD_WIDTH] {
    let mut line = [0u8; LCD_WIDTH];
    for (x, px) in line.iter_mut().enumerate() {
        *px = ((x as u8).wrapping_add(row).wrapping_mul(3) ^ seed) & 0x33;
    }
    line[0] = row;
    line[1] = seed;
    line
}
