use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};

use crate::busy::BusyFlag;
use crate::channel::CommandReceiver;
use crate::command::Command;
use crate::display::{DisplayController, TransferEngine};
use crate::hardware::{Geometry, LCD_WIDTH, Window};
use crate::line_buffer::PixelLineBuffer;
use crate::palette::Palette;

#[cfg(feature = "drive-trace")]
macro_rules! drive_trace {
    ($($arg:tt)*) => {
        log::trace!($($arg)*);
    };
}
#[cfg(not(feature = "drive-trace"))]
macro_rules! drive_trace {
    ($($arg:tt)*) => {};
}

// What the transfer engine is currently streaming.
const IN_FLIGHT_NONE: u8 = 0;
const IN_FLIGHT_LINE: u8 = 1;
const IN_FLIGHT_CLEAR: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriveState {
    Idle,
    Transferring,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriveStats {
    pub lines_drawn: u64,
    pub idle_mode_changes: u64,
    /// NOPs, debug kinds and words that failed to decode.
    pub ignored: u64,
    /// `DrawLine` commands that arrived while a line was still in flight.
    pub overlapped: u64,
}

fn lock<C>(controller: &Mutex<C>) -> MutexGuard<'_, C> {
    controller.lock().unwrap_or_else(|e| e.into_inner())
}

/// Display-core side of the pipeline.
///
/// Pops command words, translates the shared pixel line through the palette
/// and streams it to the controller. With a [`TransferEngine`] each line is
/// sent asynchronously and the engine's completion handler closes the pixel
/// stream and clears the busy flag; without one every line is written inline.
pub struct DisplayDriveLoop<C: DisplayController> {
    controller: Arc<Mutex<C>>,
    engine: Option<Box<dyn TransferEngine>>,
    commands: CommandReceiver,
    busy: BusyFlag,
    line: Arc<PixelLineBuffer>,
    palette: Palette,
    geometry: Geometry,
    in_flight: Arc<AtomicU8>,
    fb: [u16; LCD_WIDTH],
    idle_mode: bool,
    stats: DriveStats,
}

impl<C: DisplayController + 'static> DisplayDriveLoop<C> {
    pub fn new(
        controller: C,
        mut engine: Option<Box<dyn TransferEngine>>,
        commands: CommandReceiver,
        busy: BusyFlag,
        line: Arc<PixelLineBuffer>,
        palette: Palette,
        geometry: Geometry,
    ) -> Self {
        let controller = Arc::new(Mutex::new(controller));
        let in_flight = Arc::new(AtomicU8::new(IN_FLIGHT_NONE));

        if let Some(engine) = engine.as_mut() {
            let controller = Arc::clone(&controller);
            let in_flight = Arc::clone(&in_flight);
            let busy = busy.clone();
            engine.attach(Box::new(move || {
                let finished = in_flight.load(Ordering::Acquire);
                lock(&controller).end_pixel_transfer();
                in_flight.store(IN_FLIGHT_NONE, Ordering::Release);
                // The panel clear is not owed to the producer, which may
                // already hold the flag for its first line.
                if finished == IN_FLIGHT_LINE {
                    busy.clear();
                }
            }));
        }

        Self {
            controller,
            engine,
            commands,
            busy,
            line,
            palette,
            geometry,
            in_flight,
            fb: [0; LCD_WIDTH],
            idle_mode: false,
            stats: DriveStats::default(),
        }
    }
}

impl<C: DisplayController> DisplayDriveLoop<C> {
    /// Brings the controller up, clears the whole panel to the palette's
    /// clear color and narrows the output window to the Game Boy picture.
    pub fn init(&mut self) {
        let full = Window::full_panel();
        {
            let mut controller = lock(&self.controller);
            controller.init();
            controller.set_window(full);
            controller.set_target_row(full.first_row);
            controller.begin_pixel_transfer();
        }

        let clear = vec![self.palette.clear_color(); full.area()];
        self.send_pixels(&clear, IN_FLIGHT_CLEAR);
        self.wait_transfer();

        let window = self.geometry.lcd_window();
        {
            let mut controller = lock(&self.controller);
            controller.set_window(window);
            controller.set_target_row(window.first_row);
        }
        debug!(
            "display core ready: {} transfer, window rows {}..={} cols {}..={}",
            if self.engine.is_some() { "async" } else { "inline" },
            window.first_row,
            window.last_row,
            window.first_col,
            window.last_col
        );
    }

    /// Runs until the producer goes away and the queue is drained.
    pub fn run(&mut self) {
        while self.step() {}
        self.wait_transfer();
        debug!("display core stopping: {:?}", self.stats);
    }

    /// Blocks for the next command and executes it. Returns `false` once the
    /// producer has gone away and nothing is left to execute.
    pub fn step(&mut self) -> bool {
        match self.commands.pop() {
            Some(word) => {
                self.handle(word);
                true
            }
            None => false,
        }
    }

    /// Executes one command word.
    pub fn handle(&mut self, word: u32) {
        match Command::from_word(word) {
            Ok(Command::DrawLine(row)) => self.draw_line(row),
            Ok(Command::SetIdleMode(idle)) => self.set_idle_mode(idle),
            Ok(Command::Nop | Command::SetPixel(_)) => {
                drive_trace!("ignoring {word:#010x}");
                self.stats.ignored += 1;
            }
            Err(e) => {
                warn!("display core: {e}; word {word:#010x} ignored");
                self.stats.ignored += 1;
            }
        }
    }

    fn draw_line(&mut self, row: u8) {
        if self.wait_transfer() {
            self.stats.overlapped += 1;
        }

        let raw = self.line.snapshot();
        self.palette.translate_line(&raw, &mut self.fb);

        {
            let mut controller = lock(&self.controller);
            controller.set_target_row(self.geometry.panel_row(row));
            controller.begin_pixel_transfer();
        }

        drive_trace!("line {row}");
        let fb = self.fb;
        self.send_pixels(&fb, IN_FLIGHT_LINE);
        self.stats.lines_drawn += 1;
    }

    // Streams pixels into the stream the caller has opened.
    fn send_pixels(&mut self, pixels: &[u16], kind: u8) {
        match self.engine.as_mut() {
            Some(engine) => {
                self.in_flight.store(kind, Ordering::Release);
                engine.start(pixels);
            }
            None => {
                {
                    let mut controller = lock(&self.controller);
                    controller.write_pixels(pixels);
                    controller.end_pixel_transfer();
                }
                if kind == IN_FLIGHT_LINE {
                    self.busy.clear();
                }
            }
        }
    }

    fn set_idle_mode(&mut self, idle: bool) {
        // Register writes must not land inside an open pixel stream.
        self.wait_transfer();
        drive_trace!("idle mode {idle}");
        lock(&self.controller).set_color_depth_mode(idle);
        if self.idle_mode != idle {
            self.stats.idle_mode_changes += 1;
        }
        self.idle_mode = idle;
    }

    /// Spins until no transfer is in flight. Returns `true` if it had to wait.
    pub fn wait_transfer(&self) -> bool {
        if self.in_flight.load(Ordering::Acquire) == IN_FLIGHT_NONE {
            return false;
        }
        while self.in_flight.load(Ordering::Acquire) != IN_FLIGHT_NONE {
            std::hint::spin_loop();
        }
        true
    }

    pub fn state(&self) -> DriveState {
        if self.in_flight.load(Ordering::Acquire) == IN_FLIGHT_NONE {
            DriveState::Idle
        } else {
            DriveState::Transferring
        }
    }

    pub fn idle_mode(&self) -> bool {
        self.idle_mode
    }

    pub fn stats(&self) -> DriveStats {
        self.stats
    }

    pub fn is_async(&self) -> bool {
        self.engine.is_some()
    }

    /// Shared handle to the controller, for inspection.
    pub fn controller(&self) -> Arc<Mutex<C>> {
        Arc::clone(&self.controller)
    }
}
