//! Runs both cores as OS threads against the simulated panel and reports how
//! fast frames went through.

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};
use picoboy_core::audio::{AudioSink, AudioStreamer, Volume};
use picoboy_core::display::TransferEngine;
use picoboy_core::drive::DriveStats;
use picoboy_core::pipeline;
use picoboy_core::producer::ProducerStats;
use thiserror::Error;

use crate::config::HostConfig;
use crate::panel::{DmaEngine, PanelController, SharedPanel};
use crate::pattern::FrameSource;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to start thread: {0}")]
    Spawn(#[from] std::io::Error),
    /// Only seen when the display core dies with no line outstanding and
    /// room left in the command FIFO. Otherwise the emulation side spins on
    /// the busy flag or the full FIFO forever and `run` never returns.
    #[error("display core panicked")]
    DisplayCorePanicked,
}

#[derive(Clone, Copy, Debug)]
pub struct RunReport {
    pub frames: u64,
    pub elapsed: Duration,
    pub producer: ProducerStats,
    pub drive: DriveStats,
    pub audio_frames: u64,
}

impl RunReport {
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }

    pub fn log(&self) {
        info!(
            "{} frames in {} us ({:.2} fps), {} audio buffers",
            self.frames,
            self.elapsed.as_micros(),
            self.fps(),
            self.audio_frames
        );
        info!(
            "lines: {} forwarded, {} suppressed, {} busy waits; {} drawn, {} ignored, {} overlapped",
            self.producer.forwarded,
            self.producer.suppressed,
            self.producer.busy_waits,
            self.drive.lines_drawn,
            self.drive.ignored,
            self.drive.overlapped
        );
        if self.drive.idle_mode_changes > 0 {
            info!("idle mode changed {} times", self.drive.idle_mode_changes);
        }
    }
}

/// Emulates `config.frames` frames of `source`, pushing video through the
/// display pipeline into `panel` and audio into `sink`.
///
/// Returns once the display core has drained every queued command.
pub fn run<S, A>(
    config: &HostConfig,
    source: &mut S,
    sink: A,
    panel: SharedPanel,
) -> Result<RunReport, RunError>
where
    S: FrameSource,
    A: AudioSink,
{
    let engine: Option<Box<dyn TransferEngine>> = if config.async_transfer {
        Some(Box::new(DmaEngine::spawn(panel.clone(), config.bus_clock_hz)?))
    } else {
        None
    };
    let (mut producer, mut drive) =
        pipeline::build(&config.pipeline(), PanelController::new(panel), engine);

    let display = thread::Builder::new()
        .name("display-core".into())
        .spawn(move || {
            drive.init();
            drive.run();
            drive.stats()
        })?;

    let mut audio = AudioStreamer::new(sink, Volume::new(config.volume));
    let start = Instant::now();
    for frame in 0..config.frames {
        if config.idle_mode_frame == Some(frame) {
            debug!("frame {frame}: entering idle mode");
            producer.set_idle_mode(true);
        }
        source.run_frame(&mut producer);
        audio.on_frame(source);
    }
    let producer_stats = producer.stats();
    drop(producer);

    let drive_stats = display
        .join()
        .map_err(|_| RunError::DisplayCorePanicked)?;
    Ok(RunReport {
        frames: config.frames,
        elapsed: start.elapsed(),
        producer: producer_stats,
        drive: drive_stats,
        audio_frames: audio.frames(),
    })
}
