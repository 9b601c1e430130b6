use picoboy_core::audio::{AudioSink, Volume};

/// Headless transport: discards every buffer.
#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn submit(&mut self, _samples: &[i16]) {}

    fn set_volume(&mut self, _volume: Volume) {}
}

#[cfg(feature = "audio")]
pub use device::CpalSink;

#[cfg(feature = "audio")]
mod device {
    use std::sync::{Arc, Mutex, MutexGuard};

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use log::{info, warn};
    use picoboy_core::audio::{AudioSink, Volume};
    use picoboy_core::hardware::AUDIO_SAMPLE_RATE;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum AudioError {
        #[error("no default output device")]
        NoDevice,
        #[error("no supported output config: {0}")]
        Config(#[from] cpal::DefaultStreamConfigError),
        #[error("failed to build output stream: {0}")]
        Build(#[from] cpal::BuildStreamError),
        #[error("failed to start output stream: {0}")]
        Play(#[from] cpal::PlayStreamError),
        #[error("unsupported sample format {0:?}")]
        Format(cpal::SampleFormat),
    }

    /// The frame most recently submitted, replayed at the device rate.
    struct Playback {
        samples: Vec<i16>,
        pos: f64,
        step: f64,
        volume: Volume,
    }

    impl Playback {
        fn next_frame(&mut self) -> (i16, i16) {
            let i = self.pos as usize * 2;
            if i + 1 >= self.samples.len() {
                return (0, 0);
            }
            self.pos += self.step;
            (
                self.volume.apply(self.samples[i]),
                self.volume.apply(self.samples[i + 1]),
            )
        }
    }

    fn lock(playback: &Mutex<Playback>) -> MutexGuard<'_, Playback> {
        playback.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn fill<T: Copy>(
        data: &mut [T],
        channels: usize,
        playback: &Mutex<Playback>,
        convert: impl Fn(i16) -> T,
    ) {
        let mut playback = lock(playback);
        for frame in data.chunks_mut(channels) {
            let (left, right) = playback.next_frame();
            frame[0] = convert(left);
            if channels > 1 {
                frame[1] = convert(right);
            }
        }
    }

    /// Plays submitted frames on the default output device.
    pub struct CpalSink {
        playback: Arc<Mutex<Playback>>,
        _stream: cpal::Stream,
    }

    impl CpalSink {
        pub fn open() -> Result<Self, AudioError> {
            let host = cpal::default_host();
            let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
            let supported = device.default_output_config()?;
            let sample_format = supported.sample_format();
            let config: cpal::StreamConfig = supported.into();
            let channels = config.channels as usize;
            let device_rate = config.sample_rate.0;
            info!("audio: {device_rate} Hz, {channels} channels, {sample_format:?}");

            let playback = Arc::new(Mutex::new(Playback {
                samples: Vec::new(),
                pos: 0.0,
                step: AUDIO_SAMPLE_RATE as f64 / device_rate as f64,
                volume: Volume::default(),
            }));
            let shared = Arc::clone(&playback);
            let err_fn = |err| warn!("cpal stream error: {err}");

            let stream = match sample_format {
                cpal::SampleFormat::I16 => device.build_output_stream(
                    &config,
                    move |data: &mut [i16], _| fill(data, channels, &shared, |s| s),
                    err_fn,
                    None,
                )?,
                cpal::SampleFormat::U16 => device.build_output_stream(
                    &config,
                    move |data: &mut [u16], _| {
                        fill(data, channels, &shared, |s| (s as i32 + 32768) as u16)
                    },
                    err_fn,
                    None,
                )?,
                cpal::SampleFormat::F32 => device.build_output_stream(
                    &config,
                    move |data: &mut [f32], _| {
                        fill(data, channels, &shared, |s| s as f32 / 32768.0)
                    },
                    err_fn,
                    None,
                )?,
                other => return Err(AudioError::Format(other)),
            };
            stream.play()?;

            Ok(Self {
                playback,
                _stream: stream,
            })
        }
    }

    impl AudioSink for CpalSink {
        fn submit(&mut self, samples: &[i16]) {
            let mut playback = lock(&self.playback);
            playback.samples.clear();
            playback.samples.extend_from_slice(samples);
            playback.pos = 0.0;
        }

        fn set_volume(&mut self, volume: Volume) {
            lock(&self.playback).volume = volume;
        }
    }
}
