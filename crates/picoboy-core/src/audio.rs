use crate::hardware::AUDIO_BUFFER_LEN;

/// Quietest attenuation step the transport supports.
pub const MAX_ATTENUATION: u8 = 16;

/// Output volume expressed as a right-shift applied to every sample:
/// 0 is full scale, [`MAX_ATTENUATION`] is silence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Volume(u8);

impl Default for Volume {
    fn default() -> Self {
        Volume(2)
    }
}

impl Volume {
    pub fn new(attenuation: u8) -> Self {
        Volume(attenuation.min(MAX_ATTENUATION))
    }

    pub const fn attenuation(self) -> u8 {
        self.0
    }

    pub fn louder(self) -> Self {
        Volume(self.0.saturating_sub(1))
    }

    pub fn quieter(self) -> Self {
        Volume::new(self.0 + 1)
    }

    #[inline]
    pub fn apply(self, sample: i16) -> i16 {
        if self.0 >= MAX_ATTENUATION {
            0
        } else {
            sample >> self.0
        }
    }
}

/// The emulator's audio synthesis call.
pub trait AudioSource {
    /// Fills `out` with interleaved stereo samples (left first).
    fn synthesize(&mut self, out: &mut [i16]);
}

/// Audio transport (I2S or a host output device).
pub trait AudioSink {
    /// Queues one frame of interleaved stereo samples for playback,
    /// replacing anything still queued.
    fn submit(&mut self, samples: &[i16]);

    fn set_volume(&mut self, volume: Volume);
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn submit(&mut self, samples: &[i16]) {
        (**self).submit(samples);
    }

    fn set_volume(&mut self, volume: Volume) {
        (**self).set_volume(volume);
    }
}

/// Pulls one video frame of audio from the emulator and submits it.
///
/// Runs on the emulation core; the next frame is only synthesized after the
/// previous submission has returned, so one buffer suffices.
pub struct AudioStreamer<S: AudioSink> {
    buffer: Box<[i16]>,
    sink: S,
    volume: Volume,
    frames: u64,
}

impl<S: AudioSink> AudioStreamer<S> {
    pub fn new(mut sink: S, volume: Volume) -> Self {
        sink.set_volume(volume);
        Self {
            buffer: vec![0; AUDIO_BUFFER_LEN].into_boxed_slice(),
            sink,
            volume,
            frames: 0,
        }
    }

    /// Synthesizes and submits one frame of audio.
    pub fn on_frame<A: AudioSource + ?Sized>(&mut self, source: &mut A) {
        source.synthesize(&mut self.buffer);
        self.sink.submit(&self.buffer);
        self.frames += 1;
    }

    pub fn volume_up(&mut self) {
        self.set_volume(self.volume.louder());
    }

    pub fn volume_down(&mut self) {
        self.set_volume(self.volume.quieter());
    }

    pub fn set_volume(&mut self, volume: Volume) {
        self.volume = volume;
        self.sink.set_volume(volume);
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_saturates_at_both_ends() {
        assert_eq!(Volume::new(0).louder().attenuation(), 0);
        assert_eq!(Volume::new(40).attenuation(), MAX_ATTENUATION);
        assert_eq!(Volume::new(MAX_ATTENUATION).quieter().attenuation(), MAX_ATTENUATION);
    }

    #[test]
    fn volume_scales_by_shift() {
        assert_eq!(Volume::new(0).apply(-1000), -1000);
        assert_eq!(Volume::new(2).apply(1000), 250);
        assert_eq!(Volume::new(MAX_ATTENUATION).apply(i16::MAX), 0);
    }
}
