//! Synthetic stand-in for the emulator: a striped background with a sprite
//! bouncing across it, and a square-wave tone.

use picoboy_core::audio::AudioSource;
use picoboy_core::hardware::{AUDIO_SAMPLE_RATE, LCD_HEIGHT, LCD_WIDTH};
use picoboy_core::producer::ScanlineSink;

const BG_ROW: u8 = 0x20;
const OBJ0_ROW: u8 = 0x00;
const STRIPE_WIDTH: usize = 20;
const SPRITE_SIZE: usize = 16;
const TONE_HZ: u32 = 440;
const TONE_AMPLITUDE: i16 = 4_000;

/// Something that renders one video frame of scanlines and its audio.
pub trait FrameSource: AudioSource {
    fn run_frame(&mut self, lcd: &mut dyn ScanlineSink);
}

#[derive(Default)]
pub struct TestPattern {
    frame: u64,
    phase: u32,
}

impl TestPattern {
    pub fn new() -> Self {
        Self::default()
    }

    fn sprite_origin(&self) -> (usize, usize) {
        let travel_y = (LCD_HEIGHT - SPRITE_SIZE) as u64;
        let travel_x = (LCD_WIDTH - SPRITE_SIZE) as u64;
        (
            bounce(self.frame, travel_y),
            bounce(self.frame * 2, travel_x),
        )
    }

    /// Raw pixels of `row` for the current frame.
    pub fn render_line(&self, row: usize, out: &mut [u8; LCD_WIDTH]) {
        for (x, px) in out.iter_mut().enumerate() {
            *px = BG_ROW | ((x / STRIPE_WIDTH) as u8 & 0x03);
        }
        let (sy, sx) = self.sprite_origin();
        if (sy..sy + SPRITE_SIZE).contains(&row) {
            out[sx..sx + SPRITE_SIZE].fill(OBJ0_ROW | 0x03);
        }
    }
}

fn bounce(step: u64, travel: u64) -> usize {
    let period = travel * 2;
    let pos = step % period;
    (if pos <= travel { pos } else { period - pos }) as usize
}

impl FrameSource for TestPattern {
    fn run_frame(&mut self, lcd: &mut dyn ScanlineSink) {
        let mut line = [0u8; LCD_WIDTH];
        for row in 0..LCD_HEIGHT {
            self.render_line(row, &mut line);
            lcd.draw_line(row as u8, &line);
        }
        self.frame += 1;
    }
}

impl AudioSource for TestPattern {
    fn synthesize(&mut self, out: &mut [i16]) {
        let half_period = AUDIO_SAMPLE_RATE / (TONE_HZ * 2);
        for frame in out.chunks_exact_mut(2) {
            let sample = if (self.phase / half_period) % 2 == 0 {
                TONE_AMPLITUDE
            } else {
                -TONE_AMPLITUDE
            };
            frame[0] = sample;
            frame[1] = sample;
            self.phase = (self.phase + 1) % (half_period * 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picoboy_core::hardware::AUDIO_BUFFER_LEN;

    #[derive(Default)]
    struct Frame(Vec<[u8; LCD_WIDTH]>);

    impl ScanlineSink for Frame {
        fn draw_line(&mut self, _row: u8, pixels: &[u8; LCD_WIDTH]) {
            self.0.push(*pixels);
        }
    }

    fn render(pattern: &mut TestPattern) -> Vec<[u8; LCD_WIDTH]> {
        let mut frame = Frame::default();
        pattern.run_frame(&mut frame);
        frame.0
    }

    #[test]
    fn consecutive_frames_differ_only_around_the_sprite() {
        let mut pattern = TestPattern::new();
        let a = render(&mut pattern);
        let b = render(&mut pattern);

        assert_eq!(a.len(), LCD_HEIGHT);
        let changed = a.iter().zip(&b).filter(|(x, y)| x != y).count();
        // The sprite's rows plus the one it entered.
        assert_eq!(changed, SPRITE_SIZE + 1);
    }

    #[test]
    fn sprite_bounces_inside_the_screen() {
        assert_eq!(bounce(0, 128), 0);
        assert_eq!(bounce(128, 128), 128);
        assert_eq!(bounce(130, 128), 126);
        assert_eq!(bounce(256, 128), 0);
    }

    #[test]
    fn tone_is_a_stereo_square_wave() {
        let mut pattern = TestPattern::new();
        let mut buf = vec![0i16; AUDIO_BUFFER_LEN];
        pattern.synthesize(&mut buf);

        assert!(buf.chunks_exact(2).all(|f| f[0] == f[1]));
        assert!(buf.iter().all(|&s| s.abs() == TONE_AMPLITUDE));
        assert!(buf.contains(&-TONE_AMPLITUDE));
    }
}
