/// Width of the Game Boy picture in pixels.
pub const LCD_WIDTH: usize = 160;
/// Height of the Game Boy picture in scanlines.
pub const LCD_HEIGHT: usize = 144;

/// Rows addressable on the ILI9225-class panel in the orientation the
/// drive loop uses (one Game Boy scanline per panel row).
pub const PANEL_ROWS: usize = 176;
/// Columns addressable on the panel.
pub const PANEL_COLS: usize = 220;

/// Interleaved stereo sample rate of the audio transport.
pub const AUDIO_SAMPLE_RATE: u32 = 32_768;

// DMG master clock and T-cycles per video frame.
const DMG_CLOCK_FREQ: f64 = 4_194_304.0;
const SCREEN_REFRESH_CYCLES: f64 = 70_224.0;

/// Video frames per second of the emulated machine (~59.7275).
pub const VERTICAL_SYNC: f64 = DMG_CLOCK_FREQ / SCREEN_REFRESH_CYCLES;

/// Stereo frames synthesized per video frame.
pub const AUDIO_SAMPLES: usize = (AUDIO_SAMPLE_RATE as f64 / VERTICAL_SYNC) as usize;

/// Length of one interleaved audio buffer in `i16` samples.
pub const AUDIO_BUFFER_LEN: usize = AUDIO_SAMPLES * 2;

/// Depth of the RP2040 inter-core SIO FIFO.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Inclusive rectangle of panel addresses that pixel writes stream into.
///
/// Writes start at `(first_row, first_col)`, advance along the row and wrap
/// to the next row at `last_col`.
pub struct Window {
    pub first_row: u16,
    pub last_row: u16,
    pub first_col: u16,
    pub last_col: u16,
}

impl Window {
    /// The whole panel.
    pub const fn full_panel() -> Self {
        Self {
            first_row: 0,
            last_row: PANEL_ROWS as u16 - 1,
            first_col: 0,
            last_col: PANEL_COLS as u16 - 1,
        }
    }

    pub const fn width(&self) -> usize {
        (self.last_col - self.first_col) as usize + 1
    }

    pub const fn height(&self) -> usize {
        (self.last_row - self.first_row) as usize + 1
    }

    pub const fn area(&self) -> usize {
        self.width() * self.height()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Placement of the Game Boy picture on the panel.
pub struct Geometry {
    pub row_offset: u16,
    pub col_offset: u16,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            row_offset: 16,
            col_offset: 31,
        }
    }
}

impl Geometry {
    /// Output window covering exactly the Game Boy picture.
    pub const fn lcd_window(&self) -> Window {
        Window {
            first_row: self.row_offset,
            last_row: self.row_offset + LCD_HEIGHT as u16 - 1,
            first_col: self.col_offset,
            last_col: self.col_offset + LCD_WIDTH as u16 - 1,
        }
    }

    #[inline]
    /// Panel row that displays Game Boy scanline `row`.
    pub const fn panel_row(&self, row: u8) -> u16 {
        self.row_offset + row as u16
    }

    /// Returns whether the Game Boy picture fits on the panel.
    pub const fn fits_panel(&self) -> bool {
        (self.row_offset as usize + LCD_HEIGHT) <= PANEL_ROWS
            && (self.col_offset as usize + LCD_WIDTH) <= PANEL_COLS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_frame_matches_vsync_rate() {
        assert_eq!(AUDIO_SAMPLES, 548);
        assert_eq!(AUDIO_BUFFER_LEN, 1096);
    }

    #[test]
    fn default_geometry_fits_panel() {
        let geometry = Geometry::default();
        assert!(geometry.fits_panel());
        let window = geometry.lcd_window();
        assert_eq!(window.width(), LCD_WIDTH);
        assert_eq!(window.height(), LCD_HEIGHT);
        assert_eq!(geometry.panel_row(143), 159);
    }
}
