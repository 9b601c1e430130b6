use crate::hardware::LCD_WIDTH;

/// Bits of a raw pixel byte selecting one of the four shades.
pub const COLOR_INDEX_MASK: u8 = 0x03;
/// Bits of a raw pixel byte selecting the palette row.
pub const PALETTE_SELECT_MASK: u8 = 0x30;
const PALETTE_SELECT_SHIFT: u32 = 4;

/// Default DMG palette colors in 0x00RRGGBB order, lightest first.
pub const DMG_GREEN: [u32; 4] = [0x009BBC0F, 0x008BAC0F, 0x00306230, 0x000F380F];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Palette row a raw pixel was drawn with.
pub enum PaletteRow {
    Obj0 = 0,
    Obj1 = 1,
    Bg = 2,
}

impl PaletteRow {
    #[inline]
    /// Row selected by a raw pixel byte. The unused selector value 3 maps to
    /// the background row.
    pub const fn of_pixel(raw: u8) -> Self {
        match (raw & PALETTE_SELECT_MASK) >> PALETTE_SELECT_SHIFT {
            0 => PaletteRow::Obj0,
            1 => PaletteRow::Obj1,
            _ => PaletteRow::Bg,
        }
    }
}

#[inline]
/// Packs 8-bit channels into RGB565.
pub const fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

#[inline]
/// Converts a 0x00RRGGBB color to RGB565.
pub const fn rgb888_to_565(rgb: u32) -> u16 {
    rgb565((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

#[inline]
/// Expands RGB565 to 8-bit channels, replicating high bits into the low ones.
pub const fn rgb565_to_rgb888(px: u16) -> [u8; 3] {
    let r = ((px >> 11) & 0x1F) as u8;
    let g = ((px >> 5) & 0x3F) as u8;
    let b = (px & 0x1F) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

/// Two-level color lookup: palette row x shade -> RGB565 wire value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    rows: [[u16; 4]; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_rgb888([DMG_GREEN; 3])
    }
}

impl Palette {
    pub const fn new(rows: [[u16; 4]; 3]) -> Self {
        Self { rows }
    }

    /// Builds a palette from 0x00RRGGBB colors ordered OBJ0, OBJ1, BG.
    pub fn from_rgb888(rows: [[u32; 4]; 3]) -> Self {
        Self {
            rows: rows.map(|row| row.map(rgb888_to_565)),
        }
    }

    pub fn color(&self, row: PaletteRow, index: u8) -> u16 {
        self.rows[row as usize][(index & COLOR_INDEX_MASK) as usize]
    }

    #[inline]
    /// Wire value for one raw pixel byte.
    pub fn lookup(&self, raw: u8) -> u16 {
        self.color(PaletteRow::of_pixel(raw), raw)
    }

    /// Color the panel is cleared to before the first frame: the darkest
    /// background shade.
    pub fn clear_color(&self) -> u16 {
        self.color(PaletteRow::Bg, 3)
    }

    /// Translates a raw scanline into wire-format pixels.
    pub fn translate_line(&self, raw: &[u8; LCD_WIDTH], out: &mut [u16; LCD_WIDTH]) {
        for (px, &byte) in out.iter_mut().zip(raw) {
            *px = self.lookup(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distinct() -> Palette {
        let mut rows = [[0u16; 4]; 3];
        for (r, row) in rows.iter_mut().enumerate() {
            for (i, c) in row.iter_mut().enumerate() {
                *c = (r * 4 + i) as u16;
            }
        }
        Palette::new(rows)
    }

    #[test]
    fn lookup_uses_selector_and_index() {
        let pal = distinct();
        assert_eq!(pal.lookup(0x00), 0);
        assert_eq!(pal.lookup(0x13), 7);
        assert_eq!(pal.lookup(0x21), 9);
    }

    #[test]
    fn unused_selector_falls_back_to_background() {
        let pal = distinct();
        assert_eq!(pal.lookup(0x32), pal.lookup(0x22));
    }

    #[test]
    fn stray_high_bits_are_ignored() {
        let pal = distinct();
        assert_eq!(pal.lookup(0xC6), pal.lookup(0x02));
    }

    #[test]
    fn rgb565_round_trip_keeps_extremes() {
        assert_eq!(rgb888_to_565(0x00FFFFFF), 0xFFFF);
        assert_eq!(rgb565_to_rgb888(0xFFFF), [0xFF, 0xFF, 0xFF]);
        assert_eq!(rgb565_to_rgb888(0), [0, 0, 0]);
    }

    #[test]
    fn clear_color_is_darkest_background_shade() {
        let pal = Palette::default();
        assert_eq!(pal.clear_color(), rgb888_to_565(DMG_GREEN[3]));
    }
}
