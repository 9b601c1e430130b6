use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use picoboy_core::hardware::{PANEL_COLS, PANEL_ROWS};
use thiserror::Error;

use crate::panel::PanelState;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to write snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] png::EncodingError),
}

/// Writes what the panel currently shows as an 8-bit RGB PNG.
pub fn write_png(path: &Path, panel: &PanelState) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let w = BufWriter::new(File::create(path)?);
    let mut encoder = png::Encoder::new(w, PANEL_COLS as u32, PANEL_ROWS as u32);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&panel.to_rgb())?;
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::{PanelController, lock, shared_panel};
    use picoboy_core::display::DisplayController;
    use std::io::BufReader;
    use std::sync::Arc;

    #[test]
    fn snapshot_matches_panel_contents() {
        let panel = shared_panel();
        let mut controller = PanelController::new(Arc::clone(&panel));
        controller.init();
        controller.begin_pixel_transfer();
        controller.write_pixels(&[0xF800, 0x07E0, 0x001F]);
        controller.end_pixel_transfer();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shots").join("panel.png");
        write_png(&path, &lock(&panel)).unwrap();

        let decoder = png::Decoder::new(BufReader::new(File::open(&path).unwrap()));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size().unwrap()];
        let info = reader.next_frame(&mut buf).unwrap();

        assert_eq!((info.width, info.height), (PANEL_COLS as u32, PANEL_ROWS as u32));
        assert_eq!(&buf[..9], &[255, 0, 0, 0, 255, 0, 0, 0, 255]);
        assert!(buf[9..info.buffer_size()].iter().all(|&b| b == 0));
    }
}
