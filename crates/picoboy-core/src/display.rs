use crate::hardware::Window;

/// Command-level access to the display controller.
///
/// Every call is synchronous. Pixel data goes out either through
/// [`DisplayController::write_pixels`] or through a [`TransferEngine`]
/// bracketed by `begin_pixel_transfer` / `end_pixel_transfer`.
pub trait DisplayController: Send {
    /// Resets and powers up the controller.
    fn init(&mut self);

    /// Sets the rectangle pixel writes stream into.
    fn set_window(&mut self, window: Window);

    /// Moves the write cursor to the start of panel row `row`.
    fn set_target_row(&mut self, row: u16);

    /// Opens a pixel stream at the write cursor.
    fn begin_pixel_transfer(&mut self);

    /// Closes the pixel stream opened by `begin_pixel_transfer`.
    fn end_pixel_transfer(&mut self);

    /// Writes RGB565 pixels inside an open stream, blocking until done.
    fn write_pixels(&mut self, pixels: &[u16]);

    /// Switches between full color depth (`false`) and the 8-color idle mode.
    fn set_color_depth_mode(&mut self, idle: bool);
}

/// Called once per finished transfer, from whatever context the engine
/// signals completion in.
pub type CompletionHandler = Box<dyn FnMut() + Send>;

/// Asynchronous bulk-transfer engine feeding the controller's pixel stream.
pub trait TransferEngine: Send {
    /// Installs the completion handler. Called once, before the first
    /// transfer.
    fn attach(&mut self, on_complete: CompletionHandler);

    /// Starts streaming `pixels` and returns without waiting. The handler
    /// fires exactly once when the last pixel has gone out; it may fire
    /// before `start` returns.
    fn start(&mut self, pixels: &[u16]);
}
