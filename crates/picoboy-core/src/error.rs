use thiserror::Error;

/// Reasons a command word read from the channel cannot be executed.
///
/// The display core never surfaces these; a word that fails to decode is
/// executed as a NOP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command kind {0:#04x}")]
    UnknownKind(u8),
    #[error("scanline {0} is outside the picture")]
    RowOutOfRange(u8),
}
