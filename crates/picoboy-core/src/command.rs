use crate::error::CommandError;
use crate::hardware::LCD_HEIGHT;

// Command kinds carried in byte 0 of the word.
const KIND_NOP: u8 = 0;
const KIND_DRAW_LINE: u8 = 1;
const KIND_SET_IDLE_MODE: u8 = 2;
const KIND_SET_PIXEL: u8 = 3;

const PAYLOAD_SHIFT: u32 = 24;

/// Work item handed from the emulation core to the display core.
///
/// On the wire a command is one 32-bit word: byte 0 holds the kind, byte 3
/// the payload and bytes 1-2 are zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Nop,
    /// Send the shared pixel line to scanline `row`.
    DrawLine(u8),
    /// Restrict the panel to 8 colors (`true`) or restore full depth.
    SetIdleMode(bool),
    /// Debug kind reserved by the wire format. Decoded, never acted on.
    SetPixel(u8),
}

impl Command {
    pub const fn kind(self) -> u8 {
        match self {
            Command::Nop => KIND_NOP,
            Command::DrawLine(_) => KIND_DRAW_LINE,
            Command::SetIdleMode(_) => KIND_SET_IDLE_MODE,
            Command::SetPixel(_) => KIND_SET_PIXEL,
        }
    }

    pub const fn payload(self) -> u8 {
        match self {
            Command::Nop => 0,
            Command::DrawLine(row) => row,
            Command::SetIdleMode(idle) => idle as u8,
            Command::SetPixel(data) => data,
        }
    }

    pub const fn to_word(self) -> u32 {
        self.kind() as u32 | (self.payload() as u32) << PAYLOAD_SHIFT
    }

    pub fn from_word(word: u32) -> Result<Self, CommandError> {
        let kind = (word & 0xFF) as u8;
        let payload = (word >> PAYLOAD_SHIFT) as u8;
        match kind {
            KIND_NOP => Ok(Command::Nop),
            KIND_DRAW_LINE if (payload as usize) < LCD_HEIGHT => Ok(Command::DrawLine(payload)),
            KIND_DRAW_LINE => Err(CommandError::RowOutOfRange(payload)),
            KIND_SET_IDLE_MODE => Ok(Command::SetIdleMode(payload != 0)),
            KIND_SET_PIXEL => Ok(Command::SetPixel(payload)),
            other => Err(CommandError::UnknownKind(other)),
        }
    }
}

impl From<Command> for u32 {
    fn from(cmd: Command) -> Self {
        cmd.to_word()
    }
}

impl TryFrom<u32> for Command {
    type Error = CommandError;

    fn try_from(word: u32) -> Result<Self, Self::Error> {
        Command::from_word(word)
    }
}
