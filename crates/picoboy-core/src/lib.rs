//! Cross-core display and audio output pipeline for a handheld Game Boy
//! emulator.
//!
//! The emulation core hashes every finished scanline, drops lines the panel
//! already shows and hands the rest to a dedicated display core through a
//! small blocking command FIFO. The display core turns commands into bus
//! transfers, optionally through an asynchronous bulk-transfer engine whose
//! completion clears a shared busy flag. Once per frame the emulation core
//! also pushes a buffer of audio to the transport.
//!
//! Hardware (panel controller, bulk-transfer engine, audio transport) is
//! reached through the traits in [`display`] and [`audio`]; [`pipeline`]
//! wires both cores together.

/// Per-frame audio hand-off to the transport.
pub mod audio;

/// Cross-core busy flag.
pub mod busy;

/// Bounded SPSC command FIFO between the cores.
pub mod channel;

/// Command word encoding.
pub mod command;

/// Display controller and bulk-transfer capabilities.
pub mod display;

/// Per-row change detection.
pub mod dirty;

/// Display-core command loop and transfer state machine.
pub mod drive;

/// Error types.
pub mod error;

/// Screen, panel and audio constants.
pub mod hardware;

/// Copy-with-checksum of scanlines.
pub mod line_hash;

/// Scanline storage shared by both cores.
pub mod line_buffer;

/// Raw pixel to RGB565 color lookup.
pub mod palette;

/// Wiring of both cores.
pub mod pipeline;

/// Emulation-core side: scanline filtering and command production.
pub mod producer;
