//! Wire protocol of the joystick controller
//!
//! The controller streams fixed 4-byte units over a serial line:
//!
//! ```text
//! byte 0:      0xFF                     (sync marker)
//! byte 1:      axis code (0..255, meaningful values 0-3)
//! bytes 2-3:   value, little-endian, signed 16-bit two's complement
//! ```
//!
//! 1. [`frame_reader`] - Resynchronizes on the byte stream and cuts out payloads
//! 2. [`decoder`] - Turns a payload into a [`Frame`]
//!
//! Anything that does not start with the sync marker is skipped one byte at a
//! time. There is no checksum; the sync marker is the only recovery path.

pub mod decoder;
pub mod frame_reader;

pub use decoder::decode;
pub use frame_reader::{FrameReader, ReaderStats, SkipReason, SyncAttempt};

/// Marks the start of every unit on the wire
pub const SYNC_MARKER: u8 = 0xFF;

/// Bytes following the sync marker
pub const PAYLOAD_LEN: usize = 3;

/// Full unit length including the sync marker
pub const FRAME_LEN: usize = PAYLOAD_LEN + 1;

/// One decoded protocol unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Frame {
    /// Axis code as received. 0-3 carry meaning, everything else is forwarded untouched.
    pub axis: u8,
    /// Signed reading, already converted from little-endian
    pub value: i16,
}

impl Frame {
    pub fn new(axis: u8, value: i16) -> Self {
        Self { axis, value }
    }

    /// Encodes the frame the way the controller puts it on the wire.
    pub fn to_wire(&self) -> [u8; FRAME_LEN] {
        let [lo, hi] = self.value.to_le_bytes();
        [SYNC_MARKER, self.axis, lo, hi]
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "axis {} = {}", self.axis, self.value)
    }
}
