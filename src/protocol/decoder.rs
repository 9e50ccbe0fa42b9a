use crate::protocol::{Frame, PAYLOAD_LEN};

/// Parses the three bytes after a sync marker.
///
/// The axis code is not validated here; unknown codes travel on to the input
/// state machine, which ignores them.
pub fn decode(payload: [u8; PAYLOAD_LEN]) -> Frame {
    Frame {
        axis: payload[0],
        value: i16::from_le_bytes([payload[1], payload[2]]),
    }
}
