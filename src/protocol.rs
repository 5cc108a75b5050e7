use crate::base::{
    Error, Frame, FrameError, Result, ACK_FLAG, NAK_COMMAND, RX_HEADER, TX_HEADER,
};
use crate::checksum::Checksum;
use log::{error, trace};

/// Header, length, command and checksum.
const WBUS_MIN_FRAME_SIZE: usize = 4;

/// Largest value the length byte can carry.
const WBUS_MAX_BODY_SIZE: usize = 0xFF;

/// Expectations a received frame must meet.
///
/// Every field is optional; the default filter only checks structure and checksum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameFilter {
    /// Expected command code, compared with the ACK bit stripped on positive replies.
    pub command: Option<u8>,
    /// Expected index byte at offset 3.
    pub index: Option<u8>,
    /// Minimum total frame size in bytes.
    pub min_length: Option<usize>,
}

impl FrameFilter {
    pub fn command(command: u8) -> FrameFilter {
        FrameFilter {
            command: Some(command),
            ..Default::default()
        }
    }

    pub fn command_and_index(command: u8, index: u8) -> FrameFilter {
        FrameFilter {
            command: Some(command),
            index: Some(index),
            ..Default::default()
        }
    }

    pub fn with_min_length(mut self, min_length: usize) -> FrameFilter {
        self.min_length = Some(min_length);
        self
    }
}

/// Encodes a host request `[F4][len][cmd][index?][payload][xor]`.
///
/// # Example
/// ```
/// let bytes = wbus::protocol::encode(0x50, Some(0x05), &[]).unwrap();
/// assert_eq!(bytes, [0xF4, 0x03, 0x50, 0x05, 0xA2]);
/// ```
pub fn encode(command: u8, index: Option<u8>, payload: &[u8]) -> Result<Vec<u8>> {
    encode_with_header(TX_HEADER, command, index, payload)
}

/// Encodes a frame with an arbitrary header byte.
///
/// Heater replies (`0x4F`) are built this way when simulating the device.
pub fn encode_with_header(
    header: u8,
    command: u8,
    index: Option<u8>,
    payload: &[u8],
) -> Result<Vec<u8>> {
    let body_len = 2 + index.map_or(0, |_| 1) + payload.len();
    if body_len > WBUS_MAX_BODY_SIZE {
        error!("Payload too large: {} bytes", payload.len());
        return Err(Error::PayloadTooLarge {
            len: payload.len(),
        });
    }

    let mut bytes = Vec::with_capacity(body_len + 2);
    bytes.push(header);
    bytes.push(body_len as u8);
    bytes.push(command);
    if let Some(index) = index {
        bytes.push(index);
    }
    bytes.extend_from_slice(payload);
    let checksum = Checksum::of(&bytes);
    bytes.push(checksum);
    trace!(
        "Encoded frame cmd={:02X} index={:?} into {} bytes, checksum {:02X}",
        command,
        index,
        bytes.len(),
        checksum
    );
    Ok(bytes)
}

/// Validates received bytes and splits them into a `Frame`.
///
/// Checks, in order: minimum size, length byte, caller's minimum length,
/// header byte, checksum, expected command and expected index. When an index
/// is expected the returned frame carries it and the payload starts after it.
/// Never panics on truncated input.
pub fn decode(bytes: &[u8], filter: &FrameFilter) -> std::result::Result<Frame, FrameError> {
    let len = bytes.len();
    if len < WBUS_MIN_FRAME_SIZE {
        return Err(FrameError::TooShort { len });
    }
    if bytes[1] as usize + 2 != len {
        return Err(FrameError::LengthMismatch {
            declared: bytes[1],
            actual: len,
        });
    }
    if let Some(min) = filter.min_length {
        if len < min {
            return Err(FrameError::BelowMinLength { min, actual: len });
        }
    }

    let header = bytes[0];
    if header != TX_HEADER && header != RX_HEADER {
        return Err(FrameError::BadHeader(header));
    }

    let expected_checksum = Checksum::of(&bytes[..len - 1]);
    let checksum = bytes[len - 1];
    if expected_checksum != checksum {
        return Err(FrameError::ChecksumMismatch {
            expected: expected_checksum,
            actual: checksum,
        });
    }

    let command = bytes[2];
    if let Some(expected) = filter.command {
        let is_nak = header == RX_HEADER && command == NAK_COMMAND;
        let actual = if header == RX_HEADER && !is_nak {
            command & !ACK_FLAG
        } else {
            command
        };
        if actual != expected {
            return Err(FrameError::CommandMismatch { expected, actual });
        }
    }

    let (index, payload_start) = match filter.index {
        Some(expected) => {
            // the checksum occupies the last byte, so an index needs five
            if len < WBUS_MIN_FRAME_SIZE + 1 {
                return Err(FrameError::IndexMismatch {
                    expected,
                    actual: None,
                });
            }
            if bytes[3] != expected {
                return Err(FrameError::IndexMismatch {
                    expected,
                    actual: Some(bytes[3]),
                });
            }
            (Some(expected), 4)
        }
        None => (None, 3),
    };

    Ok(Frame {
        header,
        command,
        index,
        payload: bytes[payload_start..len - 1].to_vec(),
        checksum,
    })
}
