use crate::checksum::Checksum;

/// Header byte of frames sent by the host.
pub const TX_HEADER: u8 = 0xF4;

/// Header byte of frames sent by the heater.
pub const RX_HEADER: u8 = 0x4F;

/// Bit set on the command byte of a positive response.
pub const ACK_FLAG: u8 = 0x80;

/// Command byte of a negative response.
pub const NAK_COMMAND: u8 = 0x7F;

/// Which side of the bus a frame came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Host to heater. On a half-duplex line these are the host's own echoes.
    Tx,
    /// Heater to host.
    Rx,
}

impl Direction {
    /// Maps a header byte to a direction.
    pub fn from_header(header: u8) -> Option<Direction> {
        match header {
            TX_HEADER => Some(Direction::Tx),
            RX_HEADER => Some(Direction::Rx),
            _ => None,
        }
    }

    /// The header byte that starts frames in this direction.
    pub fn header(self) -> u8 {
        match self {
            Direction::Tx => TX_HEADER,
            Direction::Rx => RX_HEADER,
        }
    }
}

/// Complete, unvalidated byte sequence delimited by the framer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub direction: Direction,
    pub bytes: Vec<u8>,
}

/// A validated W-Bus frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: u8,
    /// Command byte as received, ACK bit included.
    pub command: u8,
    /// Present when the frame was decoded with an expected index.
    pub index: Option<u8>,
    pub payload: Vec<u8>,
    pub checksum: u8,
}

impl Frame {
    pub fn direction(&self) -> Option<Direction> {
        Direction::from_header(self.header)
    }

    /// `true` for frames sent by the heater.
    #[inline]
    pub fn is_response(&self) -> bool {
        self.header == RX_HEADER
    }

    /// `true` for a heater reply rejecting a command.
    #[inline]
    pub fn is_nak(&self) -> bool {
        self.is_response() && self.command == NAK_COMMAND
    }

    /// `true` for a positive heater reply.
    #[inline]
    pub fn is_ack(&self) -> bool {
        self.is_response() && !self.is_nak() && self.command & ACK_FLAG != 0
    }

    /// Command code with the ACK bit stripped from positive replies.
    #[inline]
    pub fn command_code(&self) -> u8 {
        if self.is_ack() {
            self.command & !ACK_FLAG
        } else {
            self.command
        }
    }

    /// Value of the length byte.
    pub fn length(&self) -> usize {
        2 + self.index.map_or(0, |_| 1) + self.payload.len()
    }

    /// Serializes the frame back to wire bytes, recomputing the checksum.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.length() + 2);
        bytes.push(self.header);
        bytes.push(self.length() as u8);
        bytes.push(self.command);
        if let Some(index) = self.index {
            bytes.push(index);
        }
        bytes.extend_from_slice(&self.payload);
        bytes.push(Checksum::of(&bytes));
        bytes
    }
}
