use std::error;
use std::fmt;
use std::io;

/// Reasons a byte sequence was rejected as a W-Bus frame.
///
/// Frame errors are never fatal to a bus session: the offending bytes are
/// dropped and the engine keeps waiting for a valid reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Fewer bytes than the smallest possible frame (header, length, command, checksum).
    TooShort { len: usize },

    /// The length byte does not match the number of bytes received.
    LengthMismatch { declared: u8, actual: usize },

    /// The frame is shorter than the caller required.
    BelowMinLength { min: usize, actual: usize },

    /// The first byte is neither the host nor the heater header.
    BadHeader(u8),

    /// The trailing byte is not the XOR of all preceding bytes.
    ChecksumMismatch { expected: u8, actual: u8 },

    /// The command byte (ACK bit masked) is not the expected one.
    CommandMismatch { expected: u8, actual: u8 },

    /// The index byte is missing or is not the expected one.
    IndexMismatch { expected: u8, actual: Option<u8> },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::TooShort { len } => write!(f, "frame too short ({} bytes)", len),
            FrameError::LengthMismatch { declared, actual } => write!(
                f,
                "length byte {} does not match frame of {} bytes",
                declared, actual
            ),
            FrameError::BelowMinLength { min, actual } => {
                write!(f, "frame of {} bytes, at least {} required", actual, min)
            }
            FrameError::BadHeader(h) => write!(f, "unknown header byte 0x{:02X}", h),
            FrameError::ChecksumMismatch { expected, actual } => write!(
                f,
                "checksum mismatch: expected 0x{:02X}, got 0x{:02X}",
                expected, actual
            ),
            FrameError::CommandMismatch { expected, actual } => write!(
                f,
                "command mismatch: expected 0x{:02X}, got 0x{:02X}",
                expected, actual
            ),
            FrameError::IndexMismatch { expected, actual } => match actual {
                Some(actual) => write!(
                    f,
                    "index mismatch: expected 0x{:02X}, got 0x{:02X}",
                    expected, actual
                ),
                None => write!(f, "index 0x{:02X} expected, frame has none", expected),
            },
        }
    }
}

impl error::Error for FrameError {}

/// Represents errors that can occur during W-Bus operations.
#[derive(Debug)]
pub enum Error {
    /// Received bytes are not a valid frame.
    Frame(FrameError),

    /// A command exhausted its retry budget without a reply.
    OperationTimeout,

    /// The target queue is at capacity.
    QueueFull,

    /// An identical command is already waiting in the target queue.
    DuplicateCommand,

    /// Payload does not fit into the one-byte length field.
    PayloadTooLarge { len: usize },

    /// A hex command string contains something other than hex byte pairs.
    InvalidHex { token: String },

    /// An I/O error occurred on the serial line.
    IoError(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Frame(err) => write!(f, "invalid frame: {}", err),
            Error::OperationTimeout => write!(f, "operation timeout"),
            Error::QueueFull => write!(f, "command queue is full"),
            Error::DuplicateCommand => write!(f, "command is already queued"),
            Error::PayloadTooLarge { len } => write!(f, "payload of {} bytes is too large", len),
            Error::InvalidHex { token } => write!(f, "invalid hex byte '{}'", token),
            Error::IoError(err) => write!(f, "io error: {}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Frame(err) => Some(err),
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<FrameError> for Error {
    fn from(err: FrameError) -> Self {
        Error::Frame(err)
    }
}

/// A specialized `Result` type for W-Bus operations.
pub type Result<T> = std::result::Result<T, Error>;
