use crate::base::error::Result;
use crate::base::frame::RawFrame;
use std::io;

/// Defines the behavior for cutting a byte stream into frames.
pub trait ProtocolDecoder {
    /// Feeds bytes into the decoder.
    ///
    /// Returns a `Result` containing a tuple:
    /// * The number of bytes consumed from the buffer.
    /// * An `Option<RawFrame>` which is `Some` if a frame was completed, or `None` otherwise.
    ///
    /// # Arguments
    ///
    /// * `buf` - The byte slice containing the data to decode.
    fn decode(&mut self, buf: &[u8]) -> Result<(usize, Option<RawFrame>)>;

    /// Resets the internal state of the decoder.
    /// This is typically called after a BREAK or when starting a new session.
    fn reset_decoder(&mut self);
}

/// A serial line the bus can be driven over.
///
/// Reads are expected to be non-blocking or to have a short timeout; an
/// `io::ErrorKind::TimedOut` or `WouldBlock` result counts as "no data".
pub trait BusLine: io::Read + io::Write {
    /// Forces the line into the BREAK (dominant) state.
    fn set_break(&mut self) -> io::Result<()>;

    /// Releases the line from the BREAK state.
    fn clear_break(&mut self) -> io::Result<()>;
}

impl<L: BusLine + ?Sized> BusLine for Box<L> {
    fn set_break(&mut self) -> io::Result<()> {
        (**self).set_break()
    }

    fn clear_break(&mut self) -> io::Result<()> {
        (**self).clear_break()
    }
}
