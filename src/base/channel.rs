use crate::base::error::Result;
use crate::base::frame::RawFrame;
use crate::base::traits::{BusLine, ProtocolDecoder};
use crate::receiver::BusFramer;
use log::{error, trace};
use std::io;

const CHANNEL_READ_CHUNK_SIZE: usize = 64;

/// Upper bound of bytes drained from the line in one poll.
const MAX_BYTES_PER_POLL: usize = 512;

/// Channel writes encoded requests onto the serial line and frames what comes back.
///
/// # Examples
/// ```ignore
/// let mut channel = Channel::new(Box::new(serial_line));
///
/// channel.write_raw(&wbus::protocol::encode(0x38, None, &[])?)?;
/// channel.poll()?;
/// if let Some(frame) = channel.rx_frame() {
///     println!("{:02X?}", frame.bytes);
/// }
/// ```
#[derive(Debug)]
pub struct Channel<T: ?Sized> {
    framer: BusFramer,
    break_active: bool,
    stream: Box<T>,
}

impl<T: ?Sized> Channel<T>
where
    T: BusLine,
{
    /// Create a new `Channel` over a serial line
    pub fn new(stream: Box<T>) -> Channel<T> {
        trace!("Creating new Channel");
        let mut chn = Channel {
            framer: BusFramer::new(),
            break_active: false,
            stream,
        };
        chn.reset();
        chn
    }

    /// Drop any partially received frame
    pub fn reset(&mut self) {
        trace!("Resetting Channel framer");
        self.framer.reset_decoder();
    }

    /// Drain whatever the line has buffered and feed it to the framer.
    ///
    /// Read timeouts count as no data. Returns the number of bytes read.
    /// The framer's received flags reflect this poll only.
    pub fn poll(&mut self) -> Result<usize> {
        let mut collected = Vec::new();
        let mut chunk = [0u8; CHANNEL_READ_CHUNK_SIZE];
        while collected.len() < MAX_BYTES_PER_POLL {
            match self.stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => collected.extend_from_slice(&chunk[..n]),
                Err(e)
                    if e.kind() == io::ErrorKind::TimedOut
                        || e.kind() == io::ErrorKind::WouldBlock =>
                {
                    break
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("IO error reading from stream: {}", e);
                    return Err(e.into());
                }
            }
        }
        if !collected.is_empty() {
            trace!("Read {} bytes: {:02X?}", collected.len(), collected);
        }
        self.framer.process(&collected);
        Ok(collected.len())
    }

    /// First heater frame completed during the last poll, if any.
    pub fn rx_frame(&self) -> Option<&RawFrame> {
        self.framer.rx_frame()
    }

    /// Every heater frame completed during the last poll.
    pub fn rx_frames(&self) -> &[RawFrame] {
        self.framer.rx_frames()
    }

    /// Host echo completed during the last poll, if any.
    pub fn tx_frame(&self) -> Option<&RawFrame> {
        self.framer.tx_frame()
    }

    /// Write an already encoded frame to the line
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<usize> {
        trace!("Channel write_raw called: {:02X?}", bytes);
        if let Err(e) = self.stream.write_all(bytes) {
            error!("IO error during write_all: {}", e);
            return Err(e.into());
        }
        self.stream.flush()?;
        Ok(bytes.len())
    }

    /// Pull the line into BREAK
    pub fn set_break(&mut self) -> Result<()> {
        trace!("Setting BREAK");
        self.stream.set_break()?;
        self.break_active = true;
        Ok(())
    }

    /// Release BREAK and forget any half received frame
    pub fn clear_break(&mut self) -> Result<()> {
        trace!("Clearing BREAK");
        self.stream.clear_break()?;
        self.break_active = false;
        self.framer.reset_decoder();
        Ok(())
    }

    pub fn is_break_active(&self) -> bool {
        self.break_active
    }

    /// Borrow the underlying line
    pub fn line(&self) -> &T {
        &self.stream
    }

    /// Mutably borrow the underlying line
    pub fn line_mut(&mut self) -> &mut T {
        &mut self.stream
    }
}
