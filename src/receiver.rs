use crate::base::{Direction, ProtocolDecoder, RawFrame, Result};
use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeStatus {
    WaitHeader,
    WaitLength(Direction),
    ReceiveBody(Direction),
}

/// Cuts the raw bus byte stream into frames.
///
/// A frame starts at a header byte seen while idle: `0xF4` opens a host
/// frame (our own echo on a half-duplex line), `0x4F` opens a heater frame.
/// The following byte is the declared length and the frame is complete once
/// `length + 2` bytes were collected. Bytes seen while idle that are not a
/// header are skipped. Checksums are not looked at here.
///
/// The "received" flags are one-shot: [`BusFramer::process`] clears them
/// before consuming the bytes of the current poll, while a partially
/// collected frame survives until it completes or [`ProtocolDecoder::reset_decoder`]
/// drops it.
#[derive(Debug, Clone)]
pub struct BusFramer {
    status: DecodeStatus,
    buffer: Vec<u8>,
    bytes_to_read: usize,
    rx_frames: Vec<RawFrame>,
    tx_frames: Vec<RawFrame>,
}

impl BusFramer {
    pub fn new() -> BusFramer {
        trace!("Creating new BusFramer");
        BusFramer {
            status: DecodeStatus::WaitHeader,
            buffer: Vec::new(),
            bytes_to_read: 0,
            rx_frames: Vec::new(),
            tx_frames: Vec::new(),
        }
    }

    fn start_wait_header(&mut self) {
        self.status = DecodeStatus::WaitHeader;
        self.buffer.clear();
        self.bytes_to_read = 0;
    }

    fn start_wait_length(&mut self, direction: Direction, header: u8) {
        trace!("Framer state -> WaitLength({:?})", direction);
        self.status = DecodeStatus::WaitLength(direction);
        self.buffer.clear();
        self.buffer.push(header);
    }

    /// Consumes one poll worth of bytes.
    ///
    /// Clears the received frames first, then feeds every byte through the
    /// decoder. Every frame completed in this poll is kept, in arrival order.
    pub fn process(&mut self, data: &[u8]) {
        self.rx_frames.clear();
        self.tx_frames.clear();

        let mut offset = 0;
        while offset < data.len() {
            // decode never fails; the Result comes from the trait
            let (consumed, frame) = match self.decode(&data[offset..]) {
                Ok(res) => res,
                Err(_) => (data.len() - offset, None),
            };
            offset += consumed;
            if let Some(frame) = frame {
                match frame.direction {
                    Direction::Rx => self.rx_frames.push(frame),
                    Direction::Tx => self.tx_frames.push(frame),
                }
            }
        }
    }

    /// `true` if a heater frame completed during the last poll.
    pub fn is_rx_received(&self) -> bool {
        !self.rx_frames.is_empty()
    }

    /// `true` if a host frame (echo) completed during the last poll.
    pub fn is_tx_received(&self) -> bool {
        !self.tx_frames.is_empty()
    }

    /// First heater frame of the last poll.
    pub fn rx_frame(&self) -> Option<&RawFrame> {
        self.rx_frames.first()
    }

    pub fn tx_frame(&self) -> Option<&RawFrame> {
        self.tx_frames.first()
    }

    /// All heater frames of the last poll.
    pub fn rx_frames(&self) -> &[RawFrame] {
        &self.rx_frames
    }

    pub fn tx_frames(&self) -> &[RawFrame] {
        &self.tx_frames
    }

    /// `true` while a frame is partially collected.
    pub fn is_receiving(&self) -> bool {
        self.status != DecodeStatus::WaitHeader
    }
}

impl Default for BusFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolDecoder for BusFramer {
    /// Consumes bytes until one frame completes or the buffer runs out.
    fn decode(&mut self, buf: &[u8]) -> Result<(usize, Option<RawFrame>)> {
        let mut i = 0;
        while i < buf.len() {
            let byte = buf[i];
            i += 1;
            match self.status {
                DecodeStatus::WaitHeader => match Direction::from_header(byte) {
                    Some(direction) => self.start_wait_length(direction, byte),
                    None => trace!("Skipping noise byte {:02X}", byte),
                },
                DecodeStatus::WaitLength(direction) => {
                    self.buffer.push(byte);
                    self.bytes_to_read = byte as usize;
                    self.status = DecodeStatus::ReceiveBody(direction);
                    trace!(
                        "Framer state -> ReceiveBody({:?}, {} bytes)",
                        direction,
                        self.bytes_to_read
                    );
                }
                DecodeStatus::ReceiveBody(_) => self.buffer.push(byte),
            }

            if let DecodeStatus::ReceiveBody(direction) = self.status {
                if self.buffer.len() >= self.bytes_to_read + 2 {
                    let frame = RawFrame {
                        direction,
                        bytes: std::mem::take(&mut self.buffer),
                    };
                    trace!("Frame complete: {:?} {:02X?}", direction, frame.bytes);
                    self.start_wait_header();
                    return Ok((i, Some(frame)));
                }
            }
        }
        Ok((i, None))
    }

    fn reset_decoder(&mut self) {
        trace!("Resetting framer state");
        self.start_wait_header();
    }
}
