mod channel;
mod error;
mod frame;
mod message;
mod traits;

pub use self::channel::*;
pub use self::error::{Error, FrameError, Result};
pub use self::frame::{
    Direction, Frame, RawFrame, ACK_FLAG, NAK_COMMAND, RX_HEADER, TX_HEADER,
};
pub use self::message::Message;
pub use self::traits::{BusLine, ProtocolDecoder};
