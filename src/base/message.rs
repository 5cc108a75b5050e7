/// A request to be sent to the heater: command code, optional index byte and payload.
///
/// Header, length and checksum are added by the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The command code.
    pub cmd: u8,

    /// Sub-selector used by read commands (sensor, info, error list).
    pub index: Option<u8>,

    /// Payload following the index byte.
    pub data: Vec<u8>,
}

impl Message {
    /// Creates a new message with a command code and no payload.
    ///
    /// # Arguments
    ///
    /// * `cmd` - The command code for the message.
    pub fn new(cmd: u8) -> Message {
        Message::with_data(cmd, &[])
    }

    /// Creates a new message with a command code and payload data.
    ///
    /// # Arguments
    ///
    /// * `cmd` - The command code for the message.
    /// * `data` - A slice containing the payload data.
    #[inline]
    pub fn with_data(cmd: u8, data: &[u8]) -> Message {
        Message {
            cmd,
            index: None,
            data: data.to_vec(),
        }
    }

    /// Creates a message carrying an index byte in front of the payload.
    #[inline]
    pub fn with_index(cmd: u8, index: u8, data: &[u8]) -> Message {
        Message {
            cmd,
            index: Some(index),
            data: data.to_vec(),
        }
    }
}
