use crate::base::{Error, Frame, FrameError, Message, Result, TX_HEADER};
use crate::cmds::has_index;
use crate::protocol::{self, FrameFilter};
use crate::types::NakReply;
use crate::utils::{parse_hex, to_hex};
use log::{trace, warn};
use std::collections::VecDeque;
use std::fmt;

/// Completion callback of a queued command.
pub type Callback = Box<dyn FnMut(&Exchange)>;

/// How an exchange ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Positive reply from the heater.
    Response(Frame),
    /// The heater rejected the command.
    Nak(NakReply),
    /// Retries exhausted, or the request could not be written.
    Failed,
}

/// What a completion callback receives.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    /// The request bytes as sent.
    pub request: Vec<u8>,
    pub outcome: Outcome,
}

impl Exchange {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Response(_))
    }

    pub fn response(&self) -> Option<&Frame> {
        match &self.outcome {
            Outcome::Response(frame) => Some(frame),
            _ => None,
        }
    }
}

/// A request waiting for, or in, transmission.
///
/// The encoded bytes are the command's identity: two commands with the same
/// bytes are duplicates.
pub struct QueuedCommand {
    bytes: Vec<u8>,
    looping: bool,
    callback: Option<Callback>,
}

impl QueuedCommand {
    /// Wraps an encoded host request after checking its length and checksum.
    pub fn new(bytes: Vec<u8>) -> Result<QueuedCommand> {
        let frame = protocol::decode(&bytes, &FrameFilter::default())?;
        if frame.header != TX_HEADER {
            return Err(FrameError::BadHeader(frame.header).into());
        }
        Ok(QueuedCommand {
            bytes,
            looping: false,
            callback: None,
        })
    }

    pub fn from_message(msg: &Message) -> Result<QueuedCommand> {
        QueuedCommand::new(protocol::encode(msg.cmd, msg.index, &msg.data)?)
    }

    /// Parses a request written as hex, e.g. `"F4 03 50 05 A2"`.
    pub fn from_hex(text: &str) -> Result<QueuedCommand> {
        QueuedCommand::new(parse_hex(text)?)
    }

    /// Re-queue the command after every successful reply.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Exchange) + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn command(&self) -> u8 {
        self.bytes[2]
    }

    /// Index byte for commands that carry one.
    pub fn index(&self) -> Option<u8> {
        if has_index(self.command()) {
            self.bytes.get(3).copied().filter(|_| self.bytes.len() > 4)
        } else {
            None
        }
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub(crate) fn complete(&mut self, exchange: &Exchange) {
        if let Some(callback) = self.callback.as_mut() {
            callback(exchange);
        }
    }
}

impl fmt::Debug for QueuedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedCommand")
            .field("bytes", &to_hex(&self.bytes))
            .field("looping", &self.looping)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Two bounded FIFOs; the priority queue always drains first.
#[derive(Debug)]
pub struct CommandQueue {
    priority: VecDeque<QueuedCommand>,
    normal: VecDeque<QueuedCommand>,
    priority_capacity: usize,
    normal_capacity: usize,
}

impl CommandQueue {
    pub fn new(priority_capacity: usize, normal_capacity: usize) -> CommandQueue {
        CommandQueue {
            priority: VecDeque::with_capacity(priority_capacity),
            normal: VecDeque::with_capacity(normal_capacity),
            priority_capacity,
            normal_capacity,
        }
    }

    pub fn set_capacity(&mut self, priority_capacity: usize, normal_capacity: usize) {
        self.priority_capacity = priority_capacity;
        self.normal_capacity = normal_capacity;
    }

    pub fn push_priority(&mut self, command: QueuedCommand) -> Result<()> {
        let capacity = self.priority_capacity;
        Self::push(&mut self.priority, capacity, command, "priority")
    }

    pub fn push_normal(&mut self, command: QueuedCommand) -> Result<()> {
        let capacity = self.normal_capacity;
        Self::push(&mut self.normal, capacity, command, "normal")
    }

    fn push(
        queue: &mut VecDeque<QueuedCommand>,
        capacity: usize,
        command: QueuedCommand,
        name: &str,
    ) -> Result<()> {
        if queue.iter().any(|c| c.bytes == command.bytes) {
            trace!("Rejecting duplicate {} command {}", name, to_hex(&command.bytes));
            return Err(Error::DuplicateCommand);
        }
        if queue.len() >= capacity {
            warn!("{} queue full, dropping {}", name, to_hex(&command.bytes));
            return Err(Error::QueueFull);
        }
        trace!("Queued {} command {}", name, to_hex(&command.bytes));
        queue.push_back(command);
        Ok(())
    }

    /// Next command to send, priority queue first.
    pub fn pop(&mut self) -> Option<QueuedCommand> {
        self.priority
            .pop_front()
            .or_else(|| self.normal.pop_front())
    }

    /// Removes a command with these bytes from either queue.
    pub fn remove(&mut self, bytes: &[u8]) -> bool {
        let before = self.len();
        self.priority.retain(|c| c.bytes != bytes);
        self.normal.retain(|c| c.bytes != bytes);
        before != self.len()
    }

    pub fn contains(&self, bytes: &[u8]) -> bool {
        self.priority
            .iter()
            .chain(self.normal.iter())
            .any(|c| c.bytes == bytes)
    }

    pub fn len(&self) -> usize {
        self.priority.len() + self.normal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.priority.is_empty() && self.normal.is_empty()
    }

    pub fn clear(&mut self) {
        self.priority.clear();
        self.normal.clear();
    }
}
