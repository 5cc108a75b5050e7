//! # W-Bus Protocol Engine
//!
//! `wbus` talks to vehicle auxiliary heaters over the single-wire W-Bus. It
//! frames and checksums requests, splits the half-duplex byte stream back into
//! frames, and decodes heater replies into typed records. A queue engine keeps
//! exactly one command in flight and recovers a stalled bus with a BREAK
//! reset.
//!
//! The engine owns a [`base::BusLine`] (any `Read + Write` serial port able to
//! drive BREAK) and makes progress each time [`BusEngine::poll`] is called.
//! Only a BREAK reset blocks, for twice the configured break duration.
//!
//! # Example
//! ```
//! use wbus::{cmds, protocol, utils};
//!
//! let msg = cmds::read_sensor(cmds::WBUS_SENSOR_OPERATIONAL);
//! let bytes = protocol::encode(msg.cmd, msg.index, &msg.data).unwrap();
//! assert_eq!(utils::to_hex(&bytes), "F4 03 50 05 A2");
//!
//! let frame = protocol::decode(&bytes, &protocol::FrameFilter::default()).unwrap();
//! assert_eq!(frame.index, Some(0x05));
//! assert_eq!(wbus::catalog::describe_error(0x2F), "flame out");
//! ```

extern crate byteorder;
extern crate log;

pub mod base;
pub mod catalog;
mod checksum;
pub mod cmds;
mod config;
mod controller;
pub mod decoders;
mod engine;
mod internals;
pub mod protocol;
mod queue;
mod receiver;
pub mod types;
pub mod utils;

#[cfg(test)]
mod mock;

pub use crate::base::{BusLine, Channel, Error, Frame, FrameError, Message, Result};
pub use crate::config::{BusConfig, ControllerConfig};
pub use crate::controller::{ConnectionState, HeaterController};
pub use crate::decoders::DecodedRecord;
pub use crate::engine::{BusEngine, BusEvent, ChannelSink, EventSink, QueueState};
pub use crate::protocol::FrameFilter;
pub use crate::queue::{Callback, CommandQueue, Exchange, Outcome, QueuedCommand};
pub use crate::receiver::BusFramer;
