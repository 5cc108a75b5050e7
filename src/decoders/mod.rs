//! Stateless decoders turning response payloads into typed records.
//!
//! Each decoder takes the payload that follows the index byte of a frame
//! already validated by [`crate::protocol::decode`]. Payloads that are too
//! short produce the record's `Default` value and a warning; no decoder
//! returns an error or panics.

mod errors;
mod info;
mod sensors;
mod state;

pub use self::errors::{decode_error_details, decode_error_list, decode_nak};
pub use self::info::{
    decode_device_id, decode_manufacture_date, decode_serial_number, decode_text,
    decode_wbus_code, decode_wbus_version,
};
pub use self::sensors::{
    decode_burning_duration, decode_fuel_prewarming, decode_fuel_settings, decode_on_off_flags,
    decode_operating_times, decode_operational, decode_start_counters, decode_status_flags,
    decode_subsystems,
};
pub use self::state::decode_operating_state;

use crate::base::Frame;
use crate::cmds::*;
use crate::types::*;
use byteorder::{BigEndian, ByteOrder};
use log::warn;

/// Any record a response frame can decode to.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedRecord {
    Operational(OperationalMeasurements),
    FuelSettings(FuelSettings),
    OnOffFlags(OnOffFlags),
    StatusFlags(StatusFlags),
    OperatingState(OperatingState),
    Subsystems(SubsystemsStatus),
    OperatingTimes(OperatingTimes),
    BurningDuration(BurningDuration),
    StartCounters(StartCounters),
    FuelPrewarming(FuelPrewarming),
    ErrorList(ErrorCollection),
    ErrorDetails(ErrorDetails),
    Nak(NakReply),
    DeviceId(String),
    ControllerManufactureDate(ManufactureDate),
    HeaterManufactureDate(ManufactureDate),
    CustomerId(String),
    SerialNumber(SerialNumber),
    WbusVersion(WbusVersion),
    DeviceName(String),
    WbusCode(WbusCode),
}

/// Dispatches a validated heater reply to the matching decoder.
///
/// The lookup key is the command with the ACK bit stripped plus the frame's
/// index. NAK frames always decode to [`DecodedRecord::Nak`]. Pairs without a
/// decoder give `None`.
pub fn decode_response(frame: &Frame) -> Option<DecodedRecord> {
    if frame.is_nak() {
        return Some(DecodedRecord::Nak(decode_nak(&frame.payload)));
    }
    let index = frame.index?;
    let p = frame.payload.as_slice();
    let record = match (frame.command_code(), index) {
        (WBUS_CMD_READ_SENSOR, WBUS_SENSOR_OPERATIONAL) => {
            DecodedRecord::Operational(decode_operational(p))
        }
        (WBUS_CMD_READ_SENSOR, WBUS_SENSOR_FUEL_SETTINGS) => {
            DecodedRecord::FuelSettings(decode_fuel_settings(p))
        }
        (WBUS_CMD_READ_SENSOR, WBUS_SENSOR_ON_OFF_FLAGS) => {
            DecodedRecord::OnOffFlags(decode_on_off_flags(p))
        }
        (WBUS_CMD_READ_SENSOR, WBUS_SENSOR_STATUS_FLAGS) => {
            DecodedRecord::StatusFlags(decode_status_flags(p))
        }
        (WBUS_CMD_READ_SENSOR, WBUS_SENSOR_OPERATING_STATE) => {
            DecodedRecord::OperatingState(decode_operating_state(p))
        }
        (WBUS_CMD_READ_SENSOR, WBUS_SENSOR_SUBSYSTEMS) => {
            DecodedRecord::Subsystems(decode_subsystems(p))
        }
        (WBUS_CMD_READ_SENSOR, WBUS_SENSOR_OPERATING_TIMES) => {
            DecodedRecord::OperatingTimes(decode_operating_times(p))
        }
        (WBUS_CMD_READ_SENSOR, WBUS_SENSOR_BURNING_DURATION) => {
            DecodedRecord::BurningDuration(decode_burning_duration(p))
        }
        (WBUS_CMD_READ_SENSOR, WBUS_SENSOR_START_COUNTERS) => {
            DecodedRecord::StartCounters(decode_start_counters(p))
        }
        (WBUS_CMD_READ_SENSOR, WBUS_SENSOR_FUEL_PREWARMING) => {
            DecodedRecord::FuelPrewarming(decode_fuel_prewarming(p))
        }
        (WBUS_CMD_ERRORS, WBUS_ERRORS_READ_LIST) => DecodedRecord::ErrorList(decode_error_list(p)),
        (WBUS_CMD_ERRORS, WBUS_ERRORS_READ_DETAILS) => {
            DecodedRecord::ErrorDetails(decode_error_details(p))
        }
        (WBUS_CMD_READ_INFO, WBUS_INFO_DEVICE_ID) => DecodedRecord::DeviceId(decode_device_id(p)),
        (WBUS_CMD_READ_INFO, WBUS_INFO_CTRL_MFG_DATE) => {
            DecodedRecord::ControllerManufactureDate(decode_manufacture_date(p))
        }
        (WBUS_CMD_READ_INFO, WBUS_INFO_HEATER_MFG_DATE) => {
            DecodedRecord::HeaterManufactureDate(decode_manufacture_date(p))
        }
        (WBUS_CMD_READ_INFO, WBUS_INFO_CUSTOMER_ID) => DecodedRecord::CustomerId(decode_text(p)),
        (WBUS_CMD_READ_INFO, WBUS_INFO_SERIAL_NUMBER) => {
            DecodedRecord::SerialNumber(decode_serial_number(p))
        }
        (WBUS_CMD_READ_INFO, WBUS_INFO_WBUS_VERSION) => {
            DecodedRecord::WbusVersion(decode_wbus_version(p))
        }
        (WBUS_CMD_READ_INFO, WBUS_INFO_DEVICE_NAME) => DecodedRecord::DeviceName(decode_text(p)),
        (WBUS_CMD_READ_INFO, WBUS_INFO_WBUS_CODE) => DecodedRecord::WbusCode(decode_wbus_code(p)),
        _ => return None,
    };
    Some(record)
}

/// Logs and reports whether `payload` holds at least `min` bytes.
fn has_len(payload: &[u8], min: usize, what: &str) -> bool {
    if payload.len() < min {
        warn!(
            "{} payload too short: {} bytes, {} required",
            what,
            payload.len(),
            min
        );
        return false;
    }
    true
}

#[inline]
fn byte(payload: &[u8], offset: usize) -> u8 {
    payload.get(offset).copied().unwrap_or(0)
}

#[inline]
fn be_u16(payload: &[u8], offset: usize) -> u16 {
    payload
        .get(offset..offset + 2)
        .map(BigEndian::read_u16)
        .unwrap_or(0)
}

/// Raw temperature byte is offset by 50 °C.
#[inline]
fn temperature(raw: u8) -> f32 {
    raw as f32 - 50.0
}

/// Big-endian millivolts to volts.
#[inline]
fn voltage(payload: &[u8], offset: usize) -> f32 {
    be_u16(payload, offset) as f32 / 1000.0
}

#[inline]
fn bit(value: u8, mask: u8) -> bool {
    value & mask != 0
}
