use super::{bit, has_len};
use crate::types::{ManufactureDate, SerialNumber, WbusCode, WbusVersion};
use crate::utils::{printable_text, to_hex};

const WBUS_CODE_LEN: usize = 7;
const SERIAL_LEN: usize = 5;

/// Version byte, major in the high nibble.
pub fn decode_wbus_version(payload: &[u8]) -> WbusVersion {
    if !has_len(payload, 1, "W-Bus version") {
        return WbusVersion::default();
    }
    WbusVersion {
        major: payload[0] >> 4,
        minor: payload[0] & 0x0F,
    }
}

/// Text fields such as the device name or customer id.
pub fn decode_text(payload: &[u8]) -> String {
    printable_text(payload)
}

/// Device id as upper-case hex without separators.
pub fn decode_device_id(payload: &[u8]) -> String {
    to_hex(payload).replace(' ', "")
}

/// `[day][month][year - 2000]`.
pub fn decode_manufacture_date(payload: &[u8]) -> ManufactureDate {
    if !has_len(payload, 3, "manufacture date") {
        return ManufactureDate::default();
    }
    ManufactureDate {
        day: payload[0],
        month: payload[1],
        year: 2000 + payload[2] as u16,
    }
}

/// Serial number in the first five bytes, test stand code in the rest.
pub fn decode_serial_number(payload: &[u8]) -> SerialNumber {
    if !has_len(payload, SERIAL_LEN, "serial number") {
        return SerialNumber::default();
    }
    let (serial, rest) = payload.split_at(SERIAL_LEN);
    SerialNumber {
        serial: to_hex(serial).replace(' ', ""),
        test_stand_code: to_hex(rest).replace(' ', ""),
    }
}

/// Seven bytes of supported-function bits.
pub fn decode_wbus_code(payload: &[u8]) -> WbusCode {
    if !has_len(payload, WBUS_CODE_LEN, "W-Bus code") {
        return WbusCode::default();
    }
    let mut raw = [0u8; WBUS_CODE_LEN];
    raw.copy_from_slice(&payload[..WBUS_CODE_LEN]);
    WbusCode {
        raw,
        simple_on_off_control: bit(raw[0], 0x08),
        parking_heating: bit(raw[0], 0x10),
        supplemental_heating: bit(raw[0], 0x20),
        ventilation: bit(raw[0], 0x40),
        boost_mode: bit(raw[0], 0x80),
        external_circulation_pump: bit(raw[1], 0x02),
        combustion_air_fan: bit(raw[1], 0x04),
        glow_plug: bit(raw[1], 0x08),
        fuel_pump: bit(raw[1], 0x10),
        circulation_pump: bit(raw[1], 0x20),
        vehicle_fan_relay: bit(raw[1], 0x40),
        yellow_led: bit(raw[1], 0x80),
        green_led: bit(raw[2], 0x01),
        spark_transmitter: bit(raw[2], 0x02),
        solenoid_valve: bit(raw[2], 0x04),
        auxiliary_drive_indicator: bit(raw[2], 0x08),
        generator_signal: bit(raw[2], 0x10),
        fan_in_rpm: bit(raw[2], 0x20),
        co2_calibration: bit(raw[3], 0x02),
        operation_indicator: bit(raw[3], 0x08),
        power_in_watts: bit(raw[4], 0x10),
        flame_indicator: bit(raw[4], 0x40),
        nozzle_stock_heating: bit(raw[4], 0x80),
        ignition_signal: bit(raw[5], 0x20),
        temperature_thresholds: bit(raw[5], 0x40),
        fuel_prewarming_readable: bit(raw[5], 0x80),
        set_values_available: bit(raw[6], 0x02),
    }
}
