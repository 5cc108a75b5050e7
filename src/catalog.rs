//! Static lookup tables: heater error codes, NAK reasons, command names and
//! operating state names.
//!
//! Lookups never fail. Codes missing from a table get a generic text that
//! still carries the numeric value.

use crate::cmds::*;

/// Description of a stored heater error code, if the code is known.
pub fn error_text(code: u8) -> Option<&'static str> {
    let text = match code {
        0x00 => "no error",
        0x01 => "control unit error",
        0x02 => "no start",
        0x04 => "overvoltage",
        0x05 => "premature flame detection",
        0x08 => "metering pump short circuit",
        0x0B => "circulation pump short circuit",
        0x10 => "coolant changeover valve short circuit",
        0x11 => "wrongly programmed control unit",
        0x13 => "vehicle fan short circuit",
        0x15 => "blower motor block protection",
        0x19 => "glow pin circuit short circuit",
        0x1B => "overheat sensor short circuit",
        0x22 => "reference resistance not reached at start",
        0x2D => "blower circuit fault",
        0x2E => "glow pin circuit fault",
        0x2F => "flame out",
        0x37 => "coolant temperature too high at first commissioning",
        0x38 => "first start attempt failed",
        0x39 => "first start attempt failed, no restart",
        0x3C => "internal control unit error 60",
        0x3D => "internal control unit error 61",
        0x3E => "internal control unit error 62",
        0x3F => "wrong software loaded",
        0x4C => "high voltage component protection",
        0x5A => "W-Bus / LIN-Bus short circuit",
        0x62 => "DP_max timer overflow",
        0x81 => "EOL checksum error",
        0x82 => "no start in test mode",
        0x83 => "flame out (FAZ)",
        0x84 => "undervoltage",
        0x86 => "coolant temperature too high without combustion",
        0x87 => "permanent heater lock",
        0x88 => "metering pump open circuit",
        0x89 => "blower open circuit",
        0x8A => "glow pin or flame sensor open circuit",
        0x8B => "circulation pump open circuit",
        0x90 => "coolant changeover valve open circuit",
        0x92 => "command processing error",
        0x94 => "temperature sensor open circuit",
        0x99 => "glow pin open circuit",
        0x9C => "intelligent undervoltage shutdown",
        0xAA => "sending command to W-Bus failed",
        0xAB => "overheat sensor open circuit",
        _ => return None,
    };
    Some(text)
}

/// Description of a heater error code, falling back to `unknown error, code=N`.
///
/// # Example
/// ```
/// assert_eq!(wbus::catalog::describe_error(0x2F), "flame out");
/// assert_eq!(wbus::catalog::describe_error(0x70), "unknown error, code=112");
/// ```
pub fn describe_error(code: u8) -> String {
    match error_text(code) {
        Some(text) => text.to_owned(),
        None => format!("unknown error, code={}", code),
    }
}

/// Reason byte of a NAK reply.
pub fn describe_nak_reason(reason: u8) -> String {
    let text = match reason {
        0x11 => "command not supported",
        0x22 => "invalid command parameters",
        0x33 => "not possible in current state",
        0x44 => "hardware fault",
        0x55 => "temperature out of range",
        _ => return format!("unknown reason (0x{:02X})", reason),
    };
    text.to_owned()
}

/// Human readable name of a command code.
pub fn command_name(command: u8) -> String {
    let name = match command {
        WBUS_CMD_SHUTDOWN => "Shutdown",
        WBUS_CMD_PARKING_HEAT => "Parking Heat",
        WBUS_CMD_VENTILATION => "Ventilation",
        WBUS_CMD_SUPPLEMENTAL_HEAT => "Supplemental Heat",
        WBUS_CMD_CIRCULATION_PUMP => "Circulation Pump",
        WBUS_CMD_BOOST => "Boost",
        WBUS_CMD_DIAGNOSTIC => "Diagnostic",
        WBUS_CMD_FUEL_CIRCULATION => "Fuel Circulation",
        WBUS_CMD_KEEPALIVE => "Keep-alive",
        WBUS_CMD_TEST_COMPONENT => "Component Test",
        WBUS_CMD_READ_SENSOR => "Read Sensor",
        WBUS_CMD_READ_INFO => "Read Info",
        WBUS_CMD_READ_CONFIG => "Read Config",
        WBUS_CMD_ERRORS => "Errors",
        WBUS_CMD_CO2_CALIBRATION => "CO2 Calibration",
        _ => return format!("Unknown Command (0x{:02X})", command),
    };
    format!("{} (0x{:02X})", name, command)
}

/// Name of an operating state code reported by sensor index 0x07.
pub fn state_name(code: u8) -> Option<&'static str> {
    let name = match code {
        0x00 => "burn out",
        0x01 => "deactivation",
        0x02 => "burn out ADR",
        0x03 => "burn out ramp",
        0x04 => "off state",
        0x05 => "combustion process part load",
        0x06 => "combustion process full load",
        0x07 => "fuel supply",
        0x08 => "combustion air fan start",
        0x09 => "fuel supply interruption",
        0x0A => "diagnostic state",
        0x0B => "fuel pump interruption",
        0x0C => "EMF measurement",
        0x0D => "debounce",
        0x0E => "deactivation",
        0x0F => "flame detector interrogation",
        0x10 => "flame detector cooling",
        0x11 => "flame detector measuring phase",
        0x12 => "flame detector measuring phase ZUE",
        0x13 => "fan start up",
        0x14 => "glow plug ramp",
        0x15 => "heater interlock",
        0x16 => "initialization",
        0x17 => "fuel bubble compensation",
        0x18 => "fan cold start-up",
        0x19 => "cold start enrichment",
        0x1A => "cooling",
        0x1B => "load change PL-FL",
        0x1C => "ventilation",
        0x1D => "load change FL-PL",
        0x1E => "new initialization",
        0x1F => "controlled operation",
        0x20 => "control iteration",
        0x21 => "soft start",
        0x22 => "safety time",
        0x23 => "purge",
        0x24 => "start",
        0x25 => "stabilization",
        0x26 => "start ramp",
        0x27 => "out of power",
        0x28 => "interlock",
        0x29 => "interlock ADR",
        0x2A => "stabilization time",
        0x2B => "change to controlled operation",
        0x2C => "decision state",
        0x2D => "prestart fuel supply",
        0x2E => "glowing",
        0x2F => "glow power recovery",
        0x30 => "delay lowering",
        0x31 => "fan slow start-up",
        0x32 => "additional glowing",
        0x33 => "ignition interruption",
        0x34 => "ignition",
        0x35 => "intermittent glowing",
        0x36 => "application monitoring",
        0x37 => "interlock save to memory",
        0x38 => "heater interlock deactivation",
        0x39 => "output control",
        0x3A => "circulating pump control",
        0x3B => "initialization uP",
        0x3C => "stray light interrogation",
        0x3D => "prestart",
        0x3E => "pre-ignition",
        0x3F => "flame ignition",
        0x40 => "flame stabilization",
        0x41 => "combustion process parking heating",
        0x42 => "combustion process supplemental heating",
        0x43 => "combustion failure parking heating",
        0x44 => "combustion failure supplemental heating",
        0x45 => "heater off after run",
        0x46 => "control after run",
        0x47 => "after run due to failure",
        0x48 => "time-controlled after run due to failure",
        0x49 => "interlock circulation pump",
        0x4A => "control idle after parking heating",
        0x4B => "control idle after supplemental heating",
        0x4C => "control idle period with circulation pump",
        0x4D => "circulation pump without heating function",
        0x4E => "waiting loop overvoltage",
        0x4F => "fault memory update",
        0x50 => "waiting loop",
        0x51 => "component test",
        0x52 => "boost",
        0x53 => "cooling",
        0x54 => "heater interlock permanent",
        0x55 => "fan idle",
        0x56 => "break away",
        0x57 => "temperature interrogation",
        0x58 => "prestart undervoltage",
        0x59 => "accident interrogation",
        0x5A => "after run solenoid valve",
        0x5B => "fault memory update solenoid valve",
        0x5C => "timer-controlled after run solenoid valve",
        0x5D => "startup attempt",
        0x5E => "prestart extension",
        0x5F => "combustion process",
        0x60 => "timer-controlled after run due to undervoltage",
        0x61 => "fault memory update prior switch off",
        0x62 => "ramp full load",
        _ => return None,
    };
    Some(name)
}

/// Operating state name, falling back to `unknown state (0xNN)`.
pub fn describe_state(code: u8) -> String {
    match state_name(code) {
        Some(name) => name.to_owned(),
        None => format!("unknown state (0x{:02X})", code),
    }
}

/// Coarse phase an operating state code belongs to.
pub fn state_phase(code: u8) -> &'static str {
    match code {
        0x04 => "heater off and ready",
        0x05..=0x06 => "combustion active",
        0x07..=0x09 => "fuel supply phase",
        0x0A..=0x0C => "diagnostics and measurement",
        0x10..=0x1F => "system preparation and start",
        0x20..=0x27 => "start process",
        0x28..=0x3F => "control and stabilization",
        0x41..=0x44 => "main combustion",
        0x45..=0x4F => "shutting down",
        0x51..=0x52 => "special modes",
        0x54..=0xFF => "fault or lock state",
        _ => "intermediate state",
    }
}
