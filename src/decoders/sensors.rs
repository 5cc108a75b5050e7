use super::{be_u16, bit, byte, has_len, temperature, voltage};
use crate::types::*;

/// Operational measurements: temperature, voltage, flame, power, flame resistance.
///
/// Layout: `[temp][volt hi][volt lo][flame][power hi][power lo][res hi][res lo]`.
pub fn decode_operational(payload: &[u8]) -> OperationalMeasurements {
    if !has_len(payload, 8, "operational") {
        return OperationalMeasurements::default();
    }
    OperationalMeasurements {
        temperature: temperature(payload[0]),
        voltage: voltage(payload, 1),
        flame_detected: payload[3] == 0x01,
        heating_power: be_u16(payload, 4),
        flame_resistance: be_u16(payload, 6),
    }
}

pub fn decode_fuel_settings(payload: &[u8]) -> FuelSettings {
    if !has_len(payload, 3, "fuel settings") {
        return FuelSettings::default();
    }
    FuelSettings {
        fuel_type: payload[0],
        fuel_type_name: fuel_type_name(payload[0]).to_owned(),
        max_heating_time: payload[1],
        ventilation_factor: payload[2],
    }
}

fn fuel_type_name(fuel_type: u8) -> &'static str {
    match fuel_type {
        0x0D => "diesel",
        0x1D => "diesel (alternative code)",
        0x2D => "petrol",
        0x03 => "gas",
        0x05 => "biofuel",
        0x01..=0x0F => "diesel fuels",
        0x10..=0x2F => "petrol fuels",
        0x30..=0x4F => "gas fuels",
        _ => "unknown",
    }
}

pub fn decode_on_off_flags(payload: &[u8]) -> OnOffFlags {
    if !has_len(payload, 1, "on/off flags") {
        return OnOffFlags::default();
    }
    let flags = payload[0];
    OnOffFlags {
        combustion_air_fan: bit(flags, 0x01),
        glow_plug: bit(flags, 0x02),
        fuel_pump: bit(flags, 0x04),
        circulation_pump: bit(flags, 0x08),
        vehicle_fan_relay: bit(flags, 0x10),
        nozzle_stock_heating: bit(flags, 0x20),
        flame_indicator: bit(flags, 0x40),
    }
}

pub fn decode_status_flags(payload: &[u8]) -> StatusFlags {
    if !has_len(payload, 5, "status flags") {
        return StatusFlags::default();
    }
    let mut flags = StatusFlags {
        main_switch: bit(payload[0], 0x01),
        supplemental_heat_request: bit(payload[0], 0x10),
        parking_heat_request: bit(payload[0], 0x20),
        ventilation_request: bit(payload[0], 0x40),
        summer_mode: bit(payload[1], 0x01),
        external_control: bit(payload[1], 0x02),
        generator_signal: bit(payload[2], 0x10),
        boost_mode: bit(payload[3], 0x10),
        auxiliary_drive: bit(payload[3], 0x01),
        ignition_signal: bit(payload[4], 0x01),
        operation_mode: OperationMode::Standby,
    };
    flags.operation_mode = if flags.parking_heat_request {
        OperationMode::ParkingHeat
    } else if flags.supplemental_heat_request {
        OperationMode::SupplementalHeat
    } else if flags.ventilation_request {
        OperationMode::Ventilation
    } else if flags.boost_mode {
        OperationMode::Boost
    } else {
        OperationMode::Standby
    };
    flags
}

/// Actuator levels; every raw byte is in half percent (or half Hz) steps.
pub fn decode_subsystems(payload: &[u8]) -> SubsystemsStatus {
    if !has_len(payload, 5, "subsystems") {
        return SubsystemsStatus::default();
    }
    SubsystemsStatus {
        glow_plug_power: payload[0] as f32 / 2.0,
        fuel_pump_frequency: payload[1] as f32 / 2.0,
        combustion_fan_power: payload[2] as f32 / 2.0,
        unknown: payload[3],
        circulation_pump_power: payload[4] as f32 / 2.0,
    }
}

pub fn decode_operating_times(payload: &[u8]) -> OperatingTimes {
    if !has_len(payload, 8, "operating times") {
        return OperatingTimes::default();
    }
    OperatingTimes {
        working_hours: be_u16(payload, 0),
        working_minutes: payload[2],
        operating_hours: be_u16(payload, 3),
        operating_minutes: payload[5],
        start_counter: be_u16(payload, 6),
    }
}

/// Eight `(hours, minutes)` groups: supplemental heat bands first, then parking heat.
pub fn decode_burning_duration(payload: &[u8]) -> BurningDuration {
    if !has_len(payload, 24, "burning duration") {
        return BurningDuration::default();
    }
    let at = |group: usize| Duration {
        hours: be_u16(payload, group * 3),
        minutes: byte(payload, group * 3 + 2),
    };
    BurningDuration {
        supplemental_low: at(0),
        supplemental_medium: at(1),
        supplemental_high: at(2),
        supplemental_boost: at(3),
        parking_low: at(4),
        parking_medium: at(5),
        parking_high: at(6),
        parking_boost: at(7),
    }
}

pub fn decode_start_counters(payload: &[u8]) -> StartCounters {
    if !has_len(payload, 6, "start counters") {
        return StartCounters::default();
    }
    StartCounters {
        supplemental_starts: be_u16(payload, 0),
        parking_starts: be_u16(payload, 2),
        total_starts: be_u16(payload, 4),
    }
}

pub fn decode_fuel_prewarming(payload: &[u8]) -> FuelPrewarming {
    if !has_len(payload, 4, "fuel prewarming") {
        return FuelPrewarming::default();
    }
    let power = be_u16(payload, 2);
    FuelPrewarming {
        resistance: be_u16(payload, 0),
        power,
        active: power > 0,
    }
}
