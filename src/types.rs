//! Decoded heater records.
//!
//! Every record derives `Default`; a payload too short to decode yields the
//! default (all zero, empty) value.

/// Live measurements (sensor 0x05).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationalMeasurements {
    /// Coolant/heat exchanger temperature in °C.
    pub temperature: f32,
    /// Supply voltage in volts.
    pub voltage: f32,
    pub flame_detected: bool,
    /// Heating power in watts.
    pub heating_power: u16,
    /// Flame detector resistance in milliohms.
    pub flame_resistance: u16,
}

/// Fuel parameters (sensor 0x04).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuelSettings {
    pub fuel_type: u8,
    pub fuel_type_name: String,
    /// Maximum heating time in minutes.
    pub max_heating_time: u8,
    pub ventilation_factor: u8,
}

/// Which actuators are currently switched on (sensor 0x03).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OnOffFlags {
    pub combustion_air_fan: bool,
    pub glow_plug: bool,
    pub fuel_pump: bool,
    pub circulation_pump: bool,
    pub vehicle_fan_relay: bool,
    pub nozzle_stock_heating: bool,
    pub flame_indicator: bool,
}

/// What the heater is doing, derived from the request bits of [`StatusFlags`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OperationMode {
    #[default]
    Standby,
    ParkingHeat,
    SupplementalHeat,
    Ventilation,
    Boost,
}

/// Request and input signals (sensor 0x02).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFlags {
    pub main_switch: bool,
    pub supplemental_heat_request: bool,
    pub parking_heat_request: bool,
    pub ventilation_request: bool,
    pub summer_mode: bool,
    pub external_control: bool,
    /// Alternator D+ signal.
    pub generator_signal: bool,
    pub boost_mode: bool,
    pub auxiliary_drive: bool,
    /// Ignition (T15).
    pub ignition_signal: bool,
    pub operation_mode: OperationMode,
}

/// Device state flag bits of [`OperatingState`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStateFlags {
    /// STFL, start in progress.
    pub start: bool,
    /// UEHFL, overheat detected.
    pub overheat: bool,
    /// SAFL, safety chain active.
    pub safety: bool,
    /// RZFL, heater running.
    pub running: bool,
    /// The full flag byte, including bits without a known meaning.
    pub raw: u8,
}

/// Internal state machine position of the heater (sensor 0x07).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatingState {
    pub state_code: u8,
    pub state_number: u8,
    pub device_flags: DeviceStateFlags,
    pub state_name: String,
    pub state_description: String,
}

/// Actuator drive levels (sensor 0x0F).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubsystemsStatus {
    pub glow_plug_power: f32,
    pub fuel_pump_frequency: f32,
    pub combustion_fan_power: f32,
    pub unknown: u8,
    pub circulation_pump_power: f32,
}

/// Hour and operation counters (sensor 0x06).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperatingTimes {
    pub working_hours: u16,
    pub working_minutes: u8,
    pub operating_hours: u16,
    pub operating_minutes: u8,
    pub start_counter: u16,
}

/// Hours and minutes spent in one power band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Duration {
    pub hours: u16,
    pub minutes: u8,
}

/// Burning time per mode and power band (sensor 0x0A).
///
/// Bands are 0-33 %, 34-66 %, 67-100 % and above 100 %.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BurningDuration {
    pub supplemental_low: Duration,
    pub supplemental_medium: Duration,
    pub supplemental_high: Duration,
    pub supplemental_boost: Duration,
    pub parking_low: Duration,
    pub parking_medium: Duration,
    pub parking_high: Duration,
    pub parking_boost: Duration,
}

/// Start counters (sensor 0x0C).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartCounters {
    pub supplemental_starts: u16,
    pub parking_starts: u16,
    pub total_starts: u16,
}

/// Fuel preheater state (sensor 0x13).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FuelPrewarming {
    /// Milliohms.
    pub resistance: u16,
    /// Watts.
    pub power: u16,
    pub active: bool,
}

/// One stored error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorEntry {
    pub code: u8,
    pub description: String,
    pub counter: u8,
}

/// Stored error list (errors 0x01), in the order reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorCollection {
    pub errors: Vec<ErrorEntry>,
}

impl ErrorCollection {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }
}

/// Freeze frame recorded with an error (errors 0x02).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorDetails {
    pub code: u8,
    pub description: String,
    pub status_flags: u8,
    pub stored: bool,
    pub active: bool,
    pub counter: u8,
    pub state_code: u8,
    pub state_number: u8,
    pub temperature: f32,
    pub voltage: f32,
    pub operating_hours: u16,
    pub operating_minutes: u8,
}

/// Negative acknowledgement payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NakReply {
    pub failed_command: u8,
    pub command_name: String,
    pub reason: u8,
    pub reason_description: String,
}

/// W-Bus protocol version (info 0x0A).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WbusVersion {
    pub major: u8,
    pub minor: u8,
}

impl std::fmt::Display for WbusVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Manufacture date of the control unit or heater (info 0x04/0x05).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManufactureDate {
    pub day: u8,
    pub month: u8,
    pub year: u16,
}

/// Serial number (info 0x09).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerialNumber {
    /// First five bytes as upper-case hex.
    pub serial: String,
    /// Remaining bytes as upper-case hex.
    pub test_stand_code: String,
}

/// Supported functions advertised by the heater (info 0x0C).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WbusCode {
    pub raw: [u8; 7],
    pub simple_on_off_control: bool,
    pub parking_heating: bool,
    pub supplemental_heating: bool,
    pub ventilation: bool,
    pub boost_mode: bool,
    pub external_circulation_pump: bool,
    pub combustion_air_fan: bool,
    pub glow_plug: bool,
    pub fuel_pump: bool,
    pub circulation_pump: bool,
    pub vehicle_fan_relay: bool,
    pub yellow_led: bool,
    pub green_led: bool,
    pub spark_transmitter: bool,
    pub solenoid_valve: bool,
    pub auxiliary_drive_indicator: bool,
    pub generator_signal: bool,
    pub fan_in_rpm: bool,
    pub co2_calibration: bool,
    pub operation_indicator: bool,
    pub power_in_watts: bool,
    pub flame_indicator: bool,
    pub nozzle_stock_heating: bool,
    pub ignition_signal: bool,
    pub temperature_thresholds: bool,
    pub fuel_prewarming_readable: bool,
    pub set_values_available: bool,
}
