use crate::base::Message;

// Control commands

/// Stop any running heating or ventilation mode.
pub const WBUS_CMD_SHUTDOWN: u8 = 0x10;

/// Start parking heating. Payload: runtime in minutes.
pub const WBUS_CMD_PARKING_HEAT: u8 = 0x21;

/// Start ventilation. Payload: runtime in minutes.
pub const WBUS_CMD_VENTILATION: u8 = 0x22;

/// Start supplemental heating. Payload: runtime in minutes.
pub const WBUS_CMD_SUPPLEMENTAL_HEAT: u8 = 0x23;

/// Switch the circulation pump. Payload: 0x01 on, 0x00 off.
pub const WBUS_CMD_CIRCULATION_PUMP: u8 = 0x24;

/// Start boost mode. Payload: runtime in minutes.
pub const WBUS_CMD_BOOST: u8 = 0x25;

/// Opens a diagnostic session; its reply confirms the connection.
pub const WBUS_CMD_DIAGNOSTIC: u8 = 0x38;

/// Fuel priming. Index 0x03, payload `[0x00, (seconds - 1) / 2]`.
pub const WBUS_CMD_FUEL_CIRCULATION: u8 = 0x42;

/// Keeps a running mode alive. Payload: `[mode command, 0x00]`.
pub const WBUS_CMD_KEEPALIVE: u8 = 0x44;

/// Drives a single component. Payload: `[component, seconds, magnitude MSB, magnitude LSB]`.
pub const WBUS_CMD_TEST_COMPONENT: u8 = 0x45;

// Read commands, all followed by an index byte

pub const WBUS_CMD_READ_SENSOR: u8 = 0x50;
pub const WBUS_CMD_READ_INFO: u8 = 0x51;
pub const WBUS_CMD_READ_CONFIG: u8 = 0x53;
pub const WBUS_CMD_ERRORS: u8 = 0x56;
pub const WBUS_CMD_CO2_CALIBRATION: u8 = 0x57;

// Sensor indices (0x50)

pub const WBUS_SENSOR_STATUS_FLAGS: u8 = 0x02;
pub const WBUS_SENSOR_ON_OFF_FLAGS: u8 = 0x03;
pub const WBUS_SENSOR_FUEL_SETTINGS: u8 = 0x04;
pub const WBUS_SENSOR_OPERATIONAL: u8 = 0x05;
pub const WBUS_SENSOR_OPERATING_TIMES: u8 = 0x06;
pub const WBUS_SENSOR_OPERATING_STATE: u8 = 0x07;
pub const WBUS_SENSOR_BURNING_DURATION: u8 = 0x0A;
pub const WBUS_SENSOR_WORKING_DURATION: u8 = 0x0B;
pub const WBUS_SENSOR_START_COUNTERS: u8 = 0x0C;
pub const WBUS_SENSOR_SUBSYSTEMS: u8 = 0x0F;
pub const WBUS_SENSOR_FUEL_PREWARMING: u8 = 0x13;

// Info indices (0x51)

pub const WBUS_INFO_DEVICE_ID: u8 = 0x01;
pub const WBUS_INFO_HARDWARE_VERSION: u8 = 0x02;
pub const WBUS_INFO_DATASET_ID: u8 = 0x03;
pub const WBUS_INFO_CTRL_MFG_DATE: u8 = 0x04;
pub const WBUS_INFO_HEATER_MFG_DATE: u8 = 0x05;
pub const WBUS_INFO_CUSTOMER_ID: u8 = 0x07;
pub const WBUS_INFO_SERIAL_NUMBER: u8 = 0x09;
pub const WBUS_INFO_WBUS_VERSION: u8 = 0x0A;
pub const WBUS_INFO_DEVICE_NAME: u8 = 0x0B;
pub const WBUS_INFO_WBUS_CODE: u8 = 0x0C;

// Error indices (0x56)

pub const WBUS_ERRORS_READ_LIST: u8 = 0x01;
pub const WBUS_ERRORS_READ_DETAILS: u8 = 0x02;
pub const WBUS_ERRORS_CLEAR: u8 = 0x03;

// Components for WBUS_CMD_TEST_COMPONENT

pub const WBUS_TEST_COMBUSTION_FAN: u8 = 0x01;
pub const WBUS_TEST_FUEL_PUMP: u8 = 0x02;
pub const WBUS_TEST_GLOW_PLUG: u8 = 0x03;
pub const WBUS_TEST_CIRCULATION_PUMP: u8 = 0x04;
pub const WBUS_TEST_VEHICLE_FAN: u8 = 0x05;
pub const WBUS_TEST_SOLENOID_VALVE: u8 = 0x09;
pub const WBUS_TEST_FUEL_PREHEATING: u8 = 0x0F;

const WBUS_FUEL_CIRCULATION_INDEX: u8 = 0x03;
const WBUS_MAX_RUNTIME_MINUTES: u8 = 59;
const WBUS_MAX_FUEL_PUMP_HZ: u8 = 50;

/// `true` for commands whose request and reply carry an index byte.
pub fn has_index(command: u8) -> bool {
    matches!(
        command,
        WBUS_CMD_READ_SENSOR
            | WBUS_CMD_READ_INFO
            | WBUS_CMD_READ_CONFIG
            | WBUS_CMD_ERRORS
            | WBUS_CMD_CO2_CALIBRATION
    )
}

/// Heating and ventilation modes the heater can run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaterMode {
    ParkingHeat,
    Ventilation,
    SupplementalHeat,
    CirculationPump,
    Boost,
}

impl HeaterMode {
    /// The command that starts this mode; also the keep-alive mode byte.
    pub fn command(self) -> u8 {
        match self {
            HeaterMode::ParkingHeat => WBUS_CMD_PARKING_HEAT,
            HeaterMode::Ventilation => WBUS_CMD_VENTILATION,
            HeaterMode::SupplementalHeat => WBUS_CMD_SUPPLEMENTAL_HEAT,
            HeaterMode::CirculationPump => WBUS_CMD_CIRCULATION_PUMP,
            HeaterMode::Boost => WBUS_CMD_BOOST,
        }
    }
}

pub fn shutdown() -> Message {
    Message::new(WBUS_CMD_SHUTDOWN)
}

pub fn diagnostic() -> Message {
    Message::new(WBUS_CMD_DIAGNOSTIC)
}

/// Start command for a timed mode; minutes are clamped to 1..=59.
///
/// The circulation pump has no runtime, `start(CirculationPump, _)` switches it on.
pub fn start(mode: HeaterMode, minutes: u8) -> Message {
    match mode {
        HeaterMode::CirculationPump => circulation_pump(true),
        _ => Message::with_data(
            mode.command(),
            &[minutes.clamp(1, WBUS_MAX_RUNTIME_MINUTES)],
        ),
    }
}

pub fn parking_heat(minutes: u8) -> Message {
    start(HeaterMode::ParkingHeat, minutes)
}

pub fn ventilation(minutes: u8) -> Message {
    start(HeaterMode::Ventilation, minutes)
}

pub fn supplemental_heat(minutes: u8) -> Message {
    start(HeaterMode::SupplementalHeat, minutes)
}

pub fn boost(minutes: u8) -> Message {
    start(HeaterMode::Boost, minutes)
}

pub fn circulation_pump(enable: bool) -> Message {
    Message::with_data(WBUS_CMD_CIRCULATION_PUMP, &[enable as u8])
}

pub fn keep_alive(mode: HeaterMode) -> Message {
    Message::with_data(WBUS_CMD_KEEPALIVE, &[mode.command(), 0x00])
}

/// Fuel priming for roughly `seconds`; the heater only runs odd durations of at least 3 s.
pub fn fuel_circulation(seconds: u8) -> Message {
    let mut seconds = seconds.max(3);
    if seconds % 2 == 0 {
        seconds -= 1;
    }
    Message::with_index(
        WBUS_CMD_FUEL_CIRCULATION,
        WBUS_FUEL_CIRCULATION_INDEX,
        &[0x00, (seconds - 1) / 2],
    )
}

pub fn read_sensor(index: u8) -> Message {
    Message::with_index(WBUS_CMD_READ_SENSOR, index, &[])
}

pub fn read_info(index: u8) -> Message {
    Message::with_index(WBUS_CMD_READ_INFO, index, &[])
}

pub fn read_errors() -> Message {
    Message::with_index(WBUS_CMD_ERRORS, WBUS_ERRORS_READ_LIST, &[])
}

pub fn read_error_details(code: u8) -> Message {
    Message::with_index(WBUS_CMD_ERRORS, WBUS_ERRORS_READ_DETAILS, &[code])
}

pub fn clear_errors() -> Message {
    Message::with_index(WBUS_CMD_ERRORS, WBUS_ERRORS_CLEAR, &[])
}

/// Raw component test command.
pub fn test_component(component: u8, seconds: u8, magnitude: u16) -> Message {
    let [hi, lo] = magnitude.to_be_bytes();
    Message::with_data(WBUS_CMD_TEST_COMPONENT, &[component, seconds, hi, lo])
}

/// Component test with the magnitude derived from a percentage or frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentTest {
    CombustionFan { percent: u8 },
    FuelPump { hz: u8 },
    GlowPlug { percent: u8 },
    CirculationPump { percent: u8 },
    VehicleFan,
    SolenoidValve,
    FuelPreheating { percent: u8 },
}

impl ComponentTest {
    pub fn component(&self) -> u8 {
        match self {
            ComponentTest::CombustionFan { .. } => WBUS_TEST_COMBUSTION_FAN,
            ComponentTest::FuelPump { .. } => WBUS_TEST_FUEL_PUMP,
            ComponentTest::GlowPlug { .. } => WBUS_TEST_GLOW_PLUG,
            ComponentTest::CirculationPump { .. } => WBUS_TEST_CIRCULATION_PUMP,
            ComponentTest::VehicleFan => WBUS_TEST_VEHICLE_FAN,
            ComponentTest::SolenoidValve => WBUS_TEST_SOLENOID_VALVE,
            ComponentTest::FuelPreheating { .. } => WBUS_TEST_FUEL_PREHEATING,
        }
    }

    /// Magnitude field sent on the wire. Percentages are clamped to 0..=100,
    /// the fuel pump frequency to 0..=50 Hz.
    pub fn magnitude(&self) -> u16 {
        match *self {
            ComponentTest::CombustionFan { percent } | ComponentTest::FuelPreheating { percent } => {
                // 0.5 % per unit over 0..=510, rounded
                (percent.min(100) as u16 * 510 + 50) / 100
            }
            ComponentTest::FuelPump { hz } => hz.min(WBUS_MAX_FUEL_PUMP_HZ) as u16,
            ComponentTest::GlowPlug { percent } => percent.min(100) as u16 * 200 / 100,
            ComponentTest::CirculationPump { percent } => percent.min(100) as u16 * 2,
            ComponentTest::VehicleFan | ComponentTest::SolenoidValve => 0x0001,
        }
    }

    pub fn to_message(&self, seconds: u8) -> Message {
        test_component(self.component(), seconds, self.magnitude())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode;
    use crate::utils::parse_hex;

    fn wire(msg: &Message) -> Vec<u8> {
        encode(msg.cmd, msg.index, &msg.data).unwrap()
    }

    fn assert_wire(msg: Message, expected: &str) {
        assert_eq!(wire(&msg), parse_hex(expected).unwrap(), "{}", expected);
    }

    #[test]
    fn control_commands() {
        assert_wire(shutdown(), "F4 02 10 E6");
        assert_wire(diagnostic(), "F4 02 38 CE");
        assert_wire(parking_heat(59), "F4 03 21 3B ED");
        assert_wire(parking_heat(30), "F4 03 21 1E C8");
        assert_wire(ventilation(59), "F4 03 22 3B EE");
        assert_wire(ventilation(30), "F4 03 22 1E CB");
        assert_wire(supplemental_heat(59), "F4 03 23 3B EF");
        assert_wire(boost(59), "F4 03 25 3B E9");
        assert_wire(boost(30), "F4 03 25 1E CC");
        assert_wire(circulation_pump(true), "F4 03 24 01 D2");
        assert_wire(circulation_pump(false), "F4 03 24 00 D3");
    }

    #[test]
    fn runtime_is_clamped() {
        assert_eq!(parking_heat(0).data, [1]);
        assert_eq!(parking_heat(120).data, [59]);
        assert_eq!(start(HeaterMode::CirculationPump, 10), circulation_pump(true));
    }

    #[test]
    fn keep_alives() {
        assert_wire(keep_alive(HeaterMode::ParkingHeat), "F4 04 44 21 00 95");
        assert_wire(keep_alive(HeaterMode::Ventilation), "F4 04 44 22 00 96");
        assert_wire(keep_alive(HeaterMode::SupplementalHeat), "F4 04 44 23 00 97");
        assert_wire(keep_alive(HeaterMode::CirculationPump), "F4 04 44 24 00 90");
        assert_wire(keep_alive(HeaterMode::Boost), "F4 04 44 25 00 91");
    }

    #[test]
    fn read_commands() {
        assert_wire(read_sensor(WBUS_SENSOR_STATUS_FLAGS), "F4 03 50 02 A5");
        assert_wire(read_sensor(WBUS_SENSOR_ON_OFF_FLAGS), "F4 03 50 03 A4");
        assert_wire(read_sensor(WBUS_SENSOR_FUEL_SETTINGS), "F4 03 50 04 A3");
        assert_wire(read_sensor(WBUS_SENSOR_OPERATIONAL), "F4 03 50 05 A2");
        assert_wire(read_sensor(WBUS_SENSOR_OPERATING_TIMES), "F4 03 50 06 A1");
        assert_wire(read_sensor(WBUS_SENSOR_OPERATING_STATE), "F4 03 50 07 A0");
        assert_wire(read_sensor(WBUS_SENSOR_BURNING_DURATION), "F4 03 50 0A AD");
        assert_wire(read_sensor(WBUS_SENSOR_START_COUNTERS), "F4 03 50 0C AB");
        assert_wire(read_sensor(WBUS_SENSOR_SUBSYSTEMS), "F4 03 50 0F A8");
        assert_wire(read_sensor(WBUS_SENSOR_FUEL_PREWARMING), "F4 03 50 13 B4");
        assert_wire(read_info(WBUS_INFO_DEVICE_ID), "F4 03 51 01 A7");
        assert_wire(read_info(WBUS_INFO_CTRL_MFG_DATE), "F4 03 51 04 A2");
        assert_wire(read_info(WBUS_INFO_HEATER_MFG_DATE), "F4 03 51 05 A3");
        assert_wire(read_info(WBUS_INFO_CUSTOMER_ID), "F4 03 51 07 A1");
        assert_wire(read_info(WBUS_INFO_SERIAL_NUMBER), "F4 03 51 09 AF");
        assert_wire(read_info(WBUS_INFO_WBUS_VERSION), "F4 03 51 0A AC");
        assert_wire(read_info(WBUS_INFO_DEVICE_NAME), "F4 03 51 0B AD");
        assert_wire(read_info(WBUS_INFO_WBUS_CODE), "F4 03 51 0C AA");
        assert_wire(read_errors(), "F4 03 56 01 A0");
        assert_wire(clear_errors(), "F4 03 56 03 A2");
        assert_eq!(read_error_details(0x2F).data, [0x2F]);
    }

    #[test]
    fn component_tests() {
        assert_wire(
            ComponentTest::GlowPlug { percent: 75 }.to_message(5),
            "F4 06 45 03 05 00 96 27",
        );
        assert_wire(
            ComponentTest::CirculationPump { percent: 100 }.to_message(15),
            "F4 06 45 04 0F 00 C8 74",
        );
        assert_wire(ComponentTest::VehicleFan.to_message(8), "F4 06 45 05 08 00 01 BB");
        assert_wire(ComponentTest::SolenoidValve.to_message(12), "F4 06 45 09 0C 00 01 B3");
        assert_eq!(ComponentTest::CombustionFan { percent: 50 }.magnitude(), 255);
        assert_eq!(ComponentTest::CombustionFan { percent: 33 }.magnitude(), 168);
        assert_eq!(ComponentTest::FuelPreheating { percent: 150 }.magnitude(), 510);
        assert_eq!(ComponentTest::FuelPump { hz: 80 }.magnitude(), 50);
    }

    #[test]
    fn fuel_circulation_rounds_to_odd_seconds() {
        assert_eq!(fuel_circulation(0).data, [0x00, 1]);
        assert_eq!(fuel_circulation(10).data, [0x00, 4]);
        assert_eq!(fuel_circulation(11).data, [0x00, 5]);
        assert_eq!(fuel_circulation(11).index, Some(0x03));
    }
}
