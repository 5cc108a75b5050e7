use super::{bit, has_len};
use crate::catalog;
use crate::types::{DeviceStateFlags, OperatingState};

/// Operating state: `[state code][state number][device flags]`.
pub fn decode_operating_state(payload: &[u8]) -> OperatingState {
    if !has_len(payload, 3, "operating state") {
        return OperatingState::default();
    }
    let code = payload[0];
    let flags = payload[2];
    OperatingState {
        state_code: code,
        state_number: payload[1],
        device_flags: DeviceStateFlags {
            start: bit(flags, 0x01),
            overheat: bit(flags, 0x02),
            safety: bit(flags, 0x04),
            running: bit(flags, 0x08),
            raw: flags,
        },
        state_name: catalog::describe_state(code),
        state_description: catalog::state_phase(code).to_owned(),
    }
}
