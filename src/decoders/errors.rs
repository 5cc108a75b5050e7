use super::{be_u16, bit, has_len, temperature, voltage};
use crate::catalog;
use crate::types::{ErrorCollection, ErrorDetails, ErrorEntry, NakReply};
use log::warn;

/// Stored errors: `[count]` followed by `count` pairs of `(code, counter)`.
///
/// A count that promises more pairs than the payload holds yields an empty list.
pub fn decode_error_list(payload: &[u8]) -> ErrorCollection {
    let count = match payload.first() {
        Some(count) => *count as usize,
        None => {
            warn!("error list payload is empty");
            return ErrorCollection::default();
        }
    };
    if payload.len() < 1 + count * 2 {
        warn!(
            "error list announces {} entries but holds {} bytes",
            count,
            payload.len()
        );
        return ErrorCollection::default();
    }
    let errors = payload[1..1 + count * 2]
        .chunks_exact(2)
        .map(|pair| ErrorEntry {
            code: pair[0],
            description: catalog::describe_error(pair[0]),
            counter: pair[1],
        })
        .collect();
    ErrorCollection { errors }
}

/// Freeze frame of one error.
///
/// Layout: `[code][status][counter][state code][state number][temp]`
/// `[volt hi][volt lo][hours hi][hours lo][minutes]`. The counter on the wire
/// is zero based.
pub fn decode_error_details(payload: &[u8]) -> ErrorDetails {
    if !has_len(payload, 11, "error details") {
        return ErrorDetails::default();
    }
    let status = payload[1];
    ErrorDetails {
        code: payload[0],
        description: catalog::describe_error(payload[0]),
        status_flags: status,
        stored: bit(status, 0x01),
        active: bit(status, 0x02),
        counter: payload[2].wrapping_add(1),
        state_code: payload[3],
        state_number: payload[4],
        temperature: temperature(payload[5]),
        voltage: voltage(payload, 6),
        operating_hours: be_u16(payload, 8),
        operating_minutes: payload[10],
    }
}

/// NAK payload `[failed command][reason]`.
pub fn decode_nak(payload: &[u8]) -> NakReply {
    if !has_len(payload, 2, "NAK") {
        return NakReply::default();
    }
    NakReply {
        failed_command: payload[0],
        command_name: catalog::command_name(payload[0]),
        reason: payload[1],
        reason_description: catalog::describe_nak_reason(payload[1]),
    }
}
