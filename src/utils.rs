use crate::base::{Error, Result};
use log::trace;
use std::fmt::Write;

/// Parses a command written as whitespace separated hex bytes, e.g. `"F4 03 50 05 A2"`.
///
/// Case and the amount of whitespace do not matter. Any token that is not a
/// one or two digit hex number is rejected.
///
/// # Example
/// ```
/// let bytes = wbus::utils::parse_hex("f4 02 10 e6").unwrap();
/// assert_eq!(bytes, [0xF4, 0x02, 0x10, 0xE6]);
/// ```
pub fn parse_hex(text: &str) -> Result<Vec<u8>> {
    trace!("parse_hex called with '{}'", text);
    text.split_whitespace()
        .map(|token| {
            if token.len() > 2 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(Error::InvalidHex {
                    token: token.to_owned(),
                });
            }
            u8::from_str_radix(token, 16).map_err(|_| Error::InvalidHex {
                token: token.to_owned(),
            })
        })
        .collect()
}

/// Formats bytes as upper-case, space separated hex.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        // writing into a String cannot fail
        let _ = write!(out, "{:02X}", b);
    }
    out
}

/// Extracts printable text from a fixed size field.
///
/// Stops at the first zero byte, drops anything outside printable ASCII and
/// trims surrounding whitespace.
pub fn printable_text(bytes: &[u8]) -> String {
    let text: String = bytes
        .iter()
        .take_while(|b| **b != 0)
        .filter(|b| (32..=126).contains(*b))
        .map(|b| *b as char)
        .collect();
    text.trim().to_owned()
}
