//! Protocol-typed input literals.

use testament_core::{FieldElement, Result, TestamentError};

/// `<n>field`
pub fn field(value: &FieldElement) -> String {
    value.to_string()
}

/// `<n>u16`
pub fn u16_literal(value: u16) -> String {
    format!("{value}u16")
}

/// `<n>u32`
pub fn u32_literal(value: u32) -> String {
    format!("{value}u32")
}

/// `<n>u64`
pub fn u64_literal(value: u64) -> String {
    format!("{value}u64")
}

/// Check an account address against the configured prefix.
///
/// The remainder must be non-empty lowercase ASCII alphanumerics.
pub fn address(value: &str, prefix: &str) -> Result<String> {
    let valid = value.strip_prefix(prefix).is_some_and(|rest| {
        !rest.is_empty()
            && rest
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
    });
    if !valid {
        return Err(TestamentError::invalid_input(format!(
            "address {value:?} is not a {prefix} address"
        )));
    }
    Ok(value.to_string())
}

const INTEGER_SUFFIXES: [&str; 5] = ["u128", "u64", "u32", "u16", "u8"];

/// Parse an unsigned integer literal read from a mapping, e.g. `5000u16`.
///
/// A bare decimal is accepted. Visibility suffixes (`.public`, `.private`)
/// are ignored.
pub fn parse_unsigned_literal(literal: &str) -> Result<u64> {
    let trimmed = literal.trim();
    let trimmed = trimmed
        .split_once('.')
        .map_or(trimmed, |(value, _visibility)| value);
    let digits = INTEGER_SUFFIXES
        .iter()
        .find_map(|suffix| trimmed.strip_suffix(suffix))
        .unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TestamentError::invalid_input(format!(
            "mapping value {literal:?} is not an unsigned integer"
        )));
    }
    digits.parse().map_err(|_| {
        TestamentError::invalid_input(format!("mapping value {literal:?} is out of range"))
    })
}
