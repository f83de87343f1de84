//! Unit normalisation for extracted values

use crate::error::ParseError;

/// Multiplier for a `K`/`M`/`B` suffix, case-insensitive; anything else is 1
pub fn suffix_multiplier(suffix: &str) -> f64 {
    match suffix.trim() {
        s if s.eq_ignore_ascii_case("k") => 1_000.0,
        s if s.eq_ignore_ascii_case("m") => 1_000_000.0,
        s if s.eq_ignore_ascii_case("b") => 1_000_000_000.0,
        _ => 1.0,
    }
}

/// Parse a decimal number, ignoring thousands separators
pub fn parse_number(field: &'static str, raw: &str) -> Result<f64, ParseError> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::InvalidNumber {
            field,
            raw: raw.to_string(),
        })
}

/// Parse a money amount such as `136.8` + `K`
pub fn parse_money(field: &'static str, raw: &str, suffix: &str) -> Result<f64, ParseError> {
    let value = parse_number(field, raw)? * suffix_multiplier(suffix);
    if !value.is_finite() {
        return Err(ParseError::InvalidNumber {
            field,
            raw: format!("{}{}", raw, suffix),
        });
    }
    Ok(value)
}

/// Parse a non-negative integer count
pub fn parse_count(field: &'static str, raw: &str) -> Result<i64, ParseError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidNumber {
            field,
            raw: raw.to_string(),
        })
}

/// `H*60 + M + S/60`, computed in f64
pub fn duration_minutes(hours: i64, minutes: i64, seconds: i64) -> f64 {
    hours as f64 * 60.0 + minutes as f64 + seconds as f64 / 60.0
}
