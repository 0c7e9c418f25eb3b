//! Kubernetes resource quantity parsing.
//!
//! CPU is normalised to milli-cores, memory to mebibytes. Only the suffixes
//! that show up in container specs are accepted; exponent notation is not.

use thiserror::Error;

/// Errors raised while parsing a resource quantity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,

    #[error("invalid number in quantity: {0}")]
    InvalidNumber(String),

    #[error("unsupported suffix in quantity: {0}")]
    UnsupportedSuffix(String),

    #[error("quantity out of range: {0}")]
    OutOfRange(String),
}

const MIB: f64 = 1024.0 * 1024.0;

/// Parse a CPU quantity (`"500m"`, `"1"`, `"0.25"`, `"250000n"`) into
/// milli-cores, rounded to the nearest milli-core.
pub fn parse_cpu_millis(s: &str) -> Result<u64, QuantityError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(QuantityError::Empty);
    }

    let (number, scale) = if let Some(n) = s.strip_suffix('m') {
        (n, 1.0)
    } else if let Some(n) = s.strip_suffix('u') {
        (n, 1e-3)
    } else if let Some(n) = s.strip_suffix('n') {
        (n, 1e-6)
    } else {
        (s, 1000.0)
    };

    let millis = (parse_number(number, s)? * scale).round();
    if millis >= u64::MAX as f64 {
        return Err(QuantityError::OutOfRange(s.to_string()));
    }
    Ok(millis as u64)
}

/// Parse a memory quantity (`"512Mi"`, `"1Gi"`, `"128M"`, `"1048576"`)
/// into mebibytes.
pub fn parse_memory_mib(s: &str) -> Result<f64, QuantityError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(QuantityError::Empty);
    }

    let split = s
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(s.len());
    let (number, suffix) = s.split_at(split);

    let multiplier = match suffix {
        "" => 1.0,
        "Ki" => 1024.0,
        "Mi" => MIB,
        "Gi" => MIB * 1024.0,
        "Ti" => MIB * 1024.0 * 1024.0,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        _ => return Err(QuantityError::UnsupportedSuffix(s.to_string())),
    };

    let value = parse_number(number, s)?;
    Ok(value * multiplier / MIB)
}

/// Plain decimal only: no sign, exponent, `inf` or `NaN`.
fn parse_number(number: &str, original: &str) -> Result<f64, QuantityError> {
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(QuantityError::InvalidNumber(original.to_string()));
    }
    let value: f64 = number
        .parse()
        .map_err(|_| QuantityError::InvalidNumber(original.to_string()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(QuantityError::InvalidNumber(original.to_string()));
    }
    Ok(value)
}
