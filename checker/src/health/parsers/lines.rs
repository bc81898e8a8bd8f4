//! Helpers for label-scanning of unstructured replies
//!
//! The relevant occurrence of a label is always its last one, so a command
//! echoed by the terminal or a stale screen line never wins over fresh output.

use crate::errors::ParseError;

/// Last line containing `needle`
pub fn last_line_with<'a>(lines: &'a [String], needle: &str) -> Option<&'a str> {
    lines
        .iter()
        .rev()
        .find(|line| line.contains(needle))
        .map(String::as_str)
}

/// Like [`last_line_with`], failing with `Wrong {label} reply` when absent
pub fn require_line<'a>(
    lines: &'a [String],
    needle: &str,
    label: &str,
) -> Result<&'a str, ParseError> {
    last_line_with(lines, needle).ok_or_else(|| ParseError::missing_label(label))
}

/// Last whitespace separated token of a line
pub fn last_token(line: &str) -> &str {
    line.split_whitespace().next_back().unwrap_or("")
}

/// Token with surrounding quotes and trailing commas removed
pub fn bare_token(line: &str) -> &str {
    last_token(line).trim_end_matches(',').trim_matches('"')
}

pub fn parse_integer(token: &str, label: &str) -> Result<i64, ParseError> {
    if let Ok(value) = token.parse::<i64>() {
        return Ok(value);
    }
    // Exporters sometimes print whole numbers as floats
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => Ok(value as i64),
        _ => Err(ParseError::invalid_number(label, token)),
    }
}

pub fn parse_decimal(token: &str, label: &str) -> Result<f64, ParseError> {
    token
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ParseError::invalid_number(label, token))
}
