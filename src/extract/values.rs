//! Parsing of displayed values: counts and dates

use chrono::NaiveDate;

/// Parses a displayed count such as `1234`, `1,234`, `12.5K` or `3M`
///
/// Suffixed values are truncated to a whole number.
pub fn parse_count(text: &str) -> Option<u64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' ' | '\u{a0}'))
        .collect();

    let (number, multiplier) = match cleaned.chars().last()? {
        'k' | 'K' => (&cleaned[..cleaned.len() - 1], 1_000u64),
        'm' | 'M' => (&cleaned[..cleaned.len() - 1], 1_000_000),
        'b' | 'B' => (&cleaned[..cleaned.len() - 1], 1_000_000_000),
        _ => return cleaned.parse().ok(),
    };

    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some((value * multiplier as f64) as u64)
}

/// Parses a displayed date with a chrono `format` string
///
/// The format may carry literal text around the date, e.g.
/// `Uploaded at %B %d, %Y`.
pub fn parse_date(text: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), format).ok()
}
