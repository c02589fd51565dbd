//! Lenient parsing of monetary amounts.
//!
//! Task documents carry prices as free-form strings entered by operators
//! ("1500", "1 500,50", "1500 грн"). The leading number is read and any
//! trailing text ignored; a value with no leading number counts as zero.

use serde::{Deserialize, Deserializer};

/// Parses an amount string, returning `None` when it is absent or malformed.
pub fn try_parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    let prefix = numeric_prefix(&cleaned)?;
    prefix.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Longest leading run of an optional sign, digits and one decimal point.
/// `None` when the run holds no digit.
fn numeric_prefix(s: &str) -> Option<&str> {
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_point = false;
    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    seen_digit.then(|| &s[..end])
}

/// Parses an optional amount string, treating anything unusable as `0.0`.
pub fn parse_amount(raw: Option<&str>) -> f64 {
    raw.and_then(try_parse_amount).unwrap_or(0.0)
}

/// Returns true when the field holds a non-blank value.
pub fn is_present(raw: Option<&str>) -> bool {
    raw.map(|s| !s.trim().is_empty()).unwrap_or(false)
}

/// Deserializes a field that may arrive as a JSON string or number into
/// an optional string, so `"1500"` and `1500` are both accepted.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Text(s)) => Some(s),
        Some(Raw::Int(i)) => Some(i.to_string()),
        Some(Raw::Float(f)) => Some(f.to_string()),
    })
}
