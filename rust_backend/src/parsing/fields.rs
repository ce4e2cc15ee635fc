//! Lenient field helpers shared by the parsers.

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Parses the leading number of a catalog field.
///
/// Accepts values such as `"11.2"`, `" 9.8 V"`, `"12.5:"` or `"<13.1"`.
/// Returns `None` for empty or non-numeric text.
pub fn leading_number(text: &str) -> Option<f64> {
    let trimmed = text.trim().trim_start_matches(['<', '>', '(', '[']);
    let token = trimmed.split_whitespace().next()?;
    let numeric: String = token
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        .collect();
    numeric.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Deserializes a field that may be a number, a numeric string, empty or null.
///
/// Anything unparseable becomes `None` so that callers can apply defaults.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(value)) => Some(value),
        Some(NumberOrText::Text(text)) => leading_number(&text),
        Some(NumberOrText::Other(_)) | None => None,
    })
}

/// Deserializes a field that may be text, a number or null into a string.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Int(i64),
        Float(f64),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<TextOrNumber>::deserialize(deserializer)? {
        Some(TextOrNumber::Text(text)) => Some(text),
        Some(TextOrNumber::Int(value)) => Some(value.to_string()),
        Some(TextOrNumber::Float(value)) => Some(value.to_string()),
        Some(TextOrNumber::Other(_)) | None => None,
    })
}

/// Case-insensitive lookup of CSV columns by header name.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn new(headers: &csv::StringRecord) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (normalize(h), i))
            .collect();
        Self { positions }
    }

    pub fn contains(&self, column: &str) -> bool {
        self.positions.contains_key(&normalize(column))
    }

    /// Trimmed, non-empty value of `column` in `record`.
    pub fn get<'r>(&self, record: &'r csv::StringRecord, column: &str) -> Option<&'r str> {
        let position = *self.positions.get(&normalize(column))?;
        record
            .get(position)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn number(&self, record: &csv::StringRecord, column: &str) -> Option<f64> {
        self.get(record, column).and_then(leading_number)
    }
}

fn normalize(header: &str) -> String {
    header.trim().trim_start_matches('\u{feff}').to_lowercase()
}

/// Builds a CSV reader that tolerates ragged rows and padded cells.
pub fn csv_reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes())
}
