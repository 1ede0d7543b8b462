//! Cell decoding with safe defaults
//!
//! The gviz endpoint ships a raw value and a display string side by side and
//! happily returns partial cells or sentinels like `"-"` for missing data.
//! Every decoder here degrades to 0 or `None`; none of them can fail.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use sheetfolio_core::{CellValue, RawCell};

/// `Date(year,month,day[,hour,minute,second[,millis]])`, month zero-based
static DATE_CTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*Date\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*(?:,\s*(\d+)\s*)?(?:,\s*(\d+)\s*)?(?:,\s*(\d+)\s*)?(?:,\s*\d+\s*)?\)\s*$",
    )
    .expect("date constructor pattern is valid")
});

/// Fallback formats tried after the constructor pattern
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// A decoded cell value, borrowed from the cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Number(f64),
    Text(&'a str),
    Bool(bool),
}

/// Raw value if present, else the formatted string, else `None`
pub fn decode_value(cell: Option<&RawCell>) -> Option<Scalar<'_>> {
    let cell = cell?;
    match &cell.v {
        Some(CellValue::Number(n)) => Some(Scalar::Number(*n)),
        Some(CellValue::Text(s)) => Some(Scalar::Text(s.as_str())),
        Some(CellValue::Bool(b)) => Some(Scalar::Bool(*b)),
        Some(CellValue::Other(_)) | None => cell.f.as_deref().map(Scalar::Text),
    }
}

/// Numeric reading of a cell; anything unreadable is 0
pub fn decode_number(cell: Option<&RawCell>) -> f64 {
    match decode_value(cell) {
        Some(Scalar::Number(n)) if n.is_finite() => n,
        Some(Scalar::Text(s)) => parse_lenient(s),
        _ => 0.0,
    }
}

/// Trimmed, non-empty text form of a cell
pub fn decode_text(cell: Option<&RawCell>) -> Option<String> {
    let text = match decode_value(cell)? {
        Scalar::Text(s) => s.trim().to_string(),
        Scalar::Number(n) => format_number(n),
        Scalar::Bool(b) => b.to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Calendar date/time of a cell, `None` when it cannot be read
pub fn decode_date(cell: Option<&RawCell>) -> Option<NaiveDateTime> {
    match decode_value(cell)? {
        Scalar::Text(s) => parse_date_text(s),
        _ => None,
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.starts_with("Date(") {
        return parse_date_constructor(text);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn parse_date_constructor(text: &str) -> Option<NaiveDateTime> {
    let caps = DATE_CTOR.captures(text)?;
    let part = |i: usize| -> Option<u32> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };

    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let month = part(2)?;
    let day = part(3)?;

    NaiveDate::from_ymd_opt(year, month + 1, day)?.and_hms_opt(part(4)?, part(5)?, part(6)?)
}

/// Strip everything but digits, `.` and `-`, then read the longest float
/// prefix (`"1,234.56 USDT"` reads 1234.56, `"12.5.1"` reads 12.5)
fn parse_lenient(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "-" || trimmed == "--" {
        return 0.0;
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    float_prefix(&cleaned)
        .and_then(|p| p.parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

fn float_prefix(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if frac_end > frac_start {
            end = frac_end;
        } else if digits > 0 {
            end = frac_start;
        }
    }

    if digits == 0 {
        None
    } else {
        Some(&s[..end])
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
