//! Best-effort conversion of loosely typed SQLite values.
//!
//! SQLite columns only carry type affinity, so rows written by older schema
//! versions can hold text where a number is expected (or NULL where a value
//! is required). These helpers never fail: a value that cannot be read as the
//! requested type yields `None`.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use rusqlite::Row;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Read a value as text. Numbers are rendered, blobs decoded lossily.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Text(s) => Some(s.clone()),
        Value::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
    }
}

/// Read a value as an integer. Reals are truncated, text is parsed.
pub fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Real(f) if f.is_finite() => Some(*f as i64),
        Value::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

/// Read a value as a real number.
pub fn real(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Real(f) => Some(*f),
        Value::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Parse an engine timestamp (`CURRENT_TIMESTAMP` format, or ISO-8601).
pub fn timestamp(value: &Value) -> Option<NaiveDateTime> {
    let raw = text(value)?;
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| date_str(raw).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// Parse a calendar date (`YYYY-MM-DD`), ignoring any time part.
pub fn date(value: &Value) -> Option<NaiveDate> {
    let raw = text(value)?;
    date_str(raw.trim())
}

fn date_str(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Typed, lenient accessors over a result row, by column name.
///
/// A missing column is an error (the query is wrong); a badly typed value is not.
pub trait RowExt {
    fn value(&self, column: &str) -> rusqlite::Result<Value>;

    fn text_or_default(&self, column: &str) -> rusqlite::Result<String> {
        Ok(text(&self.value(column)?).unwrap_or_default())
    }

    fn opt_text(&self, column: &str) -> rusqlite::Result<Option<String>> {
        Ok(text(&self.value(column)?))
    }

    fn int_or_zero(&self, column: &str) -> rusqlite::Result<i64> {
        Ok(integer(&self.value(column)?).unwrap_or(0))
    }

    fn real_or_zero(&self, column: &str) -> rusqlite::Result<f64> {
        Ok(real(&self.value(column)?).unwrap_or(0.0))
    }

    fn opt_timestamp(&self, column: &str) -> rusqlite::Result<Option<NaiveDateTime>> {
        Ok(timestamp(&self.value(column)?))
    }

    fn opt_date(&self, column: &str) -> rusqlite::Result<Option<NaiveDate>> {
        Ok(date(&self.value(column)?))
    }
}

impl RowExt for Row<'_> {
    fn value(&self, column: &str) -> rusqlite::Result<Value> {
        Ok(self.get_ref(column)?.into())
    }
}
