//! Literal values and column references.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column reference, optionally qualified by a table name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    /// `table.column` when qualified, otherwise the bare column name
    pub fn qualified_name(&self) -> String {
        match &self.table {
            Some(table) => format!("{}.{}", table, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Scalar value appearing in a filter term, or read from a record field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Integer(i32),
    Long(i64),
    Double(f64),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Null,
}

impl Literal {
    pub fn string(val: impl Into<String>) -> Self {
        Literal::String(val.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Literal::Integer(_) | Literal::Long(_) | Literal::Double(_)
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            Literal::Date(_) | Literal::Time(_) | Literal::Timestamp(_)
        )
    }

    /// Name of the literal kind, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Literal::Integer(_) => "integer",
            Literal::Long(_) => "long",
            Literal::Double(_) => "double",
            Literal::String(_) => "string",
            Literal::Date(_) => "date",
            Literal::Time(_) => "time",
            Literal::Timestamp(_) => "timestamp",
            Literal::Null => "null",
        }
    }

    /// Numeric view of the value; temporal values map to epoch milliseconds
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Integer(v) => Some(*v as f64),
            Literal::Long(v) => Some(*v as f64),
            Literal::Double(v) => Some(*v),
            _ => self.to_epoch_millis().map(|ms| ms as f64),
        }
    }

    /// Epoch milliseconds (UTC) for dates and timestamps, milliseconds since
    /// midnight for times, and the value itself for integral numbers.
    pub fn to_epoch_millis(&self) -> Option<i64> {
        match self {
            Literal::Integer(v) => Some(*v as i64),
            Literal::Long(v) => Some(*v),
            Literal::Date(date) => date_millis(*date),
            Literal::Time(time) => Some(time_millis(*time)),
            Literal::Timestamp(ts) => Some(timestamp_millis(*ts)),
            Literal::Double(_) | Literal::String(_) | Literal::Null => None,
        }
    }
}

/// Epoch milliseconds of a naive timestamp interpreted as UTC
pub fn timestamp_millis(ts: NaiveDateTime) -> i64 {
    DateTime::<Utc>::from_naive_utc_and_offset(ts, Utc).timestamp_millis()
}

/// Epoch milliseconds of midnight UTC on the given date
pub fn date_millis(date: NaiveDate) -> Option<i64> {
    date.and_hms_opt(0, 0, 0).map(timestamp_millis)
}

/// Milliseconds since midnight
pub fn time_millis(time: NaiveTime) -> i64 {
    time.num_seconds_from_midnight() as i64 * 1000 + (time.nanosecond() / 1_000_000) as i64
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(v) => write!(f, "{}", v),
            Literal::Long(v) => write!(f, "{}", v),
            Literal::Double(v) => write!(f, "{:?}", v),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Literal::Date(d) => write!(f, "DATE '{}'", d.format("%Y-%m-%d")),
            Literal::Time(t) => write!(f, "TIME '{}'", t.format("%H:%M:%S%.3f")),
            Literal::Timestamp(ts) => {
                write!(f, "TIMESTAMP '{}'", ts.format("%Y-%m-%d %H:%M:%S%.3f"))
            }
            Literal::Null => f.write_str("NULL"),
        }
    }
}
