//! Value comparison used by the standard predicate strategies.

use crate::expression::Literal;
use crate::filter::date::parse_date_millis;
use std::cmp::Ordering;

/// Compare two values with numeric and temporal coercion.
///
/// Returns `None` when either side is NULL or the values are not comparable.
/// Integral numbers compare exactly, mixed numbers as `f64`, temporal values
/// against numbers through epoch milliseconds, and strings against numbers
/// or temporals by reading the string as a date (then as a number).
pub fn compare_literals(left: &Literal, right: &Literal, date_formats: &[String]) -> Option<Ordering> {
    match (left, right) {
        (Literal::Null, _) | (_, Literal::Null) => None,

        (Literal::String(a), Literal::String(b)) => Some(a.cmp(b)),
        (Literal::String(s), other) => compare_text(s, other, date_formats),
        (other, Literal::String(s)) => {
            compare_text(s, other, date_formats).map(Ordering::reverse)
        }

        (Literal::Date(a), Literal::Date(b)) => Some(a.cmp(b)),
        (Literal::Time(a), Literal::Time(b)) => Some(a.cmp(b)),
        (Literal::Timestamp(a), Literal::Timestamp(b)) => Some(a.cmp(b)),

        (Literal::Double(_), _) | (_, Literal::Double(_)) => {
            left.as_f64()?.partial_cmp(&right.as_f64()?)
        }

        _ => Some(left.to_epoch_millis()?.cmp(&right.to_epoch_millis()?)),
    }
}

fn compare_text(text: &str, other: &Literal, date_formats: &[String]) -> Option<Ordering> {
    if other.is_temporal() || other.is_numeric() {
        if let Some(millis) = parse_date_millis(text, date_formats) {
            return compare_literals(&Literal::Long(millis), other, date_formats);
        }
    }
    if other.is_numeric() {
        if let Ok(number) = text.trim().parse::<f64>() {
            return number.partial_cmp(&other.as_f64()?);
        }
    }
    None
}

/// Equality under the same coercion rules; NULL is never equal
pub fn literals_equal(left: &Literal, right: &Literal, date_formats: &[String]) -> bool {
    compare_literals(left, right, date_formats) == Some(Ordering::Equal)
}

/// Plain text of a value for pattern matching
pub fn literal_text(value: &Literal) -> Option<String> {
    match value {
        Literal::String(s) => Some(s.clone()),
        Literal::Integer(v) => Some(v.to_string()),
        Literal::Long(v) => Some(v.to_string()),
        Literal::Double(v) => Some(v.to_string()),
        Literal::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        Literal::Time(t) => Some(t.format("%H:%M:%S").to_string()),
        Literal::Timestamp(ts) => Some(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
        Literal::Null => None,
    }
}
