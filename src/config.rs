//! Configuration for filter compilation.

use serde::{Deserialize, Serialize};

/// Date formats tried, in order, when a string has to be read as a date.
pub const DEFAULT_DATE_FORMATS: [&str; 4] = [
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S,%3f",
];

/// Options shared by the extractors and the standard predicate strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// chrono format strings for date literals, first full match wins
    pub date_formats: Vec<String>,
    /// LIKE patterns match without regard to case
    pub case_insensitive_like: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            case_insensitive_like: false,
        }
    }
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_formats = formats.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_case_insensitive_like(mut self, enabled: bool) -> Self {
        self.case_insensitive_like = enabled;
        self
    }
}
