//! Configuration access port trait.
//!
//! Sections and keys are looked up case-insensitively by implementations
//! that support it. Absent and blank values are treated alike.

use crate::domain::error::BacktestError;
use chrono::NaiveDate;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// A numeric key: `None` when absent, an error when present but unparseable.
    fn get_number(&self, section: &str, key: &str) -> Result<Option<f64>, BacktestError> {
        match self.get_string(section, key) {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => s.trim().parse::<f64>().map(Some).map_err(|_| {
                BacktestError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: format!("'{}' is not a number", s.trim()),
                }
            }),
        }
    }

    /// A date key in `YYYY-MM-DD` form.
    fn get_date(&self, section: &str, key: &str) -> Result<Option<NaiveDate>, BacktestError> {
        match self.get_string(section, key) {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(Some)
                .map_err(|_| BacktestError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: format!("invalid {} format, expected YYYY-MM-DD", key),
                }),
        }
    }
}
