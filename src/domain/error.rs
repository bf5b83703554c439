//! Domain error types.
//!
//! Numeric degeneracy (zero variance, zero entry price) is not an error. It is
//! reported through [`crate::domain::metrics::Degeneracy`] on the value itself.

/// Top-level error type for sigtrader.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("insufficient data for {indicator}: have {bars} bars, need {minimum}")]
    InsufficientData {
        indicator: String,
        bars: usize,
        minimum: usize,
    },

    #[error("invalid parameter {parameter}: {reason}")]
    InvalidParameter { parameter: String, reason: String },

    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BacktestError {
    pub fn invalid_parameter(parameter: &str, reason: impl Into<String>) -> Self {
        BacktestError::InvalidParameter {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        BacktestError::Configuration {
            reason: reason.into(),
        }
    }
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Io(_) => 1,
            BacktestError::ConfigParse { .. }
            | BacktestError::ConfigMissing { .. }
            | BacktestError::ConfigInvalid { .. } => 2,
            BacktestError::Data { .. } => 3,
            BacktestError::InvalidParameter { .. } | BacktestError::Configuration { .. } => 4,
            BacktestError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
