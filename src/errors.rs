use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Rule1Error {
    #[error("No price bars available")]
    InsufficientData,

    #[error("No low data within the window ending {high_date}")]
    NoLowDataInWindow { high_date: NaiveDate },

    #[error("Invalid range: high {high} / low {low} (expected high > low > 0)")]
    InvalidRange { high: f64, low: f64 },

    #[error("Price data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    ArrowError(String),

    #[error("Date parsing error: {0}")]
    DateError(#[from] chrono::ParseError),

    #[error("Config error: {0}")]
    ConfigError(String),
}

/// Coarse classification used by front ends to pick a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InsufficientData,
    NoLowDataInWindow,
    InvalidRange,
    DataUnavailable,
    Local,
}

impl Rule1Error {
    /// 将任意上游失败归一为 DataUnavailable
    pub fn data_unavailable(symbol: &str, reason: impl std::fmt::Display) -> Self {
        Rule1Error::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Rule1Error::InsufficientData => ErrorKind::InsufficientData,
            Rule1Error::NoLowDataInWindow { .. } => ErrorKind::NoLowDataInWindow,
            Rule1Error::InvalidRange { .. } => ErrorKind::InvalidRange,
            Rule1Error::DataUnavailable { .. } => ErrorKind::DataUnavailable,
            Rule1Error::IoError(_)
            | Rule1Error::ArrowError(_)
            | Rule1Error::DateError(_)
            | Rule1Error::ConfigError(_) => ErrorKind::Local,
        }
    }
}

impl From<arrow::error::ArrowError> for Rule1Error {
    fn from(e: arrow::error::ArrowError) -> Self {
        Rule1Error::ArrowError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Rule1Error>;
