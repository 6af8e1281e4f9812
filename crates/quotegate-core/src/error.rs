use thiserror::Error;

/// Validation errors for request parameters, raised before any fetch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("Unsupported interval '{value}'")]
    UnsupportedInterval { value: String },

    #[error("period cannot be empty")]
    EmptyPeriod,

    #[error("max_records must be a non-negative integer: '{value}'")]
    InvalidMaxRecords { value: String },
}

/// Top-level error for a gateway request. Each variant maps to one HTTP status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{message}")]
    FetchExhausted { message: String },

    #[error("{0}")]
    Processing(String),
}

impl GatewayError {
    pub const fn status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::FetchExhausted { .. } => 502,
            Self::Processing(_) => 500,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "gateway.validation",
            Self::FetchExhausted { .. } => "gateway.fetch_exhausted",
            Self::Processing(_) => "gateway.processing",
        }
    }
}
