use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("pool error: {0}")]
    Pool(String),

    #[error("missing required parameter: {name}")]
    MissingParam { name: &'static str },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParam { name: &'static str, reason: String },

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("no value bound for query parameter: {name}")]
    UnboundParam { name: String },

    #[error("unexpected result column: {column}")]
    UnexpectedRow { column: String },
}

impl Error {
    /// True for caller errors that are surfaced before any query runs.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MissingParam { .. } | Error::InvalidParam { .. }
        )
    }
}

/// Result type for silo operations.
pub type Result<T> = std::result::Result<T, Error>;
