use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A stage was invoked before its inputs existed. Programming error, aborts the run.
    #[error("Precondition violated: {0}")]
    Precondition(String),
}

pub type Result<T> = std::result::Result<T, EtlError>;
