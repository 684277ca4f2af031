use thiserror::Error;

/// Startup configuration failures. The only fatal error class:
/// the run aborts before a single HTTP call is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },
}

/// Per-request client failures. Never fatal to the run; the scheduler
/// hands them to the classifier and keeps going.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("failed to decode response body: {0}")]
    Decode(String),

    #[error("unexpected status {0} reading account state")]
    UnexpectedStatus(u16),
}
