use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (overlapping voucher lists, zero tree count, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// A table the operation depends on was not supplied.
    #[error("{0} data unavailable")]
    Unavailable(&'static str),
    #[error("serialization error: {0}")]
    Serialize(String),
}
