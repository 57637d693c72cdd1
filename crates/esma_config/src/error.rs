//! Configuration errors.

/// Problems reading, parsing or validating `esma.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read, or an explicit path is missing.
    #[error("cannot read esma.toml: {0}")]
    IoError(#[from] std::io::Error),

    /// The file is not valid TOML or has fields of the wrong type.
    #[error("malformed esma.toml: {0}")]
    ParseError(String),

    /// A value is well-typed but out of range.
    #[error("invalid setting: {0}")]
    ValidationError(String),
}
