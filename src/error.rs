//! Error handling - crate-wide error hierarchy

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors (bad strategy entry, wrong leg count, ...)
    #[error("configuration error: {0}")]
    Config(String),

    /// A named enum parameter did not resolve against its closed enumeration
    #[error("unknown {what} name: {name:?}")]
    UnknownName { what: &'static str, name: String },

    /// Indicator attachment errors
    #[error("indicator error: {0}")]
    Indicator(String),

    /// File IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file parse errors
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
