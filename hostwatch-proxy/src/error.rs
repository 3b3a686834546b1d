//! Error types for proxy operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProxyError>;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Invalid request target: {0}")]
    InvalidTarget(String),

    #[error("Not a proxy request: {0}")]
    NotProxyRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
