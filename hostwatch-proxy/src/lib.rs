//! HTTP forward proxy that records the hosts and paths it forwards

pub mod error;
pub mod request;
pub mod server;

// Re-export commonly used types
pub use error::{ProxyError, Result};
pub use request::Target;
pub use server::ProxyServer;
