//! Configuration management for hostwatch

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::ConfigLoader;
pub use schema::{Config, ProxyConfig, ReportConfig};
pub use validator::ConfigValidator;
