//! Configuration validation

use super::schema::Config;
use crate::error::ValidationError;
use std::collections::HashSet;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate entire configuration
    pub fn validate(config: &Config) -> Result<(), ValidationError> {
        Self::validate_hosts(&config.allowed_hosts)?;
        Ok(())
    }

    /// Host entries are compared verbatim, so anything that can never
    /// appear in a request authority is rejected up front
    fn validate_hosts(hosts: &[String]) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();

        for (index, host) in hosts.iter().enumerate() {
            if host.is_empty() {
                return Err(ValidationError::EmptyHost { index });
            }

            if host.chars().any(|c| c.is_whitespace() || c.is_control()) {
                return Err(ValidationError::InvalidHost { host: host.clone() });
            }

            if !seen.insert(host.as_str()) {
                tracing::warn!("Duplicate allowed host entry: {}", host);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(hosts: &[&str]) -> Config {
        Config {
            allowed_hosts: hosts.iter().map(|h| h.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_hosts() {
        let config = config_with(&["api.github.com:443", "192.168.1.10:8080", "localhost"]);
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_empty_list_is_valid() {
        assert!(ConfigValidator::validate(&config_with(&[])).is_ok());
    }

    #[test]
    fn test_duplicates_allowed() {
        let config = config_with(&["a.com:443", "a.com:443"]);
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_reject_empty_host() {
        let result = ConfigValidator::validate(&config_with(&["a.com:443", ""]));
        assert!(matches!(result, Err(ValidationError::EmptyHost { index: 1 })));
    }

    #[test]
    fn test_reject_whitespace() {
        let result = ConfigValidator::validate(&config_with(&["a.com :443"]));
        assert!(matches!(result, Err(ValidationError::InvalidHost { .. })));

        let result = ConfigValidator::validate(&config_with(&["a.com:443\n"]));
        assert!(matches!(result, Err(ValidationError::InvalidHost { .. })));
    }
}
