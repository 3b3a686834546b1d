//! Operator-approved hosts

use crate::config::{Config, ConfigLoader, ConfigValidator};
use crate::error::ConfigError;
use std::collections::HashSet;
use std::path::Path;

/// Immutable set of known hosts
///
/// Membership is exact string equality against the request's `host:port`
/// authority; there is no wildcard matching and no case folding.
#[derive(Debug, Clone, Default)]
pub struct HostAllowList {
    hosts: HashSet<String>,
}

impl HostAllowList {
    /// Build an allow-list from host strings (duplicates collapse)
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }

    /// Validate a hand-built configuration, then build the allow-list
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        ConfigValidator::validate(config)?;
        Ok(Self::from_validated(config))
    }

    /// Build the allow-list from a configuration [`ConfigLoader`] already validated
    pub fn from_validated(config: &Config) -> Self {
        Self::new(config.allowed_hosts.iter().cloned())
    }

    /// Read, parse and validate the allow-list from a config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = ConfigLoader::load_from_file(path)?;
        Ok(Self::from_validated(&config))
    }

    pub fn contains(&self, host: &str) -> bool {
        self.hosts.contains(host)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Hosts in lexicographic order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let mut hosts: Vec<&str> = self.hosts.iter().map(String::as_str).collect();
        hosts.sort_unstable();
        hosts.into_iter()
    }
}
