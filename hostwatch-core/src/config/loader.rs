//! Configuration file loading

use super::schema::Config;
use super::validator::ConfigValidator;
use crate::error::ConfigError;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        // Priority order:
        // 1. $HOSTWATCH_CONFIG
        // 2. ./hostwatch.toml

        if let Ok(path) = env::var("HOSTWATCH_CONFIG") {
            return PathBuf::from(path);
        }

        PathBuf::from("hostwatch.toml")
    }

    /// Parse config from a TOML string
    pub fn parse(contents: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Load config from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Load {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::parse(&contents)?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Load config from an explicit path or the default location
    ///
    /// There is no built-in fallback: a missing file is a startup error.
    pub fn load(path: Option<PathBuf>) -> Result<Config, ConfigError> {
        let path = path.unwrap_or_else(Self::default_config_path);
        Self::load_from_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.allowed_hosts.is_empty());
        assert_eq!(config.proxy.listen, "0.0.0.0:8080");
        assert_eq!(config.report.dump_file, PathBuf::from("sites_dump.json"));
        assert_eq!(config.report.report_file, PathBuf::from("sites_report.html"));
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
allowed_hosts = ["api.github.com:443", "httpbin.org:443"]

[proxy]
listen = "127.0.0.1:3128"

[report]
dump_file = "out/dump.json"
"#;

        let config = ConfigLoader::parse(toml_str).unwrap();
        assert_eq!(config.allowed_hosts.len(), 2);
        assert_eq!(config.proxy.listen, "127.0.0.1:3128");
        assert_eq!(config.report.dump_file, PathBuf::from("out/dump.json"));
        // Unset fields keep their defaults
        assert_eq!(config.report.report_file, PathBuf::from("sites_report.html"));
    }

    #[test]
    fn test_parse_empty_file() {
        let config = ConfigLoader::parse("").unwrap();
        assert!(config.allowed_hosts.is_empty());
    }

    #[test]
    fn test_parse_malformed() {
        let result = ConfigLoader::parse("allowed_hosts = \"not-a-list\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_parse_rejects_unknown_fields() {
        let result = ConfigLoader::parse("allowed_host = [\"typo.com:443\"]");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_parse_invalid_host() {
        let result = ConfigLoader::parse("allowed_hosts = [\"good.com:443\", \"\"]");
        assert!(matches!(
            result,
            Err(ConfigError::Validation(ValidationError::EmptyHost { index: 1 }))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "allowed_hosts = [\"api.github.com:443\"]").unwrap();

        let config = ConfigLoader::load(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.allowed_hosts, vec!["api.github.com:443".to_string()]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        let result = ConfigLoader::load(Some(missing.clone()));
        match result {
            Err(ConfigError::Load { path, .. }) => assert_eq!(path, missing),
            other => panic!("Expected load error, got {:?}", other),
        }
    }
}
