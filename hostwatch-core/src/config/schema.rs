//! Configuration schema types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete hostwatch configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Hosts considered known, matched verbatim against `host:port`
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Proxy listener settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// Output locations for the shutdown dump
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default = "default_dump_file")]
    pub dump_file: PathBuf,
    #[serde(default = "default_report_file")]
    pub report_file: PathBuf,
    /// HTML template rendered into `report_file`
    #[serde(default = "default_template")]
    pub template: PathBuf,
}

fn default_dump_file() -> PathBuf {
    PathBuf::from("sites_dump.json")
}

fn default_report_file() -> PathBuf {
    PathBuf::from("sites_report.html")
}

fn default_template() -> PathBuf {
    PathBuf::from("templates/index.html")
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dump_file: default_dump_file(),
            report_file: default_report_file(),
            template: default_template(),
        }
    }
}
