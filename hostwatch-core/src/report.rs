//! Shutdown dump: JSON sites data and rendered HTML report
//!
//! Both artifacts are produced from the same [`SitesReport`], built once from
//! a registry snapshot, so they always agree on hosts, paths and known flags.

use crate::allowlist::HostAllowList;
use crate::config::ReportConfig;
use crate::error::{ArtifactError, GenerationError};
use crate::registry::RegistrySnapshot;
use minijinja::{AutoEscape, Environment, context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Machine-readable projection of a snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitesReport {
    pub hosts: BTreeMap<String, HostReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostReport {
    pub paths: Vec<String>,
    pub total_paths: usize,
    pub host_known: bool,
}

/// Per-host record handed to the HTML template
#[derive(Debug, Clone, Serialize)]
pub struct HostInfo<'a> {
    pub host: &'a str,
    pub paths: &'a [String],
    pub known: bool,
    pub path_count: usize,
}

impl SitesReport {
    /// Hosts in the order the template iterates them
    pub fn host_infos(&self) -> Vec<HostInfo<'_>> {
        self.hosts
            .iter()
            .map(|(host, data)| HostInfo {
                host,
                paths: &data.paths,
                known: data.host_known,
                path_count: data.total_paths,
            })
            .collect()
    }
}

/// Paths of the artifacts written by a successful [`ReportGenerator::generate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifacts {
    pub dump_file: PathBuf,
    pub report_file: PathBuf,
}

/// Builds and writes the shutdown artifacts
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    config: ReportConfig,
}

impl ReportGenerator {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Project a snapshot into per-host report data
    ///
    /// `host_known` reflects the allow-list as it is now, not at observation time.
    pub fn build_report(snapshot: &RegistrySnapshot, allow_list: &HostAllowList) -> SitesReport {
        let hosts = snapshot
            .all_paths()
            .iter()
            .map(|(host, paths)| {
                let paths: Vec<String> = paths.iter().cloned().collect();
                let data = HostReport {
                    total_paths: paths.len(),
                    paths,
                    host_known: allow_list.contains(host),
                };
                (host.clone(), data)
            })
            .collect();

        SitesReport { hosts }
    }

    /// Write the JSON dump and the HTML report
    ///
    /// The two artifacts are attempted independently; a failure in one does
    /// not prevent or remove the other.
    pub fn generate(
        &self,
        snapshot: &RegistrySnapshot,
        allow_list: &HostAllowList,
    ) -> Result<ReportArtifacts, GenerationError> {
        let report = Self::build_report(snapshot, allow_list);

        let dump = self.write_dump(&report);
        let html = self.write_html(&report);

        match (dump, html) {
            (Ok(dump_file), Ok(report_file)) => Ok(ReportArtifacts {
                dump_file,
                report_file,
            }),
            (Err(dump), Ok(_)) => Err(GenerationError::Dump(dump)),
            (Ok(_), Err(report)) => Err(GenerationError::Report(report)),
            (Err(dump), Err(report)) => Err(GenerationError::Both { dump, report }),
        }
    }

    fn write_dump(&self, report: &SitesReport) -> Result<PathBuf, ArtifactError> {
        let json = serde_json::to_string_pretty(report)?;
        write_file(&self.config.dump_file, json)?;

        tracing::info!("Sites data dumped to {}", self.config.dump_file.display());
        Ok(self.config.dump_file.clone())
    }

    fn write_html(&self, report: &SitesReport) -> Result<PathBuf, ArtifactError> {
        let template = fs::read_to_string(&self.config.template).map_err(|source| {
            ArtifactError::TemplateLoad {
                path: self.config.template.clone(),
                source,
            }
        })?;

        let html = render_html(&template, report)?;
        write_file(&self.config.report_file, html)?;

        tracing::info!("HTML report generated: {}", self.config.report_file.display());
        Ok(self.config.report_file.clone())
    }
}

/// Render `report` with a Jinja-style template, HTML-escaping every value
pub fn render_html(template: &str, report: &SitesReport) -> Result<String, ArtifactError> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);

    let html = env.render_str(template, context! { hosts => report.host_infos() })?;
    Ok(html)
}

fn write_file(path: &Path, contents: String) -> Result<(), ArtifactError> {
    fs::write(path, contents).map_err(|source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    })
}
