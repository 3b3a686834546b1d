//! One-shot dump on termination
//!
//! The coordinator moves `Running -> ShuttingDown -> Terminated` exactly once.
//! Whoever wins the first transition snapshots the registry and writes the
//! artifacts; every later trigger is ignored.

use crate::allowlist::HostAllowList;
use crate::error::GenerationError;
use crate::registry::PathRegistry;
use crate::report::{ReportArtifacts, ReportGenerator};
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

/// Exit status used when the shutdown dump could not be written
pub const EXIT_DUMP_FAILED: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    ShuttingDown,
    Terminated,
}

/// Result of the shutdown dump
#[derive(Debug)]
pub enum ShutdownOutcome {
    Clean(ReportArtifacts),
    DumpFailed(GenerationError),
}

impl ShutdownOutcome {
    /// Process exit status for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            ShutdownOutcome::Clean(_) => 0,
            ShutdownOutcome::DumpFailed(_) => EXIT_DUMP_FAILED,
        }
    }
}

pub struct ShutdownCoordinator {
    state: Mutex<ShutdownState>,
    registry: Arc<PathRegistry>,
    allow_list: Arc<HostAllowList>,
    generator: ReportGenerator,
    token: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new(
        registry: Arc<PathRegistry>,
        allow_list: Arc<HostAllowList>,
        generator: ReportGenerator,
    ) -> Self {
        Self {
            state: Mutex::new(ShutdownState::Running),
            registry,
            allow_list,
            generator,
            token: CancellationToken::new(),
        }
    }

    /// Token cancelled as soon as shutdown begins
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn state(&self) -> ShutdownState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run the dump if no shutdown has started yet
    ///
    /// Returns `None` when another caller already owns the shutdown.
    pub fn shutdown(&self) -> Option<ShutdownOutcome> {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state != ShutdownState::Running {
                tracing::debug!("Shutdown already in progress, ignoring trigger");
                return None;
            }
            *state = ShutdownState::ShuttingDown;
        }

        self.token.cancel();
        tracing::info!("Received shutdown signal, dumping sites data...");

        let snapshot = self.registry.snapshot();
        let outcome = match self.generator.generate(&snapshot, &self.allow_list) {
            Ok(artifacts) => {
                tracing::info!(
                    hosts = snapshot.all_paths().len(),
                    dump = %artifacts.dump_file.display(),
                    report = %artifacts.report_file.display(),
                    "Shutdown complete"
                );
                ShutdownOutcome::Clean(artifacts)
            }
            Err(e) => {
                for artifact in e.failed_artifacts() {
                    tracing::error!(%artifact, "Failed to write artifact");
                }
                tracing::error!("Failed to dump sites data: {}", e);
                ShutdownOutcome::DumpFailed(e)
            }
        };

        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = ShutdownState::Terminated;
        Some(outcome)
    }

    /// Wait for SIGINT or SIGTERM
    pub async fn wait_for_signal() -> std::io::Result<()> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut terminate = signal(SignalKind::terminate())?;
            tokio::select! {
                result = tokio::signal::ctrl_c() => result,
                _ = terminate.recv() => Ok(()),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await
        }
    }

    /// Block until the first termination signal, then dump
    ///
    /// Returns `None` only if some other caller started the shutdown first.
    pub async fn run_until_signal(self: Arc<Self>) -> Option<ShutdownOutcome> {
        tokio::select! {
            result = Self::wait_for_signal() => {
                if let Err(e) = result {
                    tracing::warn!("Failed to listen for termination signal: {}", e);
                    self.token.cancelled().await;
                }
            }
            _ = self.token.cancelled() => {}
        }

        // Dumping does file and template I/O
        match tokio::task::spawn_blocking(move || self.shutdown()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Shutdown task failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use std::fs;
    use std::thread;
    use tempfile::TempDir;

    fn coordinator(dir: &TempDir, template: Option<&str>) -> ShutdownCoordinator {
        let template_path = dir.path().join("index.html");
        if let Some(t) = template {
            fs::write(&template_path, t).unwrap();
        }

        let registry = Arc::new(PathRegistry::new());
        registry.observe("api.github.com:443", "/api/v3/user", true);

        ShutdownCoordinator::new(
            registry,
            Arc::new(HostAllowList::new(["api.github.com:443"])),
            ReportGenerator::new(ReportConfig {
                dump_file: dir.path().join("sites_dump.json"),
                report_file: dir.path().join("sites_report.html"),
                template: template_path,
            }),
        )
    }

    #[test]
    fn test_clean_shutdown() {
        let dir = TempDir::new().unwrap();
        let coordinator = coordinator(&dir, Some("{% for h in hosts %}{{ h.host }}{% endfor %}"));
        assert_eq!(coordinator.state(), ShutdownState::Running);

        let outcome = coordinator.shutdown().unwrap();
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(coordinator.state(), ShutdownState::Terminated);
        assert!(coordinator.token().is_cancelled());

        let html = fs::read_to_string(dir.path().join("sites_report.html")).unwrap();
        assert_eq!(html, "api.github.com:443");
    }

    #[test]
    fn test_failed_dump_exit_code() {
        let dir = TempDir::new().unwrap();
        let coordinator = coordinator(&dir, None);

        let outcome = coordinator.shutdown().unwrap();
        assert!(matches!(outcome, ShutdownOutcome::DumpFailed(GenerationError::Report(_))));
        assert_eq!(outcome.exit_code(), EXIT_DUMP_FAILED);
        assert_eq!(coordinator.state(), ShutdownState::Terminated);
        // The JSON dump still made it to disk
        assert!(dir.path().join("sites_dump.json").exists());
    }

    #[test]
    fn test_second_trigger_ignored() {
        let dir = TempDir::new().unwrap();
        let coordinator = coordinator(&dir, Some(""));

        assert!(coordinator.shutdown().is_some());
        assert!(coordinator.shutdown().is_none());
    }

    #[test]
    fn test_concurrent_triggers_dump_once() {
        let dir = TempDir::new().unwrap();
        let coordinator = Arc::new(coordinator(&dir, Some("")));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&coordinator);
                thread::spawn(move || c.shutdown().is_some())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_run_until_signal_yields_after_external_shutdown() {
        let dir = TempDir::new().unwrap();
        let coordinator = Arc::new(coordinator(&dir, Some("")));

        let waiter = tokio::spawn(Arc::clone(&coordinator).run_until_signal());
        assert!(coordinator.shutdown().is_some());

        // The waiter wakes on the cancelled token and finds shutdown taken
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_run_until_signal_dumps_on_cancel() {
        let dir = TempDir::new().unwrap();
        let coordinator = Arc::new(coordinator(&dir, Some("{{ hosts | length }}")));

        let waiter = tokio::spawn(Arc::clone(&coordinator).run_until_signal());
        coordinator.token().cancel();

        let outcome = tokio::time::timeout(std::time::Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(coordinator.state(), ShutdownState::Terminated);
        assert_eq!(fs::read_to_string(dir.path().join("sites_report.html")).unwrap(), "1");
    }
}
