//! Core library for hostwatch
//!
//! Records which hosts and request paths pass through the proxy, classifies
//! hosts against an allow-list, and writes a JSON dump plus an HTML report
//! on shutdown.

pub mod allowlist;
pub mod config;
pub mod error;
pub mod observer;
pub mod registry;
pub mod report;
pub mod sample;
pub mod shutdown;

pub use allowlist::HostAllowList;
pub use config::{Config, ConfigLoader, ReportConfig};
pub use error::{Artifact, ArtifactError, ConfigError, GenerationError, ValidationError};
pub use observer::{ObservationHook, RequestObserver};
pub use registry::{PathRegistry, RegistrySnapshot};
pub use report::{ReportArtifacts, ReportGenerator, SitesReport};
pub use shutdown::{EXIT_DUMP_FAILED, ShutdownCoordinator, ShutdownOutcome, ShutdownState};
