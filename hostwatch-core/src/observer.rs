//! Per-request observation hook

use crate::allowlist::HostAllowList;
use crate::registry::PathRegistry;
use std::sync::Arc;

/// Receives every request the proxy forwards
///
/// Implementations are called on the request path and must return quickly
/// without performing I/O or failing.
pub trait ObservationHook: Send + Sync {
    /// A request to `path` on `host` is about to be forwarded
    fn on_request(&self, host: &str, path: &str);

    /// An opaque tunnel to `host` is about to be opened
    fn on_tunnel(&self, host: &str);
}

/// Classifies each request's host and records it in the registry
#[derive(Debug, Clone)]
pub struct RequestObserver {
    allow_list: Arc<HostAllowList>,
    registry: Arc<PathRegistry>,
}

impl RequestObserver {
    pub fn new(allow_list: Arc<HostAllowList>, registry: Arc<PathRegistry>) -> Self {
        Self {
            allow_list,
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<PathRegistry> {
        &self.registry
    }
}

impl ObservationHook for RequestObserver {
    fn on_request(&self, host: &str, path: &str) {
        let known = self.allow_list.contains(host);
        tracing::debug!(host, path, known, "Observed request");
        self.registry.observe(host, path, known);
    }

    fn on_tunnel(&self, host: &str) {
        tracing::debug!(host, "Observed tunnel");
        self.registry.register_host(host);
    }
}
