//! Concurrent store of request paths observed per host

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Paths observed on a single host
///
/// Both sets live under one lock so `known` can never hold a path that
/// `all` does not.
#[derive(Debug, Default)]
struct HostBucket {
    all: BTreeSet<String>,
    /// `None` until a path is observed while the host is known
    known: Option<BTreeSet<String>>,
}

/// Records the distinct request paths seen on every host
///
/// The host map is guarded by an `RwLock` and each host bucket by its own
/// `Mutex`, so traffic to unrelated hosts never contends on the same lock.
/// At most one bucket lock is held at any time.
#[derive(Debug, Default)]
pub struct PathRegistry {
    hosts: RwLock<HashMap<String, Arc<Mutex<HostBucket>>>>,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` on `host`; also record it as a known path if `is_known`
    ///
    /// Repeated calls with the same arguments are no-ops.
    pub fn observe(&self, host: &str, path: &str, is_known: bool) {
        let bucket = self.bucket(host);
        let mut bucket = lock(&bucket);

        if !bucket.all.contains(path) {
            bucket.all.insert(path.to_string());
        }
        if is_known {
            let known = bucket.known.get_or_insert_with(BTreeSet::new);
            if !known.contains(path) {
                known.insert(path.to_string());
            }
        }
    }

    /// Make sure `host` appears in the registry, without recording a path
    pub fn register_host(&self, host: &str) {
        self.bucket(host);
    }

    /// Consistent copy of every host bucket
    pub fn snapshot(&self) -> RegistrySnapshot {
        let buckets: Vec<(String, Arc<Mutex<HostBucket>>)> = self
            .hosts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(host, bucket)| (host.clone(), Arc::clone(bucket)))
            .collect();

        let mut snapshot = RegistrySnapshot::default();
        for (host, bucket) in buckets {
            let bucket = lock(&bucket);
            if let Some(known) = &bucket.known {
                snapshot.known_paths.insert(host.clone(), known.clone());
            }
            snapshot.all_paths.insert(host, bucket.all.clone());
        }
        snapshot
    }

    pub fn host_count(&self) -> usize {
        self.hosts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of distinct paths seen on `host` (0 if never seen)
    pub fn path_count(&self, host: &str) -> usize {
        let bucket = self
            .hosts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(host)
            .cloned();

        match bucket {
            Some(bucket) => {
                let count = lock(&bucket).all.len();
                count
            }
            None => 0,
        }
    }

    /// Get the bucket for `host`, creating it on first sight
    fn bucket(&self, host: &str) -> Arc<Mutex<HostBucket>> {
        if let Some(bucket) = self
            .hosts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(host)
        {
            return Arc::clone(bucket);
        }

        let mut hosts = self.hosts.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(hosts.entry(host.to_string()).or_default())
    }
}

// A panic while holding a bucket lock cannot leave a set half-inserted,
// so the data behind a poisoned lock is still valid.
fn lock(bucket: &Mutex<HostBucket>) -> MutexGuard<'_, HostBucket> {
    bucket.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Point-in-time copy of a [`PathRegistry`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    all_paths: BTreeMap<String, BTreeSet<String>>,
    known_paths: BTreeMap<String, BTreeSet<String>>,
}

impl RegistrySnapshot {
    /// Every path observed, per host
    pub fn all_paths(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.all_paths
    }

    /// Paths observed while the host was known; unknown hosts are absent
    pub fn known_paths(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.known_paths
    }

    /// Hosts in lexicographic order
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.all_paths.keys().map(String::as_str)
    }
}
