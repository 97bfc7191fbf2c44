//! Registry of named health probes
//!
//! Registration may run concurrently with queries. Readers clone probe handles
//! out of the map and release the shard lock before invoking anything, so a
//! slow probe never blocks registration or other queries.

use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use crate::probe::HealthProbe;

/// Shared handle to a registered probe
pub type SharedProbe = Arc<dyn HealthProbe>;

/// Mapping from service name to its probe
///
/// Names are unique; registering an existing name replaces the old probe.
/// There is no removal: entries live as long as the registry.
#[derive(Default)]
pub struct ProbeRegistry {
    probes: DashMap<String, SharedProbe>,
}

impl ProbeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the probe for `name`
    ///
    /// Returns the probe that was replaced, if any.
    pub fn insert(&self, name: impl Into<String>, probe: SharedProbe) -> Option<SharedProbe> {
        self.probes.insert(name.into(), probe)
    }

    /// Look up the probe registered for `name`
    pub fn get(&self, name: &str) -> Option<SharedProbe> {
        self.probes.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Point-in-time copy of every registration, in no particular order
    pub fn snapshot(&self) -> Vec<(String, SharedProbe)> {
        self.probes
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect()
    }

    /// Registered service names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.probes.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Whether `name` has a probe
    pub fn contains(&self, name: &str) -> bool {
        self.probes.contains_key(name)
    }

    /// Number of registered probes
    pub fn len(&self) -> usize {
        self.probes.len()
    }

    /// Whether no probe is registered
    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

impl fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeRegistry")
            .field("services", &self.names())
            .finish()
    }
}
