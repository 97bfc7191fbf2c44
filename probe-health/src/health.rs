//! Health registry and query service
//!
//! Answers point-in-time health queries by running registered probes:
//!
//! - An empty service name asks about the whole process. Every probe runs, in
//!   no particular order, until one reports `Unhealthy`; that short-circuits to
//!   `NOT_SERVING`. Otherwise (including when nothing is registered) the answer
//!   is `SERVING`.
//! - A non-empty name runs only that service's probe. Unregistered names are
//!   `UNKNOWN`; `Unhealthy` is `NOT_SERVING`; anything else, `Unknown`
//!   included, is `SERVING`.
//!
//! Queries carry no timeout and never retry. A probe that ignores its
//! context and never returns blocks the query that invoked it.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::grpc::pb::health_check_response::ServingStatus;
use crate::grpc::pb::health_server::HealthServer;
use crate::probe::{HealthProbe, HealthStatus, ProbeContext};
use crate::registry::{ProbeRegistry, SharedProbe};

/// Registry of health probes plus the `grpc.health.v1.Health` query logic
///
/// Clones share the same registry, so a clone handed to the gRPC server keeps
/// seeing probes registered later through another clone.
#[derive(Debug, Clone, Default)]
pub struct HealthService {
    registry: Arc<ProbeRegistry>,
}

impl HealthService {
    /// Create a service with an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `probe` under `name`, replacing any previous probe
    pub fn add_probe<P>(&self, name: impl Into<String>, probe: P)
    where
        P: HealthProbe,
    {
        self.add_shared_probe(name, Arc::new(probe));
    }

    /// Register an already shared probe under `name`
    pub fn add_shared_probe(&self, name: impl Into<String>, probe: SharedProbe) {
        let name = name.into();
        if name.is_empty() {
            tracing::warn!("Registering a probe under the empty name; aggregate queries still run all probes");
        }

        match self.registry.insert(name.clone(), probe) {
            Some(_) => tracing::info!(service = %name, "Replaced health probe"),
            None => tracing::debug!(service = %name, "Registered health probe"),
        }
    }

    /// Answer a health query for `service` (empty for the whole process)
    pub async fn check_service(&self, ctx: &ProbeContext, service: &str) -> ServingStatus {
        if service.is_empty() {
            return self.check_all(ctx).await;
        }

        match self.registry.get(service) {
            Some(probe) => serving_status(run_probe(service, &probe, ctx).await),
            None => {
                tracing::debug!(service = %service, "Health check for unregistered service");
                ServingStatus::Unknown
            }
        }
    }

    async fn check_all(&self, ctx: &ProbeContext) -> ServingStatus {
        for (name, probe) in self.registry.snapshot() {
            if run_probe(&name, &probe, ctx).await.is_unhealthy() {
                tracing::info!(service = %name, "Aggregate health check failed");
                return ServingStatus::NotServing;
            }
        }
        ServingStatus::Serving
    }

    /// Registered service names, sorted
    pub fn services(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Number of registered probes
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no probe is registered
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Wrap this service in the generated tonic server
    pub fn into_server(self) -> HealthServer<Self> {
        HealthServer::new(self)
    }
}

fn serving_status(status: HealthStatus) -> ServingStatus {
    if status.is_unhealthy() {
        ServingStatus::NotServing
    } else {
        ServingStatus::Serving
    }
}

/// Run one probe; a panicking probe counts as unhealthy
async fn run_probe(name: &str, probe: &SharedProbe, ctx: &ProbeContext) -> HealthStatus {
    match AssertUnwindSafe(probe.check(ctx.clone())).catch_unwind().await {
        Ok(status) => {
            tracing::trace!(service = %name, ?status, "Health probe finished");
            status
        }
        Err(_) => {
            tracing::warn!(service = %name, "Health probe panicked, treating as unhealthy");
            HealthStatus::Unhealthy
        }
    }
}
