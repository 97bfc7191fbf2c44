//! Health probes and the context they run in
//!
//! A probe answers one question for one named sub-service: can it serve
//! traffic right now? Probes are opaque to this crate. Anything implementing
//! [`HealthProbe`] qualifies, including plain async closures:
//!
//! ```rust,no_run
//! use probe_health::prelude::*;
//!
//! let health = HealthService::new();
//! health.add_probe("cache", |_ctx: ProbeContext| async { HealthStatus::Healthy });
//! ```

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Verdict reported by a probe
///
/// `Unknown` is the zero value. Probes may return it, and it counts as
/// serving: only `Unhealthy` fails a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HealthStatus {
    /// Not classified
    #[default]
    Unknown,
    /// Able to serve traffic
    Healthy,
    /// Not able to serve traffic
    Unhealthy,
}

impl HealthStatus {
    /// Whether this verdict fails a health check
    pub fn is_unhealthy(self) -> bool {
        matches!(self, HealthStatus::Unhealthy)
    }
}

/// Cancellable context handed to every probe invocation
///
/// Cloning is cheap and clones share cancellation. The token is cancelled when
/// the request that created the context finishes or is dropped. The deadline,
/// when set, mirrors the caller's `grpc-timeout`. Neither is enforced here:
/// probes doing I/O are expected to watch [`ProbeContext::done`].
#[derive(Debug, Clone, Default)]
pub struct ProbeContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl ProbeContext {
    /// Context with a fresh token and no deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// Context driven by an existing cancellation token
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Set an absolute deadline
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The caller's deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` without a deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// The underlying cancellation token
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the context was cancelled or its deadline has passed
    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || self.remaining() == Some(Duration::ZERO)
    }

    /// Resolves once the context is cancelled or its deadline passes
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancel.cancelled().await,
        }
    }
}

/// A named service's health check
///
/// Invoked fresh on every query; results are never cached.
#[async_trait]
pub trait HealthProbe: Send + Sync + 'static {
    /// Report the current health of the service
    async fn check(&self, ctx: ProbeContext) -> HealthStatus;
}

#[async_trait]
impl<F, Fut> HealthProbe for F
where
    F: Fn(ProbeContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HealthStatus> + Send + 'static,
{
    async fn check(&self, ctx: ProbeContext) -> HealthStatus {
        (self)(ctx).await
    }
}

/// A fixed verdict, mostly useful for static services and tests
#[async_trait]
impl HealthProbe for HealthStatus {
    async fn check(&self, _ctx: ProbeContext) -> HealthStatus {
        *self
    }
}
