//! # probe-health
//!
//! gRPC health checking (`grpc.health.v1.Health`) backed by named health
//! probes registered by the embedding server.
//!
//! ## Features
//!
//! - **Pluggable probes**: anything implementing [`HealthProbe`](probe::HealthProbe),
//!   including async closures, one per sub-service
//! - **Aggregate checks**: an empty service name fails if any probe reports unhealthy
//! - **Per-service checks**: unregistered names answer `UNKNOWN`
//! - **Cancellation**: probes receive a context cancelled when the call ends,
//!   carrying the caller's `grpc-timeout` deadline
//! - **Concurrent registration**: probes can be added while queries are running
//! - **Watch**: intentionally unsupported, answers `UNIMPLEMENTED`
//!
//! ## Example
//!
//! ```rust,no_run
//! use probe_health::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Load configuration
//!     let config = Config::load()?;
//!
//!     // Initialize tracing
//!     init_tracing(&config)?;
//!
//!     // Register probes
//!     let health = HealthService::new();
//!     health.add_probe("db", |_ctx: ProbeContext| async { HealthStatus::Healthy });
//!
//!     // Run server
//!     GrpcServer::new(config.grpc, health).serve().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod grpc;
pub mod health;
pub mod observability;
pub mod probe;
pub mod registry;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, GrpcConfig, ServiceConfig};
    pub use crate::error::{Error, Result};
    pub use crate::grpc::{GrpcServer, ServingStatus};
    pub use crate::health::HealthService;
    pub use crate::observability::init_tracing;
    pub use crate::probe::{HealthProbe, HealthStatus, ProbeContext};
    pub use crate::registry::{ProbeRegistry, SharedProbe};

    pub use async_trait::async_trait;
}
