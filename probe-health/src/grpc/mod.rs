//! gRPC surface of the health service
//!
//! The `grpc.health.v1.Health` types come from `tonic-health`.
//! [`HealthService`](crate::health::HealthService) implements the generated
//! trait in [`health`], and [`GrpcServer`] serves it over tonic.
//!
//! ## Example
//!
//! ```rust,no_run
//! use probe_health::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let config = Config::load()?;
//! let health = HealthService::new();
//! health.add_probe("db", HealthStatus::Healthy);
//!
//! GrpcServer::new(config.grpc, health).serve().await?;
//! # Ok(())
//! # }
//! ```

pub mod health;
pub mod server;

/// Generated `grpc.health.v1` messages, client and server
pub use tonic_health::pb;

// Re-exports
pub use server::GrpcServer;

pub use pb::health_check_response::ServingStatus;
pub use pb::health_client::HealthClient;
pub use pb::health_server::{Health, HealthServer};
pub use pb::{HealthCheckRequest, HealthCheckResponse};

// Re-export tonic types for convenience
pub use tonic::{Code, Request, Response, Status};
