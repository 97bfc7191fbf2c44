//! Probe Server Example
//!
//! This example demonstrates:
//! - Registering a stateful probe object and a closure probe
//! - Probes honouring the request context (cancellation and deadline)
//! - Serving `grpc.health.v1.Health` with configuration from figment
//!
//! Run with: cargo run --example probe-server
//!
//! Test with (requires grpcurl):
//!   grpcurl -plaintext -import-path proto -proto health.proto localhost:50051 grpc.health.v1.Health/Check
//!   grpcurl -plaintext -import-path proto -proto health.proto -d '{"service":"upstream"}' \
//!     localhost:50051 grpc.health.v1.Health/Check

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use probe_health::prelude::*;
use tokio::net::TcpStream;

/// Reports healthy while a TCP connection to `addr` can be opened
struct TcpProbe {
    addr: String,
    connect_timeout: Duration,
}

#[async_trait]
impl HealthProbe for TcpProbe {
    async fn check(&self, ctx: ProbeContext) -> HealthStatus {
        let timeout = ctx
            .remaining()
            .map_or(self.connect_timeout, |remaining| remaining.min(self.connect_timeout));

        tokio::select! {
            _ = ctx.done() => HealthStatus::Unhealthy,
            result = tokio::time::timeout(timeout, TcpStream::connect(&self.addr)) => match result {
                Ok(Ok(_)) => HealthStatus::Healthy,
                Ok(Err(e)) => {
                    tracing::warn!(addr = %self.addr, error = %e, "Upstream unreachable");
                    HealthStatus::Unhealthy
                }
                Err(_) => HealthStatus::Unhealthy,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load_for_service("probe-server")?;
    init_tracing(&config)?;

    let health = HealthService::new();

    health.add_probe(
        "upstream",
        TcpProbe {
            addr: "127.0.0.1:5432".to_string(),
            connect_timeout: Duration::from_secs(2),
        },
    );

    // Flipped by the application once its caches are warm
    let warmed_up = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&warmed_up);
    health.add_probe("cache", move |_ctx: ProbeContext| {
        let ready = flag.load(Ordering::Relaxed);
        async move {
            if ready {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unknown
            }
        }
    });

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        warmed_up.store(true, Ordering::Relaxed);
        tracing::info!("Cache warm-up complete");
    });

    GrpcServer::new(config.grpc, health).serve().await
}
