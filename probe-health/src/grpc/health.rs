//! gRPC health check service
//!
//! Implements the standard gRPC health checking protocol.
//! See: https://github.com/grpc/grpc/blob/master/doc/health-checking.md
//!
//! `Check` is answered from the probe registry. `Watch` is not supported and
//! always fails with `UNIMPLEMENTED`.

use futures::stream::BoxStream;
use std::time::Duration;
use tonic::{Request, Response, Status};

use super::pb::health_server::Health;
use super::pb::{HealthCheckRequest, HealthCheckResponse};
use crate::health::HealthService;
use crate::probe::ProbeContext;

const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

#[tonic::async_trait]
impl Health for HealthService {
    async fn check(
        &self,
        request: Request<HealthCheckRequest>,
    ) -> std::result::Result<Response<HealthCheckResponse>, Status> {
        let ctx = probe_context(&request);
        // Cancels the probe context when the call ends or tonic drops it
        let _cancel_on_drop = ctx.cancellation_token().clone().drop_guard();

        let service = request.into_inner().service;
        let status = self.check_service(&ctx, &service).await;

        tracing::debug!(service = %service, status = status.as_str_name(), "Health check answered");

        Ok(Response::new(HealthCheckResponse {
            status: status as i32,
        }))
    }

    type WatchStream = BoxStream<'static, std::result::Result<HealthCheckResponse, Status>>;

    async fn watch(
        &self,
        request: Request<HealthCheckRequest>,
    ) -> std::result::Result<Response<Self::WatchStream>, Status> {
        tracing::debug!(service = %request.get_ref().service, "Rejecting health watch");
        Err(Status::unimplemented("method Watch not implemented"))
    }
}

/// Build the probe context for an incoming call, honouring `grpc-timeout`
pub fn probe_context<T>(request: &Request<T>) -> ProbeContext {
    let timeout = request
        .metadata()
        .get(GRPC_TIMEOUT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_grpc_timeout);

    match timeout {
        Some(timeout) => ProbeContext::new().with_timeout(timeout),
        None => ProbeContext::new(),
    }
}

/// Parse a `grpc-timeout` value: at most 8 digits followed by a unit
/// (`H`, `M`, `S`, `m`, `u` or `n`)
fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if !value.is_ascii() || value.len() < 2 {
        return None;
    }

    let (digits, unit) = value.split_at(value.len() - 1);
    if digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;

    let timeout = match unit {
        "H" => Duration::from_secs(amount * 60 * 60),
        "M" => Duration::from_secs(amount * 60),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return None,
    };
    Some(timeout)
}
