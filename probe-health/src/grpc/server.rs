//! gRPC server implementation

use std::future::Future;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::server::Router;
use tonic::transport::Server;

use crate::config::GrpcConfig;
use crate::error::Result;
use crate::health::HealthService;

/// gRPC server hosting the health service
///
/// Applies the configured keepalive and message size limits, plus the request
/// timeout when one is configured, then serves `grpc.health.v1.Health` until
/// shut down.
#[derive(Debug)]
pub struct GrpcServer {
    config: GrpcConfig,
    health: HealthService,
}

impl GrpcServer {
    /// Create a new gRPC server with the given configuration
    pub fn new(config: GrpcConfig, health: HealthService) -> Self {
        Self { config, health }
    }

    /// The health service being served
    ///
    /// Probes registered through this handle (or any clone of it) are visible
    /// to queries immediately, including after the server has started.
    pub fn health(&self) -> &HealthService {
        &self.health
    }

    /// Get the configuration
    pub fn config(&self) -> &GrpcConfig {
        &self.config
    }

    /// Build the tonic router with the health service mounted
    fn router(&self) -> Router {
        let max_message_size = self.config.max_message_size_bytes();
        let service = self
            .health
            .clone()
            .into_server()
            .max_decoding_message_size(max_message_size)
            .max_encoding_message_size(max_message_size);

        let mut builder = Server::builder().tcp_keepalive(self.config.tcp_keepalive());
        if let Some(timeout) = self.config.timeout() {
            builder = builder.timeout(timeout);
        }

        builder.add_service(service)
    }

    /// Bind the configured address and serve until SIGINT or SIGTERM
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.socket_addr()?;

        tracing::info!(
            %addr,
            services = ?self.health.services(),
            "Starting gRPC health server"
        );

        self.router()
            .serve_with_shutdown(addr, shutdown_signal())
            .await?;

        tracing::info!("gRPC server shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until `signal` resolves
    ///
    /// Configured TCP keepalive does not apply here; the listener's own
    /// socket options are used as-is.
    pub async fn serve_with_listener<F>(self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let addr = listener.local_addr()?;

        tracing::info!(
            %addr,
            services = ?self.health.services(),
            "Starting gRPC health server"
        );

        self.router()
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), signal)
            .await?;

        tracing::info!("gRPC server shutdown complete");
        Ok(())
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::HealthStatus;

    #[test]
    fn test_server_creation() {
        let config = GrpcConfig::default();
        let health = HealthService::new();
        health.add_probe("db", HealthStatus::Healthy);

        let server = GrpcServer::new(config.clone(), health);
        assert_eq!(server.config().port, config.port);
        assert_eq!(server.health().services(), vec!["db"]);
    }

    #[tokio::test]
    async fn test_serve_rejects_invalid_host() {
        let config = GrpcConfig {
            host: "not an address".to_string(),
            ..GrpcConfig::default()
        };
        let result = GrpcServer::new(config, HealthService::new()).serve().await;
        assert!(matches!(result, Err(crate::error::Error::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_serve_with_listener_stops_on_signal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = GrpcServer::new(GrpcConfig::default(), HealthService::new());

        let result = server.serve_with_listener(listener, async {}).await;
        assert!(result.is_ok());
    }
}
