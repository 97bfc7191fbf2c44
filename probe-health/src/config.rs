//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: PROBE_HEALTH_, nested keys separated by `__`)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/probe-health/{service_name}/config.toml
//! 4. System directory: /etc/probe-health/{service_name}/config.toml
//! 5. Default values
//!
//! Only the embedding server reads this. The health registry itself has no
//! configuration surface.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

const ENV_PREFIX: &str = "PROBE_HEALTH_";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// gRPC server configuration
    #[serde(default)]
    pub grpc: GrpcConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// gRPC server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrpcConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_grpc_port")]
    pub port: u16,

    /// Maximum message size in MB
    #[serde(default = "default_grpc_max_message_mb")]
    pub max_message_size_mb: usize,

    /// Server-side request timeout in seconds (0 disables it)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// TCP keepalive interval in seconds (0 disables keepalive)
    #[serde(default = "default_tcp_keepalive")]
    pub tcp_keepalive_secs: u64,
}

impl GrpcConfig {
    /// Resolve the socket address to bind
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("{}:{}", self.host, self.port)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Get max message size in bytes
    pub fn max_message_size_bytes(&self) -> usize {
        self.max_message_size_mb.saturating_mul(1024 * 1024)
    }

    /// Get request timeout, `None` when disabled
    ///
    /// Disabled by default: a timed-out call fails at the protocol level
    /// instead of answering with a serving status.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Get TCP keepalive interval, `None` when disabled
    pub fn tcp_keepalive(&self) -> Option<Duration> {
        (self.tcp_keepalive_secs > 0).then(|| Duration::from_secs(self.tcp_keepalive_secs))
    }
}

impl Default for GrpcConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_grpc_port(),
            max_message_size_mb: default_grpc_max_message_mb(),
            timeout_secs: default_timeout(),
            tcp_keepalive_secs: default_tcp_keepalive(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_grpc_port() -> u16 {
    50051
}

fn default_grpc_max_message_mb() -> usize {
    4 // 4 MB
}

fn default_timeout() -> u64 {
    0
}

fn default_tcp_keepalive() -> u64 {
    60
}

impl Config {
    /// Load configuration from all sources
    ///
    /// The service name is inferred from the binary name, falling back to
    /// `probe-health`.
    pub fn load() -> Result<Self> {
        let service_name = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "probe-health".to_string());

        Self::load_for_service(&service_name)
    }

    /// Load configuration for a specific service name
    pub fn load_for_service(service_name: &str) -> Result<Self> {
        let config_paths = Self::find_config_paths(service_name);

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut defaults = Config::default();
        defaults.service.name = service_name.to_string();

        let mut figment = Figment::new().merge(Serialized::defaults(defaults));

        // Lowest priority first so later files override earlier ones
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config = figment.extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Bypasses the XDG and system directories. Environment variables still
    /// take precedence over the file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// Candidate config file paths for a service, highest priority first
    fn find_config_paths(service_name: &str) -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix("probe-health");
        if let Some(path) = xdg_dirs.find_config_file(Path::new(service_name).join("config.toml")) {
            paths.push(path);
        }

        paths.push(
            PathBuf::from("/etc/probe-health")
                .join(service_name)
                .join("config.toml"),
        );

        paths
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "probe-health".to_string(),
                log_level: default_log_level(),
            },
            grpc: GrpcConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.name, "probe-health");
        assert_eq!(config.service.log_level, "info");
        assert_eq!(config.grpc.port, 50051);
        assert_eq!(config.grpc.max_message_size_bytes(), 4 * 1024 * 1024);
        assert_eq!(config.grpc.timeout(), None);
        assert_eq!(config.grpc.tcp_keepalive(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_socket_addr() {
        let grpc = GrpcConfig {
            host: "127.0.0.1".to_string(),
            port: 6000,
            ..GrpcConfig::default()
        };
        assert_eq!(grpc.socket_addr().unwrap(), "127.0.0.1:6000".parse().unwrap());
    }

    #[test]
    fn test_socket_addr_rejects_hostname() {
        let grpc = GrpcConfig {
            host: "localhost".to_string(),
            ..GrpcConfig::default()
        };
        assert!(matches!(grpc.socket_addr(), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn test_max_message_size_saturates() {
        let grpc = GrpcConfig {
            max_message_size_mb: usize::MAX,
            ..GrpcConfig::default()
        };
        assert_eq!(grpc.max_message_size_bytes(), usize::MAX);
    }

    #[test]
    fn test_keepalive_disabled() {
        let grpc = GrpcConfig {
            tcp_keepalive_secs: 0,
            ..GrpcConfig::default()
        };
        assert_eq!(grpc.tcp_keepalive(), None);
    }

    #[test]
    fn test_load_for_service_uses_service_name() {
        Jail::expect_with(|_jail| {
            let config = Config::load_for_service("inventory").expect("config loads");
            assert_eq!(config.service.name, "inventory");
            assert_eq!(config.grpc.port, 50051);
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [service]
                name = "inventory"
                log_level = "debug"

                [grpc]
                port = 7000
                timeout_secs = 5
                "#,
            )?;
            jail.set_env("PROBE_HEALTH_GRPC__PORT", "7100");

            let config = Config::load_for_service("inventory").expect("config loads");
            assert_eq!(config.service.log_level, "debug");
            assert_eq!(config.grpc.timeout(), Some(Duration::from_secs(5)));
            assert_eq!(config.grpc.port, 7100);
            Ok(())
        });
    }

    #[test]
    fn test_load_from_path() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "health.toml",
                r#"
                [service]
                name = "edge"

                [grpc]
                host = "127.0.0.1"
                "#,
            )?;

            let config = Config::load_from("health.toml").expect("config loads");
            assert_eq!(config.service.name, "edge");
            assert_eq!(config.grpc.host, "127.0.0.1");
            assert_eq!(config.grpc.max_message_size_mb, 4);
            Ok(())
        });
    }
}
