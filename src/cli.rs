//! Command-line interface of the proxy binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{read_config, ConfigError};
use crate::config::validation::validate_config;
use crate::config::{BackendConfig, LogFormat, ProxyConfig};

#[derive(Debug, Parser)]
#[command(name = "lb-proxy", version)]
#[command(about = "Round-robin HTTP load balancer with active health checks", long_about = None)]
pub struct Cli {
    /// TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Listen port, keeping the configured host
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Backend base URL; repeat to replace the configured list
    #[arg(short = 'b', long = "backend", value_name = "URL")]
    pub backends: Vec<String>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Read the configuration, apply overrides, and validate the result.
    pub fn load_config(&self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };
        self.apply_overrides(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut ProxyConfig) {
        if let Some(port) = self.port {
            config.listener.bind_address = match config.listener.bind_address.parse::<SocketAddr>() {
                Ok(mut addr) => {
                    addr.set_port(port);
                    addr.to_string()
                }
                Err(_) => format!("0.0.0.0:{}", port),
            };
        }
        if !self.backends.is_empty() {
            config.backends = self.backends.iter().map(BackendConfig::new).collect();
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_gives_defaults() {
        let cli = Cli::parse_from(["lb-proxy"]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
        assert_eq!(config.backends.len(), 5);
    }

    #[test]
    fn overrides_port_and_backends() {
        let cli = Cli::parse_from([
            "lb-proxy",
            "--port",
            "9000",
            "-b",
            "http://10.0.0.1:5001",
            "--backend",
            "http://10.0.0.2:5001",
            "--log-format",
            "json",
        ]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:9000");
        assert_eq!(
            config.backends,
            vec![
                BackendConfig::new("http://10.0.0.1:5001"),
                BackendConfig::new("http://10.0.0.2:5001"),
            ]
        );
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_backend_flag_fails_validation() {
        let cli = Cli::parse_from(["lb-proxy", "-b", "https://secure:443"]);
        assert!(matches!(cli.load_config(), Err(ConfigError::Validation(_))));
    }
}
