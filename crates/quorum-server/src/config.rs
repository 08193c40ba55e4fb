//! Configuration management for the quorum server
//!
//! Sources are layered, later ones winning:
//! 1. the YAML file (`conf/quorum.yml` unless `--config` is given)
//! 2. `QUORUM_*` environment variables, `__` separating nested keys
//!    (`QUORUM_HEALTH__TLS_ENABLED=true`)
//! 3. command line flags

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use config::{Config, ConfigError, Environment};
use quorum_health::{HealthCheckConfig, RootPaths};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "conf/quorum.yml";
pub const ENV_PREFIX: &str = "QUORUM";

/// Command line arguments for the server
#[derive(Debug, Default, Parser)]
#[command(
    name = "quorum",
    version,
    about = "Health and membership monitor for etcd-compatible stores"
)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'c', long = "config", env = "QUORUM_CONFIG")]
    pub config: Option<PathBuf>,
    /// Store endpoints, comma separated
    #[arg(long = "endpoints", value_delimiter = ',')]
    pub endpoints: Option<Vec<String>>,
    /// Directory relative credential paths are resolved against
    #[arg(long = "cert-root")]
    pub cert_root: Option<PathBuf>,
    /// Use client-certificate TLS towards the store
    #[arg(long = "tls")]
    pub tls: Option<bool>,
    /// Status server listen address
    #[arg(long = "listen")]
    pub listen: Option<String>,
}

/// Status HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub listen: String,
    pub workers: usize,
    pub shutdown_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:9437".to_string(),
            workers: 2,
            shutdown_timeout_ms: 10_000,
        }
    }
}

impl HttpConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

/// Log output settings as written in the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub dir: Option<PathBuf>,
    pub level: String,
    pub console: bool,
    pub file: bool,
    pub rotation: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            dir: None,
            level: "info".to_string(),
            console: true,
            file: false,
            rotation: "daily".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub health: HealthCheckConfig,
    pub root: RootPaths,
    pub http: HttpConfig,
    pub logging: LogSettings,
}

impl ServerConfig {
    /// Load configuration from the file, the process environment and `cli`
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        Self::load_with_env(cli, default_environment())
    }

    pub fn load_with_env(cli: &Cli, env: Environment) -> Result<Self, ConfigError> {
        let (path, required) = match &cli.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let mut builder = Config::builder()
            .add_source(config::File::from(path).required(required))
            .add_source(env);

        if let Some(endpoints) = &cli.endpoints {
            builder = builder.set_override("health.endpoints", endpoints.clone())?;
        }
        if let Some(cert_root) = &cli.cert_root {
            builder = builder.set_override(
                "root.cert_root_dir",
                cert_root.to_string_lossy().into_owned(),
            )?;
        }
        if let Some(tls) = cli.tls {
            builder = builder.set_override("health.tls_enabled", tls)?;
        }
        if let Some(listen) = &cli.listen {
            builder = builder.set_override("http.listen", listen.clone())?;
        }

        builder.build()?.try_deserialize()
    }
}

/// `QUORUM_*` environment source; endpoint lists are comma separated
pub fn default_environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("health.endpoints")
}
