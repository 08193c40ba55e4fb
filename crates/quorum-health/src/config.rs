//! Health check configuration
//!
//! Durations are plain millisecond integers so the struct maps directly onto
//! YAML files and environment variables.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use quorum_client::TlsFiles;
use serde::{Deserialize, Serialize};

/// Default client certificate, relative to the certificate root
pub const DEFAULT_CERT_FILE: &str = "apiserver-etcd-client.crt";
/// Default client key, relative to the certificate root
pub const DEFAULT_KEY_FILE: &str = "apiserver-etcd-client.key";
/// Default CA bundle, relative to the certificate root
pub const DEFAULT_CA_FILE: &str = "etcd/ca.crt";
/// Key read by the liveness probe
pub const DEFAULT_HEALTH_KEY: &str = "health";

/// Floor for retry delays, so a zero in the config cannot spin the loop
pub const MIN_RETRY_DELAY: Duration = Duration::from_millis(100);
/// Floor for request and connect deadlines
pub const MIN_REQUEST_TIMEOUT: Duration = Duration::from_millis(100);

/// How a health determination that could not be completed is reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthPolicy {
    /// Undetermined health is reported as healthy
    #[default]
    FailOpen,
    /// Undetermined health is reported as an error
    FailClosed,
}

/// Delay between failed refresh attempts.
///
/// The n-th consecutive failure waits `initial * multiplier^n`, capped at
/// `max`. With the default multiplier of 1.0 the delay is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub initial_ms: u64,
    pub max_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_ms: 5_000,
            max_ms: 60_000,
            multiplier: 1.0,
        }
    }
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        let ms = delay.as_millis() as u64;
        Self {
            initial_ms: ms,
            max_ms: ms,
            multiplier: 1.0,
        }
    }

    pub fn exponential(initial: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            initial_ms: initial.as_millis() as u64,
            max_ms: max.as_millis() as u64,
            multiplier,
        }
    }

    /// Delay to wait after `consecutive_failures` earlier failures in a row,
    /// never shorter than [`MIN_RETRY_DELAY`]
    pub fn delay_for(&self, consecutive_failures: u32) -> Duration {
        let floor = MIN_RETRY_DELAY.as_millis() as u64;
        let initial_ms = self.initial_ms.max(floor);
        let initial = initial_ms as f64;
        let max = self.max_ms.max(initial_ms) as f64;
        let multiplier = if self.multiplier.is_finite() && self.multiplier > 1.0 {
            self.multiplier
        } else {
            1.0
        };

        let exponent = consecutive_failures.min(i32::MAX as u32) as i32;
        let delay = (initial * multiplier.powi(exponent)).min(max);
        Duration::from_millis(delay as u64)
    }
}

/// Directories credential paths are resolved against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootPaths {
    pub cert_root_dir: PathBuf,
}

impl Default for RootPaths {
    fn default() -> Self {
        Self {
            cert_root_dir: PathBuf::from("/var/lib/quorum/pki"),
        }
    }
}

impl RootPaths {
    pub fn new(cert_root_dir: impl Into<PathBuf>) -> Self {
        Self {
            cert_root_dir: cert_root_dir.into(),
        }
    }

    /// Absolute paths are kept, relative ones are joined onto the cert root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cert_root_dir.join(path)
        }
    }
}

/// Immutable description of how to reach and probe the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Use client-certificate TLS for every connection
    pub tls_enabled: bool,
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
    pub ca_file: PathBuf,
    /// Store endpoints, `host:port` or full URLs
    pub endpoints: Vec<String>,
    /// Key read by the liveness probe
    pub health_key: String,
    /// Deadline for every store request (member list, probe)
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub retry: RetryPolicy,
    /// Pause after a successful refresh; zero refreshes continuously
    pub refresh_interval_ms: u64,
    /// Period of the auxiliary snapshot check
    pub check_interval_ms: u64,
    /// Snapshot age that triggers a warning (default: 3 check intervals)
    pub stale_after_ms: Option<u64>,
    pub policy: HealthPolicy,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            tls_enabled: false,
            cert_file: PathBuf::from(DEFAULT_CERT_FILE),
            key_file: PathBuf::from(DEFAULT_KEY_FILE),
            ca_file: PathBuf::from(DEFAULT_CA_FILE),
            endpoints: vec!["127.0.0.1:2379".to_string()],
            health_key: DEFAULT_HEALTH_KEY.to_string(),
            request_timeout_ms: 10_000,
            connect_timeout_ms: 5_000,
            retry: RetryPolicy::default(),
            refresh_interval_ms: 0,
            check_interval_ms: 15_000,
            stale_after_ms: None,
            policy: HealthPolicy::FailOpen,
        }
    }
}

impl HealthCheckConfig {
    /// Plain-transport config for the given endpoints
    pub fn new(endpoints: Vec<String>) -> Self {
        Self {
            endpoints,
            ..Default::default()
        }
    }

    pub fn with_tls(mut self, enabled: bool) -> Self {
        self.tls_enabled = enabled;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_policy(mut self, policy: HealthPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn is_tls_enabled(&self) -> bool {
        self.tls_enabled
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms).max(MIN_REQUEST_TIMEOUT)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms).max(MIN_REQUEST_TIMEOUT)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms.max(1))
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.check_interval() * 3)
    }

    /// Credential file locations resolved against the certificate root
    pub fn tls_files(&self, root: &RootPaths) -> TlsFiles {
        TlsFiles {
            cert_file: root.resolve(&self.cert_file),
            key_file: root.resolve(&self.key_file),
            ca_file: root.resolve(&self.ca_file),
        }
    }
}
