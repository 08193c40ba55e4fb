//! Quorum Health - background health and membership monitor for
//! etcd-compatible consensus stores
//!
//! A [`HealthMonitor`] loads TLS credentials once, keeps a membership
//! snapshot fresh from a background task, and answers health queries with an
//! independent probe read.
//!
//! ```no_run
//! use quorum_health::{HealthCheckConfig, HealthMonitor, RootPaths};
//!
//! # async fn run() -> Result<(), quorum_health::HealthError> {
//! let config = HealthCheckConfig::new(vec!["store-1:2379".to_string()]);
//! let monitor = HealthMonitor::start(config, RootPaths::default()).await?;
//!
//! monitor.healthy().await?;
//! println!("{} members", monitor.members().len());
//!
//! monitor.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod client_manager;
pub mod config;
pub mod credentials;
pub mod error;
pub mod monitor;
mod poller;
pub mod snapshot;
pub mod status;
mod ticker;

pub use client_manager::ClientManager;
pub use config::{
    HealthCheckConfig, HealthPolicy, MIN_REQUEST_TIMEOUT, MIN_RETRY_DELAY, RetryPolicy, RootPaths,
};
pub use credentials::load_credentials;
pub use error::{HealthError, ProbeStep};
pub use monitor::{HealthMonitor, LifecycleState};
pub use snapshot::MembershipSnapshot;
pub use status::HealthStatus;

pub use quorum_client::Member;
