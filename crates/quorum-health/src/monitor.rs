//! Health monitor
//!
//! Owns the background membership refresh and answers on-demand health
//! queries with an independent probe read.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
};

use parking_lot::Mutex;
use quorum_client::{ClientFactory, HttpClientFactory, Member, StoreError};
use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    client_manager::ClientManager,
    config::{HealthCheckConfig, RootPaths},
    credentials::load_credentials,
    error::{ProbeStep, Result},
    poller::PollingLoop,
    snapshot::{self, MembershipSnapshot},
    status::HealthStatus,
    ticker::SnapshotTicker,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum LifecycleState {
    Initializing = 0,
    Running = 1,
    Stopped = 2,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::Initializing,
            1 => LifecycleState::Running,
            _ => LifecycleState::Stopped,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            LifecycleState::Initializing => "initializing",
            LifecycleState::Running => "running",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(state)
    }
}

pub struct HealthMonitor {
    config: HealthCheckConfig,
    clients: Arc<ClientManager>,
    snapshot: watch::Receiver<Arc<MembershipSnapshot>>,
    state: AtomicU8,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("endpoints", &self.config.endpoints)
            .field("tls", &self.clients.is_tls_enabled())
            .field("state", &self.state())
            .field("revision", &self.snapshot.borrow().revision)
            .finish()
    }
}

impl HealthMonitor {
    /// Load credentials and start the background refresh using the HTTP
    /// gateway client.
    ///
    /// Fails only when TLS is enabled and the credentials cannot be loaded;
    /// in that case no background task is started.
    pub async fn start(config: HealthCheckConfig, root: RootPaths) -> Result<Self> {
        Self::with_factory(config, root, Arc::new(HttpClientFactory)).await
    }

    /// Same as [`HealthMonitor::start`] with a custom client factory
    pub async fn with_factory(
        config: HealthCheckConfig,
        root: RootPaths,
        factory: Arc<dyn ClientFactory>,
    ) -> Result<Self> {
        info!(
            endpoints = ?config.endpoints,
            tls = config.is_tls_enabled(),
            "Starting store health monitor"
        );

        let tls = load_credentials(&config, &root)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to load store credentials"))?;

        let clients = Arc::new(ClientManager::new(&config, tls, factory));
        let (writer, reader) = snapshot::channel();
        let cancel = CancellationToken::new();

        let monitor = Self {
            snapshot: reader.clone(),
            clients: clients.clone(),
            state: AtomicU8::new(LifecycleState::Initializing as u8),
            cancel: cancel.clone(),
            tasks: Mutex::new(Vec::with_capacity(2)),
            config,
        };

        let poller = PollingLoop::new(&monitor.config, clients, writer, cancel.clone()).spawn();
        let ticker = SnapshotTicker::new(
            reader,
            monitor.config.check_interval(),
            monitor.config.stale_after(),
            cancel,
        )
        .spawn();
        monitor.tasks.lock().extend([poller, ticker]);

        monitor
            .state
            .store(LifecycleState::Running as u8, Ordering::Release);

        Ok(monitor)
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    pub fn config(&self) -> &HealthCheckConfig {
        &self.config
    }

    pub fn is_tls_enabled(&self) -> bool {
        self.clients.is_tls_enabled()
    }

    /// Probe the store once and report a tri-state verdict.
    ///
    /// Reads the health key through a fresh client; the membership snapshot
    /// is not consulted.
    pub async fn check(&self) -> HealthStatus {
        if self.state() == LifecycleState::Stopped {
            return HealthStatus::Unknown {
                step: ProbeStep::Lifecycle,
                reason: "health monitor is stopped".to_string(),
            };
        }

        let client = match self.clients.acquire_client(None) {
            Ok(client) => client,
            Err(e) => {
                debug!(error = %e, "Health probe could not acquire a client");
                return HealthStatus::Unknown {
                    step: ProbeStep::AcquireClient,
                    reason: e.to_string(),
                };
            }
        };

        let timeout = self.config.request_timeout();
        let outcome = tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                return HealthStatus::Unknown {
                    step: ProbeStep::Lifecycle,
                    reason: "health monitor stopped during probe".to_string(),
                };
            }
            outcome = tokio::time::timeout(timeout, client.range(&self.config.health_key)) => outcome,
        };

        let status = match outcome {
            Ok(Ok(_)) => HealthStatus::Healthy,
            // Access control rejected the read, so the store is serving
            Ok(Err(e)) if e.is_permission_denied() => HealthStatus::Healthy,
            Ok(Err(e)) if e.is_store_response() => HealthStatus::Unhealthy {
                step: ProbeStep::Probe,
                reason: e.to_string(),
            },
            Ok(Err(e)) => HealthStatus::Unknown {
                step: ProbeStep::Probe,
                reason: e.to_string(),
            },
            Err(_) => HealthStatus::Unknown {
                step: ProbeStep::Probe,
                reason: StoreError::Timeout(timeout).to_string(),
            },
        };

        if !status.is_healthy() {
            debug!(status = ?status, "Health probe did not pass");
        }
        status
    }

    /// Pass/fail health under the configured policy.
    ///
    /// Undetermined health is `Ok(())` when fail-open (the default) and an
    /// error when fail-closed. A store error response is always an error.
    pub async fn healthy(&self) -> Result<()> {
        self.check().await.into_result(self.config.policy)
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<MembershipSnapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn members(&self) -> Vec<Member> {
        self.snapshot.borrow().members.clone()
    }

    /// Receiver notified on every snapshot replacement
    pub fn subscribe(&self) -> watch::Receiver<Arc<MembershipSnapshot>> {
        self.snapshot.clone()
    }

    /// Stop background activity. Idempotent; in-flight work is abandoned at
    /// its next suspension point.
    pub fn stop(&self) {
        let previous = self
            .state
            .swap(LifecycleState::Stopped as u8, Ordering::AcqRel);
        if LifecycleState::from_u8(previous) != LifecycleState::Stopped {
            self.cancel.cancel();
            info!("Store health monitor stopped");
        }
    }

    /// Stop and wait for the background tasks to finish
    pub async fn shutdown(&self) {
        self.stop();

        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Health monitor task ended abnormally");
            }
        }
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
