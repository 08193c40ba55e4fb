//! Membership polling loop
//!
//! One task per monitor: connect, list members, publish, repeat. Failures
//! never end the loop, only cancellation does.

use std::{sync::Arc, time::Duration};

use quorum_client::{Member, StoreError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    client_manager::ClientManager,
    config::{HealthCheckConfig, RetryPolicy},
    error::{HealthError, Result},
    snapshot::SnapshotWriter,
};

/// A failure streak is re-announced at warn level every this many attempts
const WARN_EVERY_N_FAILURES: u32 = 12;

pub(crate) struct PollingLoop {
    clients: Arc<ClientManager>,
    snapshot: SnapshotWriter,
    retry: RetryPolicy,
    request_timeout: Duration,
    refresh_interval: Duration,
    cancel: CancellationToken,
}

impl PollingLoop {
    pub(crate) fn new(
        config: &HealthCheckConfig,
        clients: Arc<ClientManager>,
        snapshot: SnapshotWriter,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            clients,
            snapshot,
            retry: config.retry,
            request_timeout: config.request_timeout(),
            refresh_interval: config.refresh_interval(),
            cancel,
        }
    }

    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        info!(
            endpoints = ?self.clients.endpoints(),
            tls = self.clients.is_tls_enabled(),
            "Membership polling loop started"
        );

        let mut failures: u32 = 0;

        loop {
            match self.refresh_once().await {
                Ok(members) => {
                    if failures > 0 {
                        info!(
                            failed_attempts = failures,
                            "Membership refresh recovered"
                        );
                    }
                    failures = 0;

                    let snapshot = self.snapshot.publish(members);
                    debug!(
                        revision = snapshot.revision,
                        members = snapshot.members.len(),
                        "Membership snapshot replaced"
                    );

                    if !self.refresh_interval.is_zero() && !self.pause(self.refresh_interval).await
                    {
                        break;
                    }
                }
                Err(HealthError::Cancelled) => break,
                Err(e) => {
                    let delay = self.retry.delay_for(failures);
                    failures = failures.saturating_add(1);

                    if failures == 1 || failures % WARN_EVERY_N_FAILURES == 0 {
                        warn!(
                            error = %e,
                            consecutive_failures = failures,
                            retry_in = ?delay,
                            "Membership refresh failed, will keep retrying"
                        );
                    } else {
                        debug!(
                            error = %e,
                            consecutive_failures = failures,
                            retry_in = ?delay,
                            "Membership refresh still failing"
                        );
                    }

                    if !self.pause(delay).await {
                        break;
                    }
                }
            }
        }

        info!("Membership polling loop stopped");
    }

    /// One connect + list cycle. The client is dropped when this returns,
    /// whatever the outcome.
    async fn refresh_once(&self) -> Result<Vec<Member>> {
        if self.cancel.is_cancelled() {
            return Err(HealthError::Cancelled);
        }

        let client = self.clients.acquire_client(None)?;

        let outcome = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(HealthError::Cancelled),
            outcome = tokio::time::timeout(self.request_timeout, client.member_list()) => outcome,
        };

        let response = outcome.map_err(|_| StoreError::Timeout(self.request_timeout))??;
        Ok(response.members)
    }

    /// Sleep for `duration`; returns false if cancelled first
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(duration) => true,
        }
    }
}
