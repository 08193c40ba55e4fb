//! Periodic snapshot inspection
//!
//! Reports the current membership and flags a snapshot that has not been
//! refreshed for too long. Makes no network calls.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::snapshot::MembershipSnapshot;

pub(crate) struct SnapshotTicker {
    snapshot: watch::Receiver<Arc<MembershipSnapshot>>,
    check_interval: Duration,
    stale_after: Duration,
    started_at: Instant,
    cancel: CancellationToken,
}

impl SnapshotTicker {
    pub(crate) fn new(
        snapshot: watch::Receiver<Arc<MembershipSnapshot>>,
        check_interval: Duration,
        stale_after: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            snapshot,
            check_interval,
            stale_after,
            started_at: Instant::now(),
            cancel,
        }
    }

    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let mut interval =
            tokio::time::interval_at(self.started_at + self.check_interval, self.check_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut stale = false;

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                _ = interval.tick() => {
                    stale = self.inspect(stale);
                }
            }
        }

        debug!("Snapshot ticker stopped");
    }

    /// Returns whether the snapshot is currently stale
    fn inspect(&self, was_stale: bool) -> bool {
        let snapshot = self.snapshot.borrow().clone();
        let age = snapshot
            .age()
            .unwrap_or_else(|| self.started_at.elapsed());

        debug!(
            revision = snapshot.revision,
            members = snapshot.members.len(),
            age = ?age,
            "Membership snapshot"
        );

        let stale = age > self.stale_after;
        if stale && !was_stale {
            warn!(
                revision = snapshot.revision,
                age = ?age,
                stale_after = ?self.stale_after,
                "Membership snapshot is stale"
            );
        } else if !stale && was_stale {
            info!(revision = snapshot.revision, "Membership snapshot is fresh again");
        }

        stale
    }
}
