//! Membership snapshot
//!
//! The polling loop is the only writer. It publishes a whole new snapshot
//! through a `watch` channel, so readers never see a partial update and a
//! failed refresh leaves the previous snapshot in place.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use quorum_client::Member;
use serde::Serialize;
use tokio::{sync::watch, time::Instant};

/// Cluster membership as of the last successful refresh
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipSnapshot {
    pub members: Vec<Member>,
    /// Number of successful refreshes so far; 0 means never refreshed
    pub revision: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    refreshed_instant: Option<Instant>,
}

impl MembershipSnapshot {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn has_refreshed(&self) -> bool {
        self.revision > 0
    }

    /// Time since the refresh that produced this snapshot
    pub fn age(&self) -> Option<Duration> {
        self.refreshed_instant.map(|at| at.elapsed())
    }
}

/// Write half, owned by the polling loop
#[derive(Debug)]
pub(crate) struct SnapshotWriter {
    sender: watch::Sender<Arc<MembershipSnapshot>>,
}

pub(crate) fn channel() -> (SnapshotWriter, watch::Receiver<Arc<MembershipSnapshot>>) {
    let (sender, receiver) = watch::channel(Arc::new(MembershipSnapshot::default()));
    (SnapshotWriter { sender }, receiver)
}

impl SnapshotWriter {
    /// Replace the current snapshot with `members`
    pub(crate) fn publish(&self, members: Vec<Member>) -> Arc<MembershipSnapshot> {
        let revision = self.sender.borrow().revision + 1;
        let snapshot = Arc::new(MembershipSnapshot {
            members,
            revision,
            refreshed_at: Some(Utc::now()),
            refreshed_instant: Some(Instant::now()),
        });

        // send_replace keeps the value even when every receiver is gone
        self.sender.send_replace(snapshot.clone());
        snapshot
    }
}
