//! Error types for the health monitor

use std::fmt;

use quorum_client::{ClientError, StoreError, TlsError};
use serde::Serialize;

/// Stage of a health determination that produced a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStep {
    /// The monitor was not running
    Lifecycle,
    /// Building a client for the probe
    AcquireClient,
    /// Reading the health key
    Probe,
}

impl fmt::Display for ProbeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            ProbeStep::Lifecycle => "monitor lifecycle",
            ProbeStep::AcquireClient => "client acquisition",
            ProbeStep::Probe => "health key read",
        };
        f.write_str(step)
    }
}

/// Health monitor errors
#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    /// TLS material could not be loaded; fatal at construction
    #[error("credential error: {0}")]
    Credential(#[from] TlsError),

    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error("network error: {0}")]
    Network(#[from] StoreError),

    #[error("operation cancelled")]
    Cancelled,

    /// The store answered and reported a failure
    #[error("store unhealthy during {step}: {reason}")]
    Unhealthy { step: ProbeStep, reason: String },

    /// Health could not be determined and the policy is fail-closed
    #[error("store health undetermined during {step}: {reason}")]
    Undetermined { step: ProbeStep, reason: String },
}

impl HealthError {
    pub fn is_credential(&self) -> bool {
        matches!(self, HealthError::Credential(_))
    }

    /// Step that produced a health verdict, if this is one
    pub fn step(&self) -> Option<ProbeStep> {
        match self {
            HealthError::Unhealthy { step, .. } | HealthError::Undetermined { step, .. } => {
                Some(*step)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HealthError>;
