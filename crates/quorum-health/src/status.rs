//! Tri-state health verdict and its mapping onto the configured policy

use serde::Serialize;

use crate::{
    config::HealthPolicy,
    error::{HealthError, ProbeStep},
};

/// Outcome of a single health probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HealthStatus {
    /// The store answered the probe read
    Healthy,
    /// The store answered with an error
    Unhealthy { step: ProbeStep, reason: String },
    /// No answer from the store; health could not be determined
    Unknown { step: ProbeStep, reason: String },
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, HealthStatus::Unknown { .. })
    }

    pub fn step(&self) -> Option<ProbeStep> {
        match self {
            HealthStatus::Healthy => None,
            HealthStatus::Unhealthy { step, .. } | HealthStatus::Unknown { step, .. } => {
                Some(*step)
            }
        }
    }

    /// Collapse the verdict into a pass/fail result under `policy`
    pub fn into_result(self, policy: HealthPolicy) -> Result<(), HealthError> {
        match self {
            HealthStatus::Healthy => Ok(()),
            HealthStatus::Unhealthy { step, reason } => {
                Err(HealthError::Unhealthy { step, reason })
            }
            HealthStatus::Unknown { step, reason } => match policy {
                HealthPolicy::FailOpen => Ok(()),
                HealthPolicy::FailClosed => Err(HealthError::Undetermined { step, reason }),
            },
        }
    }
}
