//! Quorum status server
//!
//! Runs a [`quorum_health::HealthMonitor`] and exposes its verdicts and the
//! membership snapshot over HTTP.

pub mod api;
pub mod config;
pub mod startup;
