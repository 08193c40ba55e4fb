//! Client seams
//!
//! `StoreClient` is the narrow view of the store the health monitor needs.
//! `ClientFactory` builds fresh clients so callers can drop a failed client
//! and start over instead of repairing it in place.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
    error::{ClientError, Result},
    model::{MemberListResponse, RangeResponse},
    tls::TlsContext,
};

/// Settings a factory needs to build one client
#[derive(Clone, Debug)]
pub struct StoreClientConfig {
    /// Endpoint base URLs, already normalized
    pub endpoints: Vec<String>,
    /// Shared TLS material; `None` means plain transport
    pub tls: Option<Arc<TlsContext>>,
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
    /// Whole-request timeout enforced by the transport
    pub request_timeout: Duration,
}

impl StoreClientConfig {
    pub fn new(endpoints: Vec<String>) -> Self {
        Self {
            endpoints,
            tls: None,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_tls(mut self, tls: Option<Arc<TlsContext>>) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }
}

/// Operations issued against a consensus store
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Endpoints this client talks to, in failover order
    fn endpoints(&self) -> &[String];

    /// List the current cluster members
    async fn member_list(&self) -> Result<MemberListResponse>;

    /// Read a single key
    async fn range(&self, key: &str) -> Result<RangeResponse>;
}

/// Builds store clients. Construction must not perform network I/O.
pub trait ClientFactory: Send + Sync {
    fn create(
        &self,
        config: StoreClientConfig,
    ) -> std::result::Result<Box<dyn StoreClient>, ClientError>;
}
