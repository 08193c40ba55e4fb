//! Client acquisition
//!
//! Every acquisition builds a fresh client. A client that failed is dropped
//! by its caller and never handed out again.

use std::{fmt, sync::Arc, time::Duration};

use quorum_client::{
    ClientError, ClientFactory, StoreClient, StoreClientConfig, TlsContext, normalize_endpoints,
};
use tracing::trace;

use crate::config::HealthCheckConfig;

pub struct ClientManager {
    endpoints: Vec<String>,
    tls: Option<Arc<TlsContext>>,
    factory: Arc<dyn ClientFactory>,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl fmt::Debug for ClientManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientManager")
            .field("endpoints", &self.endpoints)
            .field("tls", &self.tls.is_some())
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ClientManager {
    pub fn new(
        config: &HealthCheckConfig,
        tls: Option<Arc<TlsContext>>,
        factory: Arc<dyn ClientFactory>,
    ) -> Self {
        Self {
            endpoints: config.endpoints.clone(),
            tls,
            factory,
            connect_timeout: config.connect_timeout(),
            request_timeout: config.request_timeout(),
        }
    }

    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Configured default endpoints, as written in the configuration
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Build a new client for `endpoints`, or for the configured endpoints
    /// when `None`. Performs no network I/O.
    pub fn acquire_client(
        &self,
        endpoints: Option<&[String]>,
    ) -> Result<Box<dyn StoreClient>, ClientError> {
        let endpoints = endpoints.unwrap_or(&self.endpoints);
        let endpoints = normalize_endpoints(endpoints, self.is_tls_enabled())?;

        trace!(endpoints = ?endpoints, "Acquiring store client");

        let config = StoreClientConfig::new(endpoints)
            .with_tls(self.tls.clone())
            .with_timeouts(self.connect_timeout, self.request_timeout);

        self.factory.create(config)
    }
}
