//! Credential loading
//!
//! TLS material is read once when the monitor starts and shared by every
//! client built afterwards.

use std::sync::Arc;

use quorum_client::TlsContext;
use tracing::{debug, info};

use crate::{
    config::{HealthCheckConfig, RootPaths},
    error::Result,
};

/// Load the client identity and trusted CAs when TLS is enabled.
///
/// Returns `Ok(None)` without touching the filesystem when TLS is disabled.
pub async fn load_credentials(
    config: &HealthCheckConfig,
    root: &RootPaths,
) -> Result<Option<Arc<TlsContext>>> {
    if !config.is_tls_enabled() {
        debug!("TLS disabled, using plain transport");
        return Ok(None);
    }

    let files = config.tls_files(root);
    let context = TlsContext::load(files).await?;

    info!(
        cert_file = %context.files().cert_file.display(),
        ca_file = %context.files().ca_file.display(),
        ca_certs = context.ca_cert_count(),
        "Loaded TLS client credentials"
    );

    Ok(Some(Arc::new(context)))
}
