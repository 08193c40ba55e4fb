//! TLS material for client connections
//!
//! Loads the client certificate, private key and trusted CA bundle (PEM) and
//! keeps them in a form that can be applied to any number of HTTP clients.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use reqwest::{Certificate, ClientBuilder, Identity};
use tracing::debug;

use crate::error::TlsError;

/// Locations of the PEM files that make up a client identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    /// Client certificate (PEM)
    pub cert_file: PathBuf,
    /// Client private key (PEM, PKCS#8 / PKCS#1 / SEC1)
    pub key_file: PathBuf,
    /// Trusted CA bundle (PEM, one or more certificates)
    pub ca_file: PathBuf,
}

/// Parsed transport-security material, immutable once built
#[derive(Clone)]
pub struct TlsContext {
    files: TlsFiles,
    identity_pem: Vec<u8>,
    ca_certs: Vec<Certificate>,
}

impl fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsContext")
            .field("cert_file", &self.files.cert_file)
            .field("key_file", &self.files.key_file)
            .field("ca_file", &self.files.ca_file)
            .field("ca_certs", &self.ca_certs.len())
            .finish()
    }
}

impl TlsContext {
    /// Read and validate all three files
    pub async fn load(files: TlsFiles) -> Result<Self, TlsError> {
        let cert = read_file("client certificate", &files.cert_file).await?;
        let key = read_file("client key", &files.key_file).await?;
        let ca = read_file("CA bundle", &files.ca_file).await?;

        Self::from_pem(files, &cert, &key, &ca)
    }

    /// Build from PEM bytes already in memory. `files` is only kept for
    /// diagnostics.
    pub fn from_pem(files: TlsFiles, cert: &[u8], key: &[u8], ca: &[u8]) -> Result<Self, TlsError> {
        let mut identity_pem = Vec::with_capacity(cert.len() + key.len() + 1);
        identity_pem.extend_from_slice(cert);
        if !identity_pem.ends_with(b"\n") {
            identity_pem.push(b'\n');
        }
        identity_pem.extend_from_slice(key);

        let identity_error = |reason: String| TlsError::Identity {
            cert: files.cert_file.clone(),
            key: files.key_file.clone(),
            reason,
        };

        // Splitting the PEM blocks does not parse the key; a client build does
        let identity =
            Identity::from_pem(&identity_pem).map_err(|e| identity_error(e.to_string()))?;
        reqwest::Client::builder()
            .use_rustls_tls()
            .tls_built_in_root_certs(false)
            .identity(identity)
            .build()
            .map_err(|e| identity_error(error_chain(&e)))?;

        let ca_certs = Certificate::from_pem_bundle(ca).map_err(|e| TlsError::Certificate {
            path: files.ca_file.clone(),
            reason: e.to_string(),
        })?;
        if ca_certs.is_empty() {
            return Err(TlsError::EmptyCaBundle {
                path: files.ca_file.clone(),
            });
        }

        let context = Self {
            files,
            identity_pem,
            ca_certs,
        };

        // CA DER contents are only checked when a client is assembled
        context
            .apply(reqwest::Client::builder())
            .and_then(ClientBuilder::build)
            .map_err(|e| TlsError::Certificate {
                path: context.files.ca_file.clone(),
                reason: error_chain(&e),
            })?;

        debug!(
            cert_file = %context.files.cert_file.display(),
            ca_certs = context.ca_certs.len(),
            "Loaded TLS client material"
        );

        Ok(context)
    }

    pub fn files(&self) -> &TlsFiles {
        &self.files
    }

    pub fn ca_cert_count(&self) -> usize {
        self.ca_certs.len()
    }

    /// Configure a client builder to authenticate with this identity and to
    /// trust only the loaded CA bundle.
    pub fn apply(&self, builder: ClientBuilder) -> Result<ClientBuilder, reqwest::Error> {
        let identity = Identity::from_pem(&self.identity_pem)?;

        let mut builder = builder
            .use_rustls_tls()
            .tls_built_in_root_certs(false)
            .identity(identity);
        for cert in &self.ca_certs {
            builder = builder.add_root_certificate(cert.clone());
        }

        Ok(builder)
    }
}

/// reqwest builder errors carry the useful detail in their source
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

async fn read_file(kind: &'static str, path: &Path) -> Result<Vec<u8>, TlsError> {
    tokio::fs::read(path).await.map_err(|source| TlsError::Read {
        kind,
        path: path.to_path_buf(),
        source,
    })
}
