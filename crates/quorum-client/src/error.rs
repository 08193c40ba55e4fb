//! Error types for the store client

use std::{path::PathBuf, time::Duration};

/// gRPC status code the gateway reports for permission failures
pub const CODE_PERMISSION_DENIED: i32 = 7;

/// Errors raised while building a client. Construction does no I/O, so these
/// always point at configuration.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("no store endpoints configured")]
    NoEndpoints,

    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("endpoint '{0}' requires TLS but no transport security is configured")]
    TlsRequired(String),

    #[error("failed to build HTTP transport: {0}")]
    Build(#[from] reqwest::Error),
}

/// Errors raised by a request against the store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transport error talking to {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("store returned error: http_status={http_status}, code={code}, message={message}")]
    Status {
        http_status: u16,
        code: i32,
        message: String,
    },

    #[error("unexpected HTTP {http_status} from {endpoint}: {body}")]
    Http {
        endpoint: String,
        http_status: u16,
        body: String,
    },

    #[error("failed to decode response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

impl StoreError {
    /// Whether the store itself answered with an error status. A bare HTTP
    /// error from something in front of the store does not count.
    pub fn is_store_response(&self) -> bool {
        matches!(self, StoreError::Status { .. })
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, StoreError::Status { code, .. } if *code == CODE_PERMISSION_DENIED)
    }
}

/// Errors raised while loading TLS material
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("failed to read {kind} from {}: {source}", .path.display())]
    Read {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid client identity ({} / {}): {reason}", .cert.display(), .key.display())]
    Identity {
        cert: PathBuf,
        key: PathBuf,
        reason: String,
    },

    #[error("invalid CA bundle {}: {reason}", .path.display())]
    Certificate { path: PathBuf, reason: String },

    #[error("CA bundle {} contains no certificates", .path.display())]
    EmptyCaBundle { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, StoreError>;
