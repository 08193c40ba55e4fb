//! Endpoint normalization
//!
//! Store endpoints are usually configured as bare `host:port` pairs. The scheme
//! is derived from whether transport security is in use.

use url::Url;

use crate::error::ClientError;

const SCHEME_HTTP: &str = "http";
const SCHEME_HTTPS: &str = "https";

/// Validate and normalize a list of endpoints into base URLs without a
/// trailing slash.
pub fn normalize_endpoints(endpoints: &[String], tls: bool) -> Result<Vec<String>, ClientError> {
    if endpoints.is_empty() {
        return Err(ClientError::NoEndpoints);
    }

    endpoints
        .iter()
        .map(|endpoint| normalize_endpoint(endpoint, tls))
        .collect()
}

pub fn normalize_endpoint(endpoint: &str, tls: bool) -> Result<String, ClientError> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(ClientError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: "empty address".to_string(),
        });
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        let scheme = if tls { SCHEME_HTTPS } else { SCHEME_HTTP };
        format!("{}://{}", scheme, trimmed)
    };

    let url = Url::parse(&with_scheme).map_err(|e| ClientError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        SCHEME_HTTP => {}
        SCHEME_HTTPS if tls => {}
        SCHEME_HTTPS => return Err(ClientError::TlsRequired(endpoint.to_string())),
        other => {
            return Err(ClientError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: format!("unsupported scheme '{}'", other),
            });
        }
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ClientError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: "missing host".to_string(),
        });
    }

    if url.path() != "/" || url.query().is_some() {
        return Err(ClientError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: "endpoint must not carry a path or query".to_string(),
        });
    }

    Ok(with_scheme.trim_end_matches('/').to_string())
}
