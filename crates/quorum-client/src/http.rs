//! HTTP gateway client with endpoint failover
//!
//! Talks to the store's JSON gateway. A transport failure on one endpoint moves
//! the client on to the next one; an error answered by the store itself is
//! returned immediately since another member would give the same answer.

use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    endpoint::normalize_endpoints,
    error::{ClientError, Result, StoreError},
    model::{GatewayError, MemberListResponse, RangeRequest, RangeResponse},
    store::{ClientFactory, StoreClient, StoreClientConfig},
};

pub const MEMBER_LIST_PATH: &str = "/v3/cluster/member/list";
pub const RANGE_PATH: &str = "/v3/kv/range";

/// Store client speaking the JSON gateway protocol over reqwest
pub struct HttpStoreClient {
    client: Client,
    endpoints: Vec<String>,
    current_endpoint_index: RwLock<usize>,
}

impl std::fmt::Debug for HttpStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStoreClient")
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl HttpStoreClient {
    /// Create a new client. No connection is made until the first request.
    pub fn new(config: StoreClientConfig) -> std::result::Result<Self, ClientError> {
        let endpoints = normalize_endpoints(&config.endpoints, config.tls.is_some())?;

        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .no_proxy();
        if let Some(tls) = &config.tls {
            builder = tls.apply(builder)?;
        }

        Ok(Self {
            client: builder.build()?,
            endpoints,
            current_endpoint_index: RwLock::new(0),
        })
    }

    /// Get the endpoint requests are currently sent to
    fn current_endpoint(&self) -> String {
        let index = *self
            .current_endpoint_index
            .read()
            .unwrap_or_else(|e| e.into_inner());
        self.endpoints[index].clone()
    }

    /// Switch to the next endpoint (for failover)
    fn switch_to_next_endpoint(&self) {
        let mut index = self
            .current_endpoint_index
            .write()
            .unwrap_or_else(|e| e.into_inner());
        *index = (*index + 1) % self.endpoints.len();
        debug!("Switched to endpoint index: {}", *index);
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.current_endpoint(), path)
    }

    /// POST a JSON body, trying each endpoint at most once
    async fn post_with_failover<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut last_error = None;

        for _ in 0..self.endpoints.len() {
            let endpoint = self.current_endpoint();
            let url = self.build_url(path);

            match self.client.post(&url).json(body).send().await {
                Ok(response) => return Self::handle_response(&endpoint, response).await,
                Err(e) => {
                    warn!(
                        endpoint = %endpoint,
                        error = %e,
                        "Store request failed, switching to next endpoint"
                    );
                    self.switch_to_next_endpoint();
                    last_error = Some(StoreError::Transport {
                        endpoint,
                        source: e,
                    });
                }
            }
        }

        // endpoints is never empty after normalization
        Err(last_error.unwrap_or_else(|| StoreError::Decode {
            endpoint: String::new(),
            reason: "no endpoint attempted".to_string(),
        }))
    }

    /// Decode a success body. An error status becomes `StoreError::Status` only
    /// when the body is a gateway error; anything else is `StoreError::Http`.
    async fn handle_response<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| StoreError::Transport {
            endpoint: endpoint.to_string(),
            source: e,
        })?;

        if status.is_success() {
            return serde_json::from_slice::<T>(&bytes).map_err(|e| StoreError::Decode {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            });
        }

        let Some(gateway_error) = serde_json::from_slice::<GatewayError>(&bytes)
            .ok()
            .filter(GatewayError::is_error)
        else {
            let body = truncate_body(&bytes);
            debug!(
                endpoint = %endpoint,
                http_status = status.as_u16(),
                "Non-gateway error response"
            );
            return Err(StoreError::Http {
                endpoint: endpoint.to_string(),
                http_status: status.as_u16(),
                body,
            });
        };
        debug!(
            endpoint = %endpoint,
            http_status = status.as_u16(),
            code = gateway_error.code,
            "Store answered with error"
        );

        Err(StoreError::Status {
            http_status: status.as_u16(),
            code: gateway_error.code,
            message: gateway_error.reason().to_string(),
        })
    }
}

const MAX_ERROR_BODY: usize = 256;

fn truncate_body(bytes: &[u8]) -> String {
    let body = String::from_utf8_lossy(bytes);
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[async_trait]
impl StoreClient for HttpStoreClient {
    fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    async fn member_list(&self) -> Result<MemberListResponse> {
        self.post_with_failover(MEMBER_LIST_PATH, &serde_json::json!({}))
            .await
    }

    async fn range(&self, key: &str) -> Result<RangeResponse> {
        self.post_with_failover(RANGE_PATH, &RangeRequest::new(key))
            .await
    }
}

/// Default factory producing [`HttpStoreClient`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpClientFactory;

impl ClientFactory for HttpClientFactory {
    fn create(
        &self,
        config: StoreClientConfig,
    ) -> std::result::Result<Box<dyn StoreClient>, ClientError> {
        Ok(Box::new(HttpStoreClient::new(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_endpoints() {
        let config = StoreClientConfig::new(vec![
            "store-1:2379".to_string(),
            "http://store-2:2379/".to_string(),
        ]);
        let client = HttpStoreClient::new(config).unwrap();

        assert_eq!(
            client.endpoints(),
            &["http://store-1:2379".to_string(), "http://store-2:2379".to_string()]
        );
        assert_eq!(
            client.build_url(MEMBER_LIST_PATH),
            "http://store-1:2379/v3/cluster/member/list"
        );
    }

    #[test]
    fn test_switch_wraps_around() {
        let config =
            StoreClientConfig::new(vec!["store-1:2379".to_string(), "store-2:2379".to_string()]);
        let client = HttpStoreClient::new(config).unwrap();

        client.switch_to_next_endpoint();
        assert_eq!(client.current_endpoint(), "http://store-2:2379");
        client.switch_to_next_endpoint();
        assert_eq!(client.current_endpoint(), "http://store-1:2379");
    }

    #[test]
    fn test_factory_rejects_empty_endpoints() {
        let result = HttpClientFactory.create(StoreClientConfig::new(Vec::new()));
        assert!(matches!(result, Err(ClientError::NoEndpoints)));
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body(b"  bad gateway\n"), "bad gateway");

        let long = "x".repeat(MAX_ERROR_BODY + 10);
        let truncated = truncate_body(long.as_bytes());
        assert_eq!(truncated.len(), MAX_ERROR_BODY + 3);
        assert!(truncated.ends_with("..."));
    }
}
