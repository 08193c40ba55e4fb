//! Quorum Client - client SDK for etcd-compatible consensus stores
//!
//! This crate provides:
//! - Wire model for the store's JSON gateway (members, key ranges, errors)
//! - `StoreClient` / `ClientFactory` seams used by the health monitor
//! - An HTTP gateway client with endpoint failover
//! - TLS client identity loading

pub mod endpoint;
pub mod error;
pub mod http;
pub mod model;
pub mod store;
pub mod tls;

pub use endpoint::{normalize_endpoint, normalize_endpoints};
pub use error::{ClientError, StoreError, TlsError};
pub use http::{HttpClientFactory, HttpStoreClient};
pub use model::{KeyValue, Member, MemberListResponse, RangeResponse, ResponseHeader};
pub use store::{ClientFactory, StoreClient, StoreClientConfig};
pub use tls::{TlsContext, TlsFiles};
