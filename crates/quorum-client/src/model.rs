// Wire model for the store's JSON gateway
//
// The gateway renders 64-bit integers as JSON strings; every u64 field accepts
// both the string and the numeric form.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

/// Header attached to every gateway response
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeader {
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub cluster_id: u64,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub member_id: u64,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub revision: u64,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub raft_term: u64,
}

/// One node participating in the store cluster
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "ID", default)]
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "peerURLs", default)]
    pub peer_urls: Vec<String>,
    #[serde(rename = "clientURLs", default)]
    pub client_urls: Vec<String>,
    #[serde(rename = "isLearner", default)]
    pub is_learner: bool,
}

impl Member {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    /// A member that has not started yet reports an empty name
    pub fn is_started(&self) -> bool {
        !self.name.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberListResponse {
    #[serde(default)]
    pub header: ResponseHeader,
    #[serde(default)]
    pub members: Vec<Member>,
}

/// Body of a `kv/range` request. Keys travel base64-encoded.
#[derive(Clone, Debug, Serialize)]
pub struct RangeRequest {
    pub key: String,
}

impl RangeRequest {
    pub fn new(key: &str) -> Self {
        Self {
            key: STANDARD.encode(key.as_bytes()),
        }
    }
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub mod_revision: u64,
}

impl KeyValue {
    pub fn decoded_key(&self) -> Option<Vec<u8>> {
        STANDARD.decode(&self.key).ok()
    }

    pub fn decoded_value(&self) -> Option<Vec<u8>> {
        STANDARD.decode(&self.value).ok()
    }
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeResponse {
    #[serde(default)]
    pub header: ResponseHeader,
    #[serde(default)]
    pub kvs: Vec<KeyValue>,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub count: u64,
}

/// Error body returned by the gateway with a non-2xx status
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GatewayError {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl GatewayError {
    /// A body with neither a code nor a message is not a gateway error
    pub fn is_error(&self) -> bool {
        self.code != 0 || !self.error.is_empty() || !self.message.is_empty()
    }

    pub fn reason(&self) -> &str {
        if self.message.is_empty() {
            &self.error
        } else {
            &self.message
        }
    }
}
