//! Scripted store used by the monitor tests
//!
//! Every member-list call consumes the next scripted outcome; once the script
//! runs out each call fails with "unavailable".

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use quorum_client::{
    ClientError, ClientFactory, Member, MemberListResponse, RangeResponse, StoreClient,
    StoreClientConfig, StoreError, error::CODE_PERMISSION_DENIED,
};
use quorum_health::{HealthCheckConfig, HealthMonitor, RootPaths};
use tokio::time::Instant;

pub enum ListOutcome {
    Members(Vec<Member>),
    Fail,
    Hang,
}

#[derive(Clone, Copy)]
pub enum ProbeOutcome {
    Value,
    Status(i32),
    PermissionDenied,
    Hang,
}

pub struct ScriptedStore {
    script: Mutex<VecDeque<ListOutcome>>,
    probe: Mutex<ProbeOutcome>,
    fail_acquire: AtomicBool,
    acquisitions: AtomicUsize,
    list_calls: Mutex<Vec<Instant>>,
    range_calls: AtomicUsize,
}

impl ScriptedStore {
    pub fn new(script: Vec<ListOutcome>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            probe: Mutex::new(ProbeOutcome::Value),
            fail_acquire: AtomicBool::new(false),
            acquisitions: AtomicUsize::new(0),
            list_calls: Mutex::new(Vec::new()),
            range_calls: AtomicUsize::new(0),
        })
    }

    /// A store that never answers a member list successfully
    pub fn failing() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn set_probe(&self, outcome: ProbeOutcome) {
        *self.probe.lock().unwrap() = outcome;
    }

    pub fn set_fail_acquire(&self, fail: bool) {
        self.fail_acquire.store(fail, Ordering::SeqCst);
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn list_call_times(&self) -> Vec<Instant> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.lock().unwrap().len()
    }

    pub fn range_calls(&self) -> usize {
        self.range_calls.load(Ordering::SeqCst)
    }
}

pub struct ScriptedFactory(pub Arc<ScriptedStore>);

impl ClientFactory for ScriptedFactory {
    fn create(&self, config: StoreClientConfig) -> Result<Box<dyn StoreClient>, ClientError> {
        self.0.acquisitions.fetch_add(1, Ordering::SeqCst);

        if self.0.fail_acquire.load(Ordering::SeqCst) {
            return Err(ClientError::InvalidEndpoint {
                endpoint: config.endpoints.join(","),
                reason: "scripted acquisition failure".to_string(),
            });
        }

        Ok(Box::new(ScriptedClient {
            store: self.0.clone(),
            endpoints: config.endpoints,
        }))
    }
}

struct ScriptedClient {
    store: Arc<ScriptedStore>,
    endpoints: Vec<String>,
}

fn unavailable(message: &str) -> StoreError {
    StoreError::Status {
        http_status: 503,
        code: 14,
        message: message.to_string(),
    }
}

#[async_trait]
impl StoreClient for ScriptedClient {
    fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    async fn member_list(&self) -> quorum_client::error::Result<MemberListResponse> {
        self.store.list_calls.lock().unwrap().push(Instant::now());
        let next = self.store.script.lock().unwrap().pop_front();

        match next {
            Some(ListOutcome::Members(members)) => Ok(MemberListResponse {
                members,
                ..Default::default()
            }),
            Some(ListOutcome::Fail) => Err(unavailable("etcdserver: no leader")),
            Some(ListOutcome::Hang) => std::future::pending().await,
            None => Err(unavailable("script exhausted")),
        }
    }

    async fn range(&self, _key: &str) -> quorum_client::error::Result<RangeResponse> {
        self.store.range_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = *self.store.probe.lock().unwrap();

        match outcome {
            ProbeOutcome::Value => Ok(RangeResponse::default()),
            ProbeOutcome::Status(code) => Err(StoreError::Status {
                http_status: 503,
                code,
                message: "etcdserver: no leader".to_string(),
            }),
            ProbeOutcome::PermissionDenied => Err(StoreError::Status {
                http_status: 403,
                code: CODE_PERMISSION_DENIED,
                message: "etcdserver: permission denied".to_string(),
            }),
            ProbeOutcome::Hang => std::future::pending().await,
        }
    }
}

pub fn test_config() -> HealthCheckConfig {
    HealthCheckConfig::new(vec!["store-1:2379".to_string()])
}

pub async fn start_scripted(
    store: &Arc<ScriptedStore>,
    config: HealthCheckConfig,
) -> HealthMonitor {
    HealthMonitor::with_factory(
        config,
        RootPaths::default(),
        Arc::new(ScriptedFactory(store.clone())),
    )
    .await
    .unwrap()
}

pub fn members_ab() -> Vec<Member> {
    vec![Member::new(1, "a"), Member::new(2, "b")]
}

pub fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/certs")
}
