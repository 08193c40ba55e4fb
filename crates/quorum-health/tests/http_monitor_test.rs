//! Monitor running the HTTP gateway client against a mock store

use std::time::Duration;

use quorum_client::{
    Member,
    http::{MEMBER_LIST_PATH, RANGE_PATH},
};
use quorum_health::{
    HealthCheckConfig, HealthError, HealthMonitor, HealthPolicy, HealthStatus, ProbeStep,
    RootPaths,
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, method, path},
};

async fn mount_members(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(MEMBER_LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {"cluster_id": "7", "revision": "3"},
            "members": [
                {"ID": "1", "name": "a", "clientURLs": ["http://10.0.0.1:2379"]},
                {"ID": 2, "name": "b", "clientURLs": ["http://10.0.0.2:2379"]}
            ]
        })))
        .mount(server)
        .await;
}

fn config_for(server: &MockServer) -> HealthCheckConfig {
    // host:port without a scheme, as operators usually write it
    HealthCheckConfig::new(vec![server.address().to_string()])
        .with_refresh_interval(Duration::from_secs(60))
}

#[tokio::test]
async fn test_membership_scenario() {
    let server = MockServer::start().await;
    mount_members(&server).await;

    let monitor = HealthMonitor::start(config_for(&server), RootPaths::default())
        .await
        .unwrap();
    assert!(!monitor.is_tls_enabled());

    let mut updates = monitor.subscribe();
    tokio::time::timeout(Duration::from_secs(5), updates.changed())
        .await
        .expect("no membership refresh")
        .unwrap();

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.revision, 1);
    let members: Vec<(u64, &str)> = snapshot
        .members
        .iter()
        .map(|m| (m.id, m.name.as_str()))
        .collect();
    assert_eq!(members, vec![(1, "a"), (2, "b")]);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_probe_reads_health_key() {
    let server = MockServer::start().await;
    mount_members(&server).await;
    Mock::given(method("POST"))
        .and(path(RANGE_PATH))
        .and(body_json(json!({"key": "aGVhbHRo"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {"revision": "3"}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let monitor = HealthMonitor::start(config_for(&server), RootPaths::default())
        .await
        .unwrap();

    assert_eq!(monitor.check().await, HealthStatus::Healthy);
    assert!(monitor.healthy().await.is_ok());

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_store_error_response_is_unhealthy() {
    let server = MockServer::start().await;
    mount_members(&server).await;
    Mock::given(method("POST"))
        .and(path(RANGE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": "etcdserver: leader changed",
            "code": 14,
            "message": "etcdserver: leader changed"
        })))
        .mount(&server)
        .await;

    let monitor = HealthMonitor::start(config_for(&server), RootPaths::default())
        .await
        .unwrap();

    assert!(matches!(
        monitor.check().await,
        HealthStatus::Unhealthy {
            step: ProbeStep::Probe,
            ..
        }
    ));
    assert!(matches!(
        monitor.healthy().await,
        Err(HealthError::Unhealthy { .. })
    ));

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_proxy_error_page_is_undetermined() {
    let server = MockServer::start().await;
    mount_members(&server).await;
    Mock::given(method("POST"))
        .and(path(RANGE_PATH))
        .respond_with(
            ResponseTemplate::new(502)
                .insert_header("content-type", "text/html")
                .set_body_string("<html>502 Bad Gateway</html>"),
        )
        .mount(&server)
        .await;

    let monitor = HealthMonitor::start(config_for(&server), RootPaths::default())
        .await
        .unwrap();

    match monitor.check().await {
        HealthStatus::Unknown { step, reason } => {
            assert_eq!(step, ProbeStep::Probe);
            assert!(reason.contains("502"));
        }
        other => panic!("unexpected status: {:?}", other),
    }
    assert!(monitor.healthy().await.is_ok());
    monitor.shutdown().await;

    let config = config_for(&server).with_policy(HealthPolicy::FailClosed);
    let monitor = HealthMonitor::start(config, RootPaths::default())
        .await
        .unwrap();
    assert!(matches!(
        monitor.healthy().await,
        Err(HealthError::Undetermined {
            step: ProbeStep::Probe,
            ..
        })
    ));
    monitor.shutdown().await;
}

#[tokio::test]
async fn test_permission_denied_response_is_healthy() {
    let server = MockServer::start().await;
    mount_members(&server).await;
    Mock::given(method("POST"))
        .and(path(RANGE_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": "etcdserver: permission denied",
            "code": 7,
            "message": "etcdserver: permission denied"
        })))
        .mount(&server)
        .await;

    let config = config_for(&server).with_policy(HealthPolicy::FailClosed);
    let monitor = HealthMonitor::start(config, RootPaths::default())
        .await
        .unwrap();

    assert_eq!(monitor.check().await, HealthStatus::Healthy);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_store() {
    // Port 1 on loopback refuses connections
    let config = HealthCheckConfig::new(vec!["127.0.0.1:1".to_string()]);

    let monitor = HealthMonitor::start(config.clone(), RootPaths::default())
        .await
        .unwrap();
    assert!(monitor.check().await.is_unknown());
    assert!(monitor.healthy().await.is_ok());
    assert!(monitor.members().is_empty());
    monitor.shutdown().await;

    let monitor = HealthMonitor::start(
        config.with_policy(HealthPolicy::FailClosed),
        RootPaths::default(),
    )
    .await
    .unwrap();
    let err = monitor.healthy().await.unwrap_err();
    assert!(matches!(
        err,
        HealthError::Undetermined {
            step: ProbeStep::Probe,
            ..
        }
    ));
    monitor.shutdown().await;
}

#[tokio::test]
async fn test_invalid_endpoint_is_unknown() {
    let config = HealthCheckConfig::new(vec!["ftp://store-1:2379".to_string()]);
    let monitor = HealthMonitor::start(config, RootPaths::default())
        .await
        .unwrap();

    assert!(matches!(
        monitor.check().await,
        HealthStatus::Unknown {
            step: ProbeStep::AcquireClient,
            ..
        }
    ));
    assert_eq!(monitor.members(), Vec::<Member>::new());

    monitor.shutdown().await;
}
