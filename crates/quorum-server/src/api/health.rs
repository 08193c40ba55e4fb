//! Store health and membership endpoints

use actix_web::{HttpResponse, Responder, Scope, get, web};
use quorum_health::{HealthMonitor, HealthPolicy, HealthStatus, LifecycleState};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthResponse {
    pub fn up() -> Self {
        Self {
            status: "UP".to_string(),
            message: None,
        }
    }

    pub fn down(message: String) -> Self {
        Self {
            status: "DOWN".to_string(),
            message: Some(message),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDetail {
    pub state: LifecycleState,
    pub policy: HealthPolicy,
    pub tls: bool,
    pub endpoints: Vec<String>,
    pub verdict: HealthStatus,
    pub membership_revision: u64,
    pub member_count: usize,
}

/// Pass/fail store health under the configured policy
#[get("/health")]
async fn health(monitor: web::Data<HealthMonitor>) -> impl Responder {
    match monitor.healthy().await {
        Ok(()) => HttpResponse::Ok().json(HealthResponse::up()),
        Err(e) => HttpResponse::ServiceUnavailable().json(HealthResponse::down(e.to_string())),
    }
}

#[get("/health/detail")]
async fn health_detail(monitor: web::Data<HealthMonitor>) -> impl Responder {
    let verdict = monitor.check().await;
    let snapshot = monitor.snapshot();

    HttpResponse::Ok().json(HealthDetail {
        state: monitor.state(),
        policy: monitor.config().policy,
        tls: monitor.is_tls_enabled(),
        endpoints: monitor.config().endpoints.clone(),
        verdict,
        membership_revision: snapshot.revision,
        member_count: snapshot.members.len(),
    })
}

/// Membership as of the last successful refresh
#[get("/members")]
async fn members(monitor: web::Data<HealthMonitor>) -> impl Responder {
    let snapshot = monitor.snapshot();
    HttpResponse::Ok().json(&*snapshot)
}

pub fn routes() -> Scope {
    web::scope("/v1")
        .service(health)
        .service(health_detail)
        .service(members)
}
