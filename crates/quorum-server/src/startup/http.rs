//! Status HTTP server setup

use std::sync::Arc;

use actix_web::{App, HttpServer, dev::Server, middleware::Logger, web};
use quorum_health::HealthMonitor;

use crate::{api, config::HttpConfig};

/// Creates and binds the status server.
///
/// OS signals are left to the caller, which stops the server through its
/// handle.
pub fn status_server(
    monitor: Arc<HealthMonitor>,
    config: &HttpConfig,
) -> std::io::Result<Server> {
    let shutdown_secs = config.shutdown_timeout().as_secs().max(1);

    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::from(monitor.clone()))
            .service(api::health::routes())
    })
    .workers(config.workers.max(1))
    .shutdown_timeout(shutdown_secs)
    .disable_signals()
    .bind(config.listen.as_str())?
    .run())
}
