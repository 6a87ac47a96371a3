//! Server mode

use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::api::{AppStartTime, app_routes};
use crate::config::get_config;
use crate::runtime::lifetime;

/// Start the HTTP server and block until it stops or Ctrl-C arrives
///
/// Logging must be initialized before calling this.
pub async fn run_server() -> Result<()> {
    let app_start_time = AppStartTime::now();
    let config = get_config();

    let startup = lifetime::startup::prepare_server_startup(&config)
        .await
        .inspect_err(|e| tracing::error!("Server startup failed: {:#}", e))?;

    let service = startup.service.clone();
    let store_for_shutdown = startup.store.clone();

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .app_data(web::Data::new(service.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .app_data(web::PayloadConfig::new(64 * 1024))
            .wrap(
                DefaultHeaders::new()
                    .add(("Connection", "keep-alive"))
                    .add(("Keep-Alive", "timeout=30, max=1000")),
            )
            .configure(app_routes)
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(cpu_count)
    .disable_signals();

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();
    let handle = server.handle();

    // Stop accepting first, let in-flight requests finish, flush last
    tokio::select! {
        res = server => {
            res?;
            lifetime::shutdown::perform_shutdown_tasks(store_for_shutdown.clone()).await;
        }
        _ = lifetime::shutdown::wait_for_signal() => {
            lifetime::shutdown::drain_then_flush(handle.stop(true), store_for_shutdown.clone())
                .await;
            warn!("Graceful shutdown: all tasks completed");
        }
    }

    for task in startup.background_tasks {
        task.abort();
    }
    info!("Server stopped");
    Ok(())
}
