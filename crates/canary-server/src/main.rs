//! Main entry point for the canary ingress console.

use std::sync::Arc;

use canary_core::service::lock::spawn_lock_sweeper;
use canary_core::{DrainController, IngressClient, LockTable};
use canary_server::{
    metrics,
    model::{app_state::AppState, config::Configuration},
    service::KubeIngressClient,
    startup::{self, GracefulShutdown},
};
use tracing::{error, info};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let configuration = Configuration::new()?;
    let _logging_guard = startup::init_logging(&configuration.logging_config())?;

    metrics::init_metrics();

    let server_address = configuration.server_address();
    let server_port = configuration.server_port();
    let graceful_timeout = configuration.graceful_timeout();

    let lock_table = Arc::new(LockTable::with_ttl(configuration.lock_ttl()));
    let _lock_sweeper = spawn_lock_sweeper(lock_table.clone(), configuration.lock_sweep_interval());
    let drain = Arc::new(DrainController::default());

    let ingress_client: Arc<dyn IngressClient> = Arc::new(
        KubeIngressClient::connect(configuration.kubeconfig().as_deref()).await?,
    );

    info!(
        lock_ttl = ?configuration.lock_ttl(),
        identity_header = %configuration.identity_header(),
        graceful_timeout = ?graceful_timeout,
        "Starting canary console on {}:{}",
        server_address,
        server_port
    );

    let app_state = Arc::new(AppState::new(
        configuration,
        lock_table,
        drain.clone(),
        ingress_client,
    ));

    let shutdown_signal = startup::wait_for_shutdown_signal(drain.clone());
    let graceful = GracefulShutdown::new(drain.clone(), shutdown_signal, graceful_timeout);

    let server = startup::main_server(app_state, server_address, server_port, graceful_timeout)?;
    let server_handle = server.handle();
    tokio::pin!(server);

    let drained = tokio::select! {
        result = &mut server => {
            if let Err(e) = result {
                error!(error = %e, "HTTP server exited with error");
            }
            None
        }
        idle = graceful.wait_for_shutdown() => Some(idle),
    };

    if let Some(idle) = drained {
        // The graceful budget is already spent when the wait timed out
        info!(graceful = idle, "Stopping HTTP server");
        server_handle.stop(idle).await;
        if let Err(e) = server.await {
            error!(error = %e, "HTTP server exited with error");
        }
    }

    info!(status = ?drain.status(), "Canary console stopped");
    Ok(())
}
