use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, dev::Server, middleware::Logger, web};

use crate::api::route::routes;
use crate::middleware::{DrainGate, Identity};
use crate::model::app_state::AppState;

/// Build the console HTTP server.
///
/// Signal handling is left to [`super::wait_for_shutdown_signal`] so that a
/// signal starts the drain instead of stopping the workers outright.
pub fn main_server(
    app_state: Arc<AppState>,
    address: String,
    port: u16,
    shutdown_timeout: Duration,
) -> Result<Server, std::io::Error> {
    let identity_header = app_state.configuration.identity_header();

    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Identity::new(&identity_header))
            .wrap(DrainGate::new(app_state.drain.clone()))
            .wrap(Logger::default())
            .app_data(web::Data::from(app_state.clone()))
            .configure(routes)
    })
    .disable_signals()
    .shutdown_timeout(shutdown_timeout.as_secs())
    .bind((address, port))?
    .run())
}
