//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{HelpdeskSettings, ServerConfig};

use state_builders::{BuiltState, build_http_state};

use actix_web::dev::{Server, ServerHandle, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::{info, warn};

use helpdesk::Trace;
#[cfg(debug_assertions)]
use helpdesk::doc::ApiDoc;
use helpdesk::inbound::http;
use helpdesk::inbound::http::health::{HealthState, live, ready};
use helpdesk::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(web::scope("/api").configure(http::configure))
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct the Actix HTTP server together with the health state its
/// probes report. OS signals are not handled here; see [`drain_on_signal`].
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(config: ServerConfig) -> std::io::Result<(Server, web::Data<HealthState>)> {
    let BuiltState { http, store_health } = build_http_state(&config);
    let health_state = web::Data::new(HealthState::new(store_health));
    let server_health_state = health_state.clone();
    let bind_addr = config.bind_addr();

    let server = HttpServer::new(move || build_app(server_health_state.clone(), http.clone()))
        .disable_signals()
        .bind(bind_addr)?
        .run();

    health_state.mark_listening();
    Ok((server, health_state))
}

/// Wait for SIGINT or SIGTERM, fail both probes, then stop accepting
/// connections and let in-flight requests finish.
pub async fn drain_on_signal(server: ServerHandle, health_state: web::Data<HealthState>) {
    shutdown_signal().await;
    info!("shutdown requested; draining");
    health_state.begin_draining();
    server.stop(true).await;
    info!("server drained");
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "cannot listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {}
        () = terminate => {}
    }
}
