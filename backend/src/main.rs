//! Backend entry-point: loads settings, prepares storage and serves the
//! helpdesk REST API.

mod server;

use color_eyre::eyre::WrapErr;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use helpdesk::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use server::{HelpdeskSettings, ServerConfig, create_server, drain_on_signal};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = HelpdeskSettings::load_from_iter(std::env::args_os())
        .wrap_err("failed to load settings")?;
    let mut config = ServerConfig::from_settings(&settings)?;

    if let Some(database_url) = settings.database_url.as_deref() {
        run_migrations(database_url)
            .await
            .wrap_err("failed to apply database migrations")?;
        let pool = DbPool::new(
            PoolConfig::new(database_url).with_max_size(settings.db_max_connections()),
        )
        .await
        .wrap_err("failed to build database pool")?;
        config = config.with_db_pool(pool);
    }

    info!(bind_addr = %config.bind_addr(), "starting helpdesk server");
    let (server, health_state) = create_server(config)?;
    actix_web::rt::spawn(drain_on_signal(server.handle(), health_state));
    server.await?;
    Ok(())
}
