//! Embedded PostgreSQL for adapter tests.
//!
//! One cluster is shared per test binary. A template database is migrated
//! once per migrations hash, and every test clones it into a database that
//! is dropped with its [`TemporaryDatabase`] guard.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use pg_embedded_setup_unpriv::test_support::{hash_directory, shared_cluster_handle};
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use uuid::Uuid;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const TEMPLATE_PREFIX: &str = "helpdesk_template";
const RETRIES: usize = 5;
const RETRY_DELAY: Duration = Duration::from_millis(500);

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn retry<T>(what: &str, mut attempt: impl FnMut() -> Result<T, String>) -> Result<T, String> {
    let mut last_error = String::new();
    for round in 1..=RETRIES {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(error) => last_error = format!("{what}: attempt {round}/{RETRIES}: {error}"),
        }
        if round < RETRIES {
            std::thread::sleep(RETRY_DELAY);
        }
    }
    Err(last_error)
}

/// The process-wide cluster, started on first use.
pub fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    // A reused data directory keeps the password from its first `initdb`.
    if std::env::var_os("PG_PASSWORD").is_none() {
        // SAFETY: runs before the cluster library spawns threads; later
        // calls see the variable already set and skip this branch.
        unsafe {
            std::env::set_var("PG_PASSWORD", "helpdesk_embedded_test");
        }
    }
    retry("start shared cluster", || {
        shared_cluster_handle().map_err(|err| err.to_string())
    })
}

fn template_name() -> Result<String, String> {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let hash = hash_directory(dir).map_err(|err| format!("hash migrations: {err}"))?;
    let short = hash.get(..8).unwrap_or(&hash);
    Ok(format!("{TEMPLATE_PREFIX}_{short}"))
}

fn migrate(url: &str) -> Result<(), String> {
    let mut conn = PgConnection::establish(url).map_err(|err| format!("connect: {err}"))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map(|_| ())
        .map_err(|err| format!("migrate: {err}"))
}

fn ensure_template(cluster: &ClusterHandle) -> Result<String, String> {
    let name = template_name()?;
    let _guard = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(name.as_str())
        .map_err(|err| format!("template check: {err:?}"))?;
    if !exists {
        cluster
            .create_database(name.as_str())
            .map_err(|err| format!("create template: {err:?}"))?;
        migrate(&cluster.connection().database_url(&name))?;
    }
    Ok(name)
}

/// A fresh, fully migrated database for one test.
pub fn provision_database(cluster: &ClusterHandle) -> Result<TemporaryDatabase, String> {
    retry("provision test database", || {
        let template = ensure_template(cluster)?;
        let name = format!("test_{}", Uuid::new_v4().simple());
        cluster
            .temporary_database_from_template(name.as_str(), template.as_str())
            .map_err(|err| format!("clone template: {err:?}"))
    })
}
