//! Runtime settings loaded via OrthoConfig and the server configuration
//! derived from them.

use std::net::SocketAddr;

use chrono::Duration;
use ortho_config::OrthoConfig;
use rand::RngCore;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use zeroize::Zeroizing;

use helpdesk::domain::{STANDARD_DUE_WINDOW_DAYS, STANDARD_SLA_WINDOW_DAYS, SlaPolicy};
use helpdesk::outbound::persistence::DbPool;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_JWT_ISSUER: &str = "helpdesk";
const DEFAULT_TOKEN_TTL_SECS: u64 = 86_400;
/// Minimum signing secret length accepted outside debug builds.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Errors raised while turning settings into a [`ServerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bind address {value:?}: {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("HELPDESK_JWT_SECRET is required in release builds")]
    MissingJwtSecret,
    #[error("jwt secret must be at least {MIN_JWT_SECRET_BYTES} bytes, got {len}")]
    ShortJwtSecret { len: usize },
    #[error("token ttl must be between 1 second and 30 days, got {secs}")]
    TokenTtl { secs: u64 },
    #[error("SLA window ({sla}) must be positive and not exceed the due window ({due})")]
    SlaWindows { sla: u32, due: u32 },
}

/// Settings layered from CLI flags, `HELPDESK_*` variables and config files.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "HELPDESK")]
pub struct HelpdeskSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Upper bound on pooled connections.
    pub db_max_connections: Option<u32>,
    /// HS256 signing secret for bearer tokens.
    pub jwt_secret: Option<String>,
    /// `iss` claim stamped on and required of every token.
    pub jwt_issuer: Option<String>,
    /// Token lifetime in seconds.
    pub token_ttl_secs: Option<u64>,
    /// Days until a new ticket breaches its SLA.
    pub sla_window_days: Option<u32>,
    /// Days until a new ticket is due.
    pub due_window_days: Option<u32>,
}

impl HelpdeskSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| ConfigError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .max(1)
    }

    pub fn jwt_issuer(&self) -> &str {
        self.jwt_issuer.as_deref().unwrap_or(DEFAULT_JWT_ISSUER)
    }

    pub fn token_ttl(&self) -> Result<Duration, ConfigError> {
        let secs = self.token_ttl_secs.unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        let max = Duration::days(30);
        i64::try_from(secs)
            .ok()
            .map(Duration::seconds)
            .filter(|ttl| *ttl > Duration::zero() && *ttl <= max)
            .ok_or(ConfigError::TokenTtl { secs })
    }

    pub fn sla_policy(&self) -> Result<SlaPolicy, ConfigError> {
        let sla = self.sla_window_days.unwrap_or(STANDARD_SLA_WINDOW_DAYS);
        let due = self.due_window_days.unwrap_or(STANDARD_DUE_WINDOW_DAYS);
        if sla == 0 || sla > due {
            return Err(ConfigError::SlaWindows { sla, due });
        }
        Ok(SlaPolicy::from_days(sla, due))
    }

    /// Resolve the signing secret.
    ///
    /// Debug builds without a configured secret get a random one, so tokens
    /// do not survive a restart.
    pub fn jwt_secret(&self) -> Result<Zeroizing<Vec<u8>>, ConfigError> {
        match self.jwt_secret.as_deref() {
            Some(secret) if cfg!(debug_assertions) || secret.len() >= MIN_JWT_SECRET_BYTES => {
                Ok(Zeroizing::new(secret.as_bytes().to_vec()))
            }
            Some(secret) => Err(ConfigError::ShortJwtSecret { len: secret.len() }),
            None if cfg!(debug_assertions) => {
                warn!("HELPDESK_JWT_SECRET unset; using an ephemeral signing secret (dev only)");
                let mut bytes = Zeroizing::new(vec![0_u8; MIN_JWT_SECRET_BYTES]);
                rand::thread_rng().fill_bytes(bytes.as_mut_slice());
                Ok(bytes)
            }
            None => Err(ConfigError::MissingJwtSecret),
        }
    }
}

/// Everything the server needs after settings are validated.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) jwt_secret: Zeroizing<Vec<u8>>,
    pub(crate) jwt_issuer: String,
    pub(crate) token_ttl: Duration,
    pub(crate) sla: SlaPolicy,
}

impl ServerConfig {
    /// Validate `settings` into a configuration without a database pool.
    pub fn from_settings(settings: &HelpdeskSettings) -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: settings.bind_addr()?,
            db_pool: None,
            jwt_secret: settings.jwt_secret()?,
            jwt_issuer: settings.jwt_issuer().to_owned(),
            token_ttl: settings.token_ttl()?,
            sla: settings.sla_policy()?,
        })
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// Without one the server runs on the in-memory store.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
