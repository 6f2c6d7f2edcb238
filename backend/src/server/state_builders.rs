//! Builders wiring repositories, adapters and services into [`HttpState`].

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::info;

use helpdesk::domain::ports::{
    AccessTokenService, StoreHealth, TicketRepository, UserRepository,
};
use helpdesk::domain::{
    AccessControlService, AccountService, DashboardService, TicketAggregationService,
    TicketLifecycleService,
};
use helpdesk::inbound::http::state::{HttpState, HttpStatePorts};
use helpdesk::outbound::memory::InMemoryStore;
use helpdesk::outbound::persistence::{DieselTicketRepository, DieselUserRepository};
use helpdesk::outbound::security::{Argon2PasswordHasher, JwtTokenService};

use super::ServerConfig;

/// Wire every driving port over one pair of repositories.
fn build_ports<T, U>(
    tickets: Arc<T>,
    users: Arc<U>,
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
) -> HttpStatePorts
where
    T: TicketRepository + 'static,
    U: UserRepository + 'static,
{
    let token_service: Arc<dyn AccessTokenService> = Arc::new(JwtTokenService::new(
        config.jwt_secret.as_slice(),
        config.jwt_issuer.clone(),
        config.token_ttl,
        clock.clone(),
    ));

    let lifecycle = Arc::new(TicketLifecycleService::new(
        tickets.clone(),
        users.clone(),
        clock.clone(),
        config.sla,
    ));
    let aggregates = Arc::new(TicketAggregationService::new(tickets, clock));
    let accounts = Arc::new(AccountService::new(
        users.clone(),
        Arc::new(Argon2PasswordHasher::new()),
        token_service.clone(),
    ));

    HttpStatePorts {
        tickets: lifecycle.clone(),
        ticket_query: lifecycle,
        dashboard: Arc::new(DashboardService::new(aggregates)),
        accounts: accounts.clone(),
        users: accounts,
        gate: Arc::new(AccessControlService::new(token_service, users)),
    }
}

/// Handler state plus the store the readiness probe consults.
pub(crate) struct BuiltState {
    pub http: web::Data<HttpState>,
    pub store_health: Arc<dyn StoreHealth>,
}

/// Build the HTTP state, using Diesel repositories when a pool is
/// configured and the in-memory store otherwise.
pub(crate) fn build_http_state(config: &ServerConfig) -> BuiltState {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let (ports, store_health): (HttpStatePorts, Arc<dyn StoreHealth>) = match &config.db_pool {
        Some(pool) => (
            build_ports(
                Arc::new(DieselTicketRepository::new(pool.clone())),
                Arc::new(DieselUserRepository::new(pool.clone())),
                config,
                clock,
            ),
            Arc::new(pool.clone()),
        ),
        None => {
            info!("no database configured; using the in-memory store");
            let store = Arc::new(InMemoryStore::new());
            (
                build_ports(store.clone(), store.clone(), config, clock),
                store,
            )
        }
    };
    BuiltState {
        http: web::Data::new(HttpState::new(ports)),
        store_health,
    }
}
