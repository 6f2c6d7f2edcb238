//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccessGate, AccountCommand, DashboardQuery, TicketCommand, TicketQuery, UserAdministration,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub tickets: Arc<dyn TicketCommand>,
    pub ticket_query: Arc<dyn TicketQuery>,
    pub dashboard: Arc<dyn DashboardQuery>,
    pub accounts: Arc<dyn AccountCommand>,
    pub users: Arc<dyn UserAdministration>,
    pub gate: Arc<dyn AccessGate>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub tickets: Arc<dyn TicketCommand>,
    pub ticket_query: Arc<dyn TicketQuery>,
    pub dashboard: Arc<dyn DashboardQuery>,
    pub accounts: Arc<dyn AccountCommand>,
    pub users: Arc<dyn UserAdministration>,
    pub gate: Arc<dyn AccessGate>,
}

impl HttpState {
    /// Construct state from a ports bundle.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            tickets,
            ticket_query,
            dashboard,
            accounts,
            users,
            gate,
        } = ports;
        Self {
            tickets,
            ticket_query,
            dashboard,
            accounts,
            users,
            gate,
        }
    }
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}
