//! `/health/live` and `/health/ready`.
//!
//! Liveness answers one question: is the process still taking work, or has
//! a shutdown signal put it into draining? Readiness additionally requires
//! the listener to be bound and the ticket store to answer a round trip
//! within [`STORE_CHECK_TIMEOUT`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use actix_web::{HttpResponse, get, http::header, web};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::ports::StoreHealth;

/// Longest a readiness request waits on the store.
pub const STORE_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Lifecycle phase reported by both probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Starting,
    Serving,
    Draining,
}

/// Body returned by the probes.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub phase: Phase,
    /// `None` on liveness, which never touches the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_reachable: Option<bool>,
}

/// Process lifecycle plus the store to consult for readiness.
pub struct HealthState {
    listening: AtomicBool,
    draining: AtomicBool,
    store: Arc<dyn StoreHealth>,
}

impl HealthState {
    pub fn new(store: Arc<dyn StoreHealth>) -> Self {
        Self {
            listening: AtomicBool::new(false),
            draining: AtomicBool::new(false),
            store,
        }
    }

    /// The socket is bound and requests can arrive.
    pub fn mark_listening(&self) {
        self.listening.store(true, Ordering::Release);
    }

    /// A shutdown was requested. Both probes fail from here on so that
    /// balancers stop routing while in-flight requests finish.
    pub fn begin_draining(&self) {
        self.draining.store(true, Ordering::Release);
    }

    pub fn phase(&self) -> Phase {
        if self.draining.load(Ordering::Acquire) {
            Phase::Draining
        } else if self.listening.load(Ordering::Acquire) {
            Phase::Serving
        } else {
            Phase::Starting
        }
    }

    async fn store_reachable(&self) -> bool {
        match tokio::time::timeout(STORE_CHECK_TIMEOUT, self.store.check()).await {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                warn!(error = %err, "readiness: store check failed");
                false
            }
            Err(_) => {
                warn!(timeout = ?STORE_CHECK_TIMEOUT, "readiness: store check timed out");
                false
            }
        }
    }
}

fn respond(healthy: bool, report: ProbeReport) -> HttpResponse {
    let mut builder = if healthy {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    builder
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(report)
}

/// Readiness probe.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Serving and the store answers", body = ProbeReport),
        (status = 503, description = "Starting, draining or store unreachable", body = ProbeReport)
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    let phase = state.phase();
    if phase != Phase::Serving {
        return respond(
            false,
            ProbeReport {
                phase,
                store_reachable: None,
            },
        );
    }
    let reachable = state.store_reachable().await;
    respond(
        reachable,
        ProbeReport {
            phase,
            store_reachable: Some(reachable),
        },
    )
}

/// Liveness probe. Fails only once draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Process is taking work", body = ProbeReport),
        (status = 503, description = "Process is draining", body = ProbeReport)
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    let phase = state.phase();
    respond(
        phase != Phase::Draining,
        ProbeReport {
            phase,
            store_reachable: None,
        },
    )
}
