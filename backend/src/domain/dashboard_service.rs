//! Dashboard aggregation.
//!
//! [`TicketAggregationService`] folds grouped repository reads into the
//! dashboard shapes and reports failures. [`DashboardService`] wraps any
//! [`TicketAggregates`] engine so every slice falls back to its empty value
//! instead of failing the request.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{error, warn};

use crate::domain::ports::{DashboardQuery, DashboardSnapshot, TicketAggregates, TicketRepository};
use crate::domain::ports::TicketRepositoryError;
use crate::domain::{
    AgentPerformance, DashboardSlice, Error, MissedSlaLimit, PriorityShare, Ticket, TicketStats,
    empty_priority_distribution, priority_distribution, summarise_performance,
};

fn map_repository_error(slice: DashboardSlice, error: TicketRepositoryError) -> Error {
    error!(?slice, %error, "aggregate query failed");
    Error::internal(format!("aggregate query failed: {error}"))
}

/// Aggregation engine backed by a ticket repository.
#[derive(Clone)]
pub struct TicketAggregationService<R> {
    tickets: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> TicketAggregationService<R> {
    pub fn new(tickets: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { tickets, clock }
    }
}

#[async_trait]
impl<R> TicketAggregates for TicketAggregationService<R>
where
    R: TicketRepository,
{
    async fn status_and_priority_stats(&self) -> Result<TicketStats, Error> {
        let map = |err| map_repository_error(DashboardSlice::Stats, err);
        let by_status = self.tickets.count_by_status().await.map_err(map)?;
        let by_priority = self.tickets.count_by_priority().await.map_err(map)?;
        Ok(TicketStats::from_counts(&by_status, &by_priority))
    }

    async fn priority_distribution(&self) -> Result<Vec<PriorityShare>, Error> {
        let counts = self
            .tickets
            .count_by_priority()
            .await
            .map_err(|err| map_repository_error(DashboardSlice::PriorityDistribution, err))?;
        Ok(priority_distribution(&counts))
    }

    async fn user_performance(&self) -> Result<Vec<AgentPerformance>, Error> {
        let samples = self
            .tickets
            .closed_resolutions()
            .await
            .map_err(|err| map_repository_error(DashboardSlice::UserPerformance, err))?;
        Ok(summarise_performance(&samples))
    }

    async fn missed_sla_tickets(&self, limit: MissedSlaLimit) -> Result<Vec<Ticket>, Error> {
        self.tickets
            .overdue(self.clock.utc(), limit.get())
            .await
            .map_err(|err| map_repository_error(DashboardSlice::MissedSlaTickets, err))
    }
}

/// Await `future`, substituting `fallback` when it fails.
///
/// Returns the value together with the slice name when the fallback was used.
pub async fn settle_or_default<T, F>(
    slice: DashboardSlice,
    future: F,
    fallback: impl FnOnce() -> T,
) -> (T, Option<DashboardSlice>)
where
    F: Future<Output = Result<T, Error>>,
{
    match future.await {
        Ok(value) => (value, None),
        Err(err) => {
            warn!(?slice, code = ?err.code(), error = %err, "dashboard slice degraded");
            (fallback(), Some(slice))
        }
    }
}

/// Failure-tolerant dashboard reads.
#[derive(Clone)]
pub struct DashboardService {
    engine: Arc<dyn TicketAggregates>,
}

impl DashboardService {
    pub fn new(engine: Arc<dyn TicketAggregates>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl DashboardQuery for DashboardService {
    async fn stats(&self) -> TicketStats {
        settle_or_default(
            DashboardSlice::Stats,
            self.engine.status_and_priority_stats(),
            TicketStats::default,
        )
        .await
        .0
    }

    async fn priority_distribution(&self) -> Vec<PriorityShare> {
        settle_or_default(
            DashboardSlice::PriorityDistribution,
            self.engine.priority_distribution(),
            empty_priority_distribution,
        )
        .await
        .0
    }

    async fn user_performance(&self) -> Vec<AgentPerformance> {
        settle_or_default(
            DashboardSlice::UserPerformance,
            self.engine.user_performance(),
            Vec::new,
        )
        .await
        .0
    }

    async fn missed_sla_tickets(&self, limit: MissedSlaLimit) -> Vec<Ticket> {
        settle_or_default(
            DashboardSlice::MissedSlaTickets,
            self.engine.missed_sla_tickets(limit),
            Vec::new,
        )
        .await
        .0
    }

    async fn snapshot(&self, limit: MissedSlaLimit) -> DashboardSnapshot {
        let (stats, distribution, performance, missed) = futures_util::join!(
            settle_or_default(
                DashboardSlice::Stats,
                self.engine.status_and_priority_stats(),
                TicketStats::default,
            ),
            settle_or_default(
                DashboardSlice::PriorityDistribution,
                self.engine.priority_distribution(),
                empty_priority_distribution,
            ),
            settle_or_default(
                DashboardSlice::UserPerformance,
                self.engine.user_performance(),
                Vec::new,
            ),
            settle_or_default(
                DashboardSlice::MissedSlaTickets,
                self.engine.missed_sla_tickets(limit),
                Vec::new,
            ),
        );

        let degraded = [stats.1, distribution.1, performance.1, missed.1]
            .into_iter()
            .flatten()
            .collect();
        DashboardSnapshot {
            stats: stats.0,
            priority_distribution: distribution.0,
            user_performance: performance.0,
            missed_sla_tickets: missed.0,
            degraded,
        }
    }
}

#[cfg(test)]
#[path = "dashboard_service_tests.rs"]
mod tests;
