//! Driving ports for dashboard aggregates.
//!
//! [`TicketAggregates`] is the raw engine and may fail. [`DashboardQuery`] is
//! what clients call: it never fails and substitutes defaults instead.

use async_trait::async_trait;

use crate::domain::{
    AgentPerformance, DashboardSlice, Error, MissedSlaLimit, PriorityShare, Ticket, TicketStats,
};

/// Fallible aggregation reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketAggregates: Send + Sync {
    async fn status_and_priority_stats(&self) -> Result<TicketStats, Error>;

    async fn priority_distribution(&self) -> Result<Vec<PriorityShare>, Error>;

    async fn user_performance(&self) -> Result<Vec<AgentPerformance>, Error>;

    async fn missed_sla_tickets(&self, limit: MissedSlaLimit) -> Result<Vec<Ticket>, Error>;
}

/// Every dashboard slice, gathered concurrently.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub stats: TicketStats,
    pub priority_distribution: Vec<PriorityShare>,
    pub user_performance: Vec<AgentPerformance>,
    pub missed_sla_tickets: Vec<Ticket>,
    /// Slices that failed and carry their default value.
    pub degraded: Vec<DashboardSlice>,
}

/// Aggregates with per-slice fallbacks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DashboardQuery: Send + Sync {
    async fn stats(&self) -> TicketStats;

    async fn priority_distribution(&self) -> Vec<PriorityShare>;

    async fn user_performance(&self) -> Vec<AgentPerformance>;

    async fn missed_sla_tickets(&self, limit: MissedSlaLimit) -> Vec<Ticket>;

    /// Run all four reads concurrently and wait for each to settle.
    async fn snapshot(&self, limit: MissedSlaLimit) -> DashboardSnapshot;
}
