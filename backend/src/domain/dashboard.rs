//! Dashboard read models and the pure aggregation rules behind them.
//!
//! Adapters supply raw counts and resolution samples; the functions here turn
//! them into the shapes the dashboard renders, zero-filling where needed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Error;
use super::ticket::{TicketPriority, TicketStatus};
use super::user::UserId;

/// Milliseconds in one day, the unit of resolution averages.
pub const MILLIS_PER_DAY: f64 = 86_400_000.0;
/// Default number of rows returned by the missed-SLA report.
pub const DEFAULT_MISSED_SLA_LIMIT: u32 = 10;
/// Upper bound accepted for the missed-SLA report size.
pub const MAX_MISSED_SLA_LIMIT: u32 = 100;

/// Ticket counts per status; every status is always present. Keys are the
/// status wire labels (`in-progress`, `on-hold`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub struct StatusBreakdown {
    pub open: u64,
    pub in_progress: u64,
    pub closed: u64,
    pub on_hold: u64,
}

impl StatusBreakdown {
    fn slot(&mut self, status: TicketStatus) -> &mut u64 {
        match status {
            TicketStatus::Open => &mut self.open,
            TicketStatus::InProgress => &mut self.in_progress,
            TicketStatus::Closed => &mut self.closed,
            TicketStatus::OnHold => &mut self.on_hold,
        }
    }

    /// Count for one status.
    pub fn get(&self, status: TicketStatus) -> u64 {
        match status {
            TicketStatus::Open => self.open,
            TicketStatus::InProgress => self.in_progress,
            TicketStatus::Closed => self.closed,
            TicketStatus::OnHold => self.on_hold,
        }
    }
}

/// Ticket counts per priority; every priority is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriorityBreakdown {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub critical: u64,
}

impl PriorityBreakdown {
    fn slot(&mut self, priority: TicketPriority) -> &mut u64 {
        match priority {
            TicketPriority::Low => &mut self.low,
            TicketPriority::Medium => &mut self.medium,
            TicketPriority::High => &mut self.high,
            TicketPriority::Critical => &mut self.critical,
        }
    }

    /// Count for one priority.
    pub fn get(&self, priority: TicketPriority) -> u64 {
        match priority {
            TicketPriority::Low => self.low,
            TicketPriority::Medium => self.medium,
            TicketPriority::High => self.high,
            TicketPriority::Critical => self.critical,
        }
    }
}

/// Totals partitioned independently by status and by priority.
///
/// The zero value doubles as the dashboard fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketStats {
    pub total: u64,
    pub by_status: StatusBreakdown,
    pub by_priority: PriorityBreakdown,
}

impl TicketStats {
    /// Fold grouped counts into zero-filled breakdowns.
    ///
    /// # Examples
    /// ```
    /// use helpdesk::domain::{TicketPriority, TicketStats, TicketStatus};
    ///
    /// let stats = TicketStats::from_counts(
    ///     &[(TicketStatus::Open, 2), (TicketStatus::Closed, 1)],
    ///     &[(TicketPriority::High, 3)],
    /// );
    /// assert_eq!(stats.total, 3);
    /// assert_eq!(stats.by_status.on_hold, 0);
    /// ```
    pub fn from_counts(
        status_counts: &[(TicketStatus, u64)],
        priority_counts: &[(TicketPriority, u64)],
    ) -> Self {
        let mut stats = Self::default();
        for (status, count) in status_counts {
            *stats.by_status.slot(*status) += count;
            stats.total += count;
        }
        for (priority, count) in priority_counts {
            *stats.by_priority.slot(*priority) += count;
        }
        stats
    }
}

/// One slice of the priority pie chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PriorityShare {
    #[schema(example = "High")]
    pub name: String,
    pub value: u64,
}

impl PriorityShare {
    fn new(priority: TicketPriority, value: u64) -> Self {
        Self {
            name: priority.label().to_owned(),
            value,
        }
    }
}

/// Distribution shown when no tickets exist.
///
/// Lists only Low, Medium and High; Critical is left out even though it is a
/// valid level, matching what dashboards have always rendered for an empty
/// desk.
pub fn empty_priority_distribution() -> Vec<PriorityShare> {
    [TicketPriority::Low, TicketPriority::Medium, TicketPriority::High]
        .into_iter()
        .map(|priority| PriorityShare::new(priority, 0))
        .collect()
}

/// One entry per priority present, lowest first.
pub fn priority_distribution(counts: &[(TicketPriority, u64)]) -> Vec<PriorityShare> {
    let mut breakdown = PriorityBreakdown::default();
    for (priority, count) in counts {
        *breakdown.slot(*priority) += count;
    }
    let shares: Vec<_> = TicketPriority::ALL
        .into_iter()
        .filter(|priority| breakdown.get(*priority) > 0)
        .map(|priority| PriorityShare::new(priority, breakdown.get(priority)))
        .collect();
    if shares.is_empty() {
        empty_priority_distribution()
    } else {
        shares
    }
}

/// A closed, assigned ticket as seen by the performance report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionSample {
    pub agent_id: UserId,
    pub agent_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resolution throughput for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentPerformance {
    #[schema(value_type = String)]
    pub agent_id: UserId,
    pub agent_name: String,
    pub tickets_resolved: u64,
    #[schema(example = 1.5)]
    pub average_resolution_days: f64,
}

/// Group samples by agent and average their resolution time in days.
///
/// Agents without samples never appear. Ordered by tickets resolved,
/// descending, then by name.
pub fn summarise_performance(samples: &[ResolutionSample]) -> Vec<AgentPerformance> {
    let mut grouped: Vec<(UserId, String, u64, i64)> = Vec::new();
    for sample in samples {
        let elapsed = (sample.updated_at - sample.created_at).num_milliseconds();
        match grouped.iter_mut().find(|entry| entry.0 == sample.agent_id) {
            Some(entry) => {
                entry.2 += 1;
                entry.3 += elapsed;
            }
            None => grouped.push((
                sample.agent_id.clone(),
                sample.agent_name.clone(),
                1,
                elapsed,
            )),
        }
    }

    let mut report: Vec<_> = grouped
        .into_iter()
        .map(|(agent_id, agent_name, resolved, total_millis)| AgentPerformance {
            agent_id,
            agent_name,
            tickets_resolved: resolved,
            average_resolution_days: total_millis as f64 / resolved as f64 / MILLIS_PER_DAY,
        })
        .collect();
    report.sort_by(|a, b| {
        b.tickets_resolved
            .cmp(&a.tickets_resolved)
            .then_with(|| a.agent_name.cmp(&b.agent_name))
    });
    report
}

/// Validated size of the missed-SLA report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissedSlaLimit(u32);

impl MissedSlaLimit {
    /// Accept limits between 1 and [`MAX_MISSED_SLA_LIMIT`].
    pub fn new(limit: u32) -> Result<Self, Error> {
        if limit == 0 || limit > MAX_MISSED_SLA_LIMIT {
            return Err(Error::invalid_request(format!(
                "limit must be between 1 and {MAX_MISSED_SLA_LIMIT}"
            ))
            .with_details(serde_json::json!({ "field": "limit", "code": "out_of_range" })));
        }
        Ok(Self(limit))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for MissedSlaLimit {
    fn default() -> Self {
        Self(DEFAULT_MISSED_SLA_LIMIT)
    }
}

/// Named parts of the dashboard, reported when one falls back to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum DashboardSlice {
    Stats,
    PriorityDistribution,
    UserPerformance,
    MissedSlaTickets,
}
