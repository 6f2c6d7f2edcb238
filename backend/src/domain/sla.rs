//! SLA deadlines derived from ticket creation time.
//!
//! Deadlines are computed once, when a ticket is opened, and persisted with
//! it. Later changes to the policy never move existing deadlines.

use chrono::{DateTime, Duration, Utc};

use super::Error;

/// Days a ticket may stay unresolved before it counts as breached.
pub const STANDARD_SLA_WINDOW_DAYS: u32 = 3;
/// Days until a ticket is due.
pub const STANDARD_DUE_WINDOW_DAYS: u32 = 7;

/// Errors raised while computing deadlines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlaError {
    #[error("creation time is required to compute the SLA breach date")]
    MissingCreatedAt,
}

impl From<SlaError> for Error {
    fn from(err: SlaError) -> Self {
        Error::invalid_request(err.to_string())
    }
}

/// Deadlines stamped onto a new ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaDeadlines {
    pub due_date: DateTime<Utc>,
    pub sla_breach_date: DateTime<Utc>,
}

/// Breach and due windows applied at ticket creation.
///
/// # Examples
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use helpdesk::domain::SlaPolicy;
///
/// let created = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
/// let breach = SlaPolicy::default().compute_breach_date(Some(created)).unwrap();
/// assert_eq!(breach, created + Duration::days(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaPolicy {
    breach_window: Duration,
    due_window: Duration,
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self::from_days(STANDARD_SLA_WINDOW_DAYS, STANDARD_DUE_WINDOW_DAYS)
    }
}

impl SlaPolicy {
    /// Build a policy from whole-day windows.
    pub fn from_days(breach_days: u32, due_days: u32) -> Self {
        Self {
            breach_window: Duration::days(i64::from(breach_days)),
            due_window: Duration::days(i64::from(due_days)),
        }
    }

    /// `created_at + breach window`; fails when the creation time is absent.
    pub fn compute_breach_date(
        &self,
        created_at: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>, SlaError> {
        created_at
            .map(|at| at + self.breach_window)
            .ok_or(SlaError::MissingCreatedAt)
    }

    /// `created_at + due window`.
    pub fn compute_due_date(&self, created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + self.due_window
    }

    /// Both deadlines for a ticket created at `created_at`.
    pub fn deadlines(&self, created_at: Option<DateTime<Utc>>) -> Result<SlaDeadlines, SlaError> {
        let sla_breach_date = self.compute_breach_date(created_at)?;
        let created_at = created_at.ok_or(SlaError::MissingCreatedAt)?;
        Ok(SlaDeadlines {
            due_date: self.compute_due_date(created_at),
            sla_breach_date,
        })
    }
}
