//! Request-scoped trace identifier.
//!
//! The HTTP trace middleware installs a [`TraceId`] in task-local storage for
//! the lifetime of each request. Domain errors pick it up on construction so
//! the identifier reaches both the error body and the `trace-id` header
//! without threading it through every service call.
//!
//! Task-locals do not follow `tokio::spawn` or `spawn_blocking`; wrap such
//! work in [`TraceId::scope`] to carry the identifier along.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

task_local! {
    static TRACE_ID: TraceId;
}

/// Correlation identifier for one inbound request.
///
/// # Examples
/// ```
/// use helpdesk::domain::TraceId;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let trace_id: TraceId = "7d3c2a4e-57b1-4a8e-9d1e-0f6c8b9a1234".parse().unwrap();
/// let seen = TraceId::scope(trace_id, async { TraceId::current() }).await;
/// assert_eq!(seen, Some(trace_id));
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Identifier of the request currently being served, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        TRACE_ID.try_with(|id| *id).ok()
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Run `fut` with `trace_id` installed as the current identifier.
    pub async fn scope<Fut>(trace_id: TraceId, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        TRACE_ID.scope(trace_id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
