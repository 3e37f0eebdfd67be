use std::future::Future;
use std::time::Duration;

use tokio::time::{error::Elapsed, Instant};

/// Request scoped diagnostic state handed to every validation step.
///
/// Carries the identifiers used to correlate logs and outgoing requests, and the
/// deadline after which remote calls are abandoned.
#[derive(Debug, Clone)]
pub struct DiagnosticContext {
    trace_id: String,
    span_id: String,
    deadline: Option<Instant>,
}

impl Default for DiagnosticContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticContext {
    /// A context with fresh trace and span ids and no deadline.
    pub fn new() -> Self {
        Self::with_trace_id(uuid::Uuid::new_v4().to_string())
    }

    /// A context continuing an existing trace, e.g. taken from an inbound request header.
    pub fn with_trace_id(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            span_id: new_span_id(),
            deadline: None,
        }
    }

    pub fn set_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the deadline relative to now.
    pub fn set_timeout(self, timeout: Duration) -> Self {
        self.set_deadline(Instant::now() + timeout)
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn span_id(&self) -> &str {
        &self.span_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Same trace and deadline, new span id.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: new_span_id(),
            deadline: self.deadline,
        }
    }

    /// The tracing span every log line of a validation is emitted in.
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "presentation_exchange",
            trace_id = %self.trace_id,
            span_id = %self.span_id,
        )
    }

    /// Run `future` until it completes, `limit` elapses, or the context deadline passes,
    /// whichever comes first.
    pub(crate) async fn bounded<F>(
        &self,
        limit: Option<Duration>,
        future: F,
    ) -> Result<F::Output, Elapsed>
    where
        F: Future,
    {
        let local = limit.map(|limit| Instant::now() + limit);
        let deadline = match (local, self.deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, future).await,
            None => Ok(future.await),
        }
    }
}

fn new_span_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..16].to_string()
}
