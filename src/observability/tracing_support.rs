//! Tracing spans for dispatch and session calls.

use crate::session::Domain;
use tracing::{Level, Span, span};

/// Create a span for a loader operation.
///
/// # Example
///
/// ```rust,ignore
/// let span = span_loader(loader.id(), "create_session");
/// let _guard = span.enter();
/// ```
#[inline]
pub fn span_loader(loader_id: u64, operation: &'static str) -> Span {
    span!(Level::DEBUG, "loader", id = loader_id, op = operation)
}

/// Create a span for a lifecycle call on one domain of a session.
#[inline]
pub fn span_session_domain(session_id: u64, domain: Domain, operation: &'static str) -> Span {
    span!(
        Level::DEBUG,
        "session",
        id = session_id,
        domain = domain.name(),
        op = operation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_without_subscriber() {
        let span = span_loader(1, "enum");
        let _guard = span.enter();
        let inner = span_session_domain(2, Domain::Decode, "init");
        let _inner = inner.enter();
    }
}
