use axum::{extract::Request, middleware::Next, response::Response, routing::MethodRouter};
use std::sync::Arc;

use crate::audit::{AuditEvent, AuditSink};

/// Emit an audit event for `action`, then run the rest of the chain.
///
/// Never fails the request: a sink error is logged and dropped.
pub async fn audit_action(sink: Arc<dyn AuditSink>, action: &'static str, request: Request, next: Next) -> Response {
    let event = AuditEvent::from_request(action, &request);
    if let Err(e) = sink.emit(&event) {
        tracing::warn!("Audit sink dropped '{}' event: {}", action, e);
    }
    next.run(request).await
}

/// Wrap one route's handlers with audit emission under `action`
pub fn audited<S>(route: MethodRouter<S>, sink: &Arc<dyn AuditSink>, action: &'static str) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    let sink = Arc::clone(sink);
    route.layer(axum::middleware::from_fn(move |request: Request, next: Next| {
        audit_action(Arc::clone(&sink), action, request, next)
    }))
}
