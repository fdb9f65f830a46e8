//! Compliance audit trail.
//!
//! An [`AuditEvent`] records who touched which endpoint. Events go to an
//! [`AuditSink`]; sink failures are the sink owner's problem and never reach
//! the client.

use axum::{
    extract::{ConnectInfo, OriginalUri, Request},
    http::header::USER_AGENT,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Mutex;
use thiserror::Error;

use crate::auth::Identity;

pub const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    /// Principal id, or `"anonymous"` when no identity is attached
    pub user_id: String,
    pub action: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub endpoint: String,
    pub method: String,
}

impl AuditEvent {
    /// Build an event from whatever the request carries at this point
    pub fn from_request(action: &str, request: &Request) -> Self {
        let extensions = request.extensions();
        Self {
            timestamp: Utc::now(),
            user_id: extensions
                .get::<Identity>()
                .map(|identity| identity.id.to_string())
                .unwrap_or_else(|| ANONYMOUS.to_string()),
            action: action.to_string(),
            ip: extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string()),
            user_agent: request
                .headers()
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            // Nested routers see a stripped uri; record the one the client sent
            endpoint: extensions
                .get::<OriginalUri>()
                .map(|OriginalUri(uri)| uri)
                .unwrap_or_else(|| request.uri())
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| request.uri().path().to_string()),
            method: request.method().to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to encode audit event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for audit events. Called synchronously on the request path.
pub trait AuditSink: Send + Sync {
    fn emit(&self, event: &AuditEvent) -> Result<(), AuditError>;
}

/// Writes each event as one JSON line on the `audit` tracing target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let line = serde_json::to_string(event)?;
        tracing::info!(target: "audit", "[HIPAA AUDIT] {}", line);
        Ok(())
    }
}

/// Drops every event (audit logging disabled)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn emit(&self, _event: &AuditEvent) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Keeps events in memory so tests can inspect them
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn emit(&self, event: &AuditEvent) -> Result<(), AuditError> {
        self.events
            .lock()
            .map_err(|e| AuditError::Unavailable(e.to_string()))?
            .push(event.clone());
        Ok(())
    }
}
