use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;

use crate::audit::{AuditSink, NoopAuditSink, TracingAuditSink};
use crate::auth::{AuthError, TokenKeys};
use crate::config::AppConfig;
use crate::database::{
    AppointmentStore, MedicalRecordStore, MemoryAppointmentStore, MemoryMedicalRecordStore, MemoryPetStore,
    MemoryUserStore, PetStore, PgAppointmentStore, PgMedicalRecordStore, PgPetStore, PgUserStore, UserStore,
};
use crate::middleware::AuthGate;

/// Storage handles the router needs
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub pets: Arc<dyn PetStore>,
    pub records: Arc<dyn MedicalRecordStore>,
    pub appointments: Arc<dyn AppointmentStore>,
    /// Present when backed by Postgres; used by the health check
    pub pool: Option<PgPool>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            pets: Arc::new(PgPetStore::new(pool.clone())),
            records: Arc::new(PgMedicalRecordStore::new(pool.clone())),
            appointments: Arc::new(PgAppointmentStore::new(pool.clone())),
            pool: Some(pool),
        }
    }

    pub fn in_memory() -> Self {
        Self::with_memory(Arc::new(MemoryUserStore::new()), Arc::new(MemoryPetStore::new()))
    }

    /// In-memory stores; the caller keeps handles to users and pets
    pub fn with_memory(users: Arc<MemoryUserStore>, pets: Arc<MemoryPetStore>) -> Self {
        Self {
            users,
            pets,
            records: Arc::new(MemoryMedicalRecordStore::new()),
            appointments: Arc::new(MemoryAppointmentStore::new()),
            pool: None,
        }
    }
}

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenKeys>,
    pub gate: Arc<AuthGate>,
    pub users: Arc<dyn UserStore>,
    pub pets: Arc<dyn PetStore>,
    pub records: Arc<dyn MedicalRecordStore>,
    pub appointments: Arc<dyn AppointmentStore>,
    pub audit: Arc<dyn AuditSink>,
    pub pool: Option<PgPool>,
    pub started_at: Instant,
}

impl AppState {
    /// Fails when the token secret is not configured, so a misconfigured
    /// server never starts accepting requests.
    pub fn new(config: AppConfig, stores: Stores, audit: Arc<dyn AuditSink>) -> Result<Self, AuthError> {
        let tokens = Arc::new(TokenKeys::from_config(&config.security)?);
        let gate = Arc::new(AuthGate::new(tokens.clone(), stores.users.clone()));

        Ok(Self {
            config: Arc::new(config),
            tokens,
            gate,
            users: stores.users,
            pets: stores.pets,
            records: stores.records,
            appointments: stores.appointments,
            audit,
            pool: stores.pool,
            started_at: Instant::now(),
        })
    }
}

/// Audit sink selected by configuration
pub fn default_audit_sink(config: &AppConfig) -> Arc<dyn AuditSink> {
    if config.security.enable_audit_logging {
        Arc::new(TracingAuditSink)
    } else {
        Arc::new(NoopAuditSink)
    }
}
