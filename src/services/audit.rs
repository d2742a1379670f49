use crate::{db::DbPool, entities::log_entry, errors::ServiceError};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use std::sync::Arc;
use tracing::{instrument, warn};

pub const SYSTEM_ACTOR: &str = "system";

/// One audit line to append after a write.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub subject: String,
    pub details: String,
    pub ref_id: Option<String>,
    pub actor: String,
}

impl AuditEntry {
    pub fn new(subject: impl Into<String>, details: impl Into<String>, actor: &str) -> Self {
        Self {
            subject: subject.into(),
            details: details.into(),
            ref_id: None,
            actor: actor.to_string(),
        }
    }

    pub fn with_ref(mut self, ref_id: impl ToString) -> Self {
        self.ref_id = Some(ref_id.to_string());
        self
    }
}

/// Inserts the entry on any connection or transaction.
pub async fn append<C: ConnectionTrait>(
    conn: &C,
    entry: AuditEntry,
) -> Result<log_entry::Model, ServiceError> {
    let model = log_entry::ActiveModel {
        date: Set(Utc::now()),
        subject: Set(entry.subject),
        details: Set(entry.details),
        ref_id: Set(entry.ref_id),
        actor: Set(entry.actor),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(model)
}

/// Append-only audit trail written after committed writes
#[derive(Clone)]
pub struct AuditLog {
    db_pool: Arc<DbPool>,
}

impl AuditLog {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Records `entry`. The write it describes has already committed, so a
    /// failure here is logged and swallowed.
    #[instrument(skip(self, entry), fields(subject = %entry.subject))]
    pub async fn record(&self, entry: AuditEntry) {
        if let Err(err) = append(&*self.db_pool, entry).await {
            warn!(error = %err, "failed to append audit log entry");
        }
    }
}
