use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::models::AuditLogEntry;

/// Append-only audit sink. Appends happen after the workflow transaction
/// commits and are best-effort: a failed append is logged and swallowed,
/// never surfaced as a workflow failure.
#[async_trait]
pub trait AuditRecorder: Send + Sync {
    async fn append(&self, entry: AuditLogEntry);
}

pub struct PgAuditRecorder {
    pool: PgPool,
}

impl PgAuditRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRecorder for PgAuditRecorder {
    async fn append(&self, entry: AuditLogEntry) {
        let result = sqlx::query(
            "INSERT INTO audit_log (id, actor, action, table_name, record_id, payload) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(&entry.actor)
        .bind(&entry.action)
        .bind(&entry.table_name)
        .bind(&entry.record_id)
        .bind(&entry.payload)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(
                action = %entry.action,
                record_id = %entry.record_id,
                "audit append failed: {e}"
            );
        }
    }
}
