pub mod transfer;

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::audit::PgAuditRecorder;
use crate::database::Database;
use crate::directory::{JurisdictionDirectory, PgJurisdictionDirectory};
use crate::store::postgres::PgRegistryStore;
use crate::workflow::TransferWorkflow;

#[derive(Clone)]
pub struct AppState {
    pub workflow: TransferWorkflow,
    pub directory: Arc<dyn JurisdictionDirectory>,
    pub database: Database,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let store = Arc::new(PgRegistryStore::new(pool.clone()));
        let directory: Arc<dyn JurisdictionDirectory> =
            Arc::new(PgJurisdictionDirectory::new(pool.clone()));
        let audit = Arc::new(PgAuditRecorder::new(pool.clone()));
        Self {
            workflow: TransferWorkflow::new(store, directory.clone(), audit),
            directory,
            database: Database::new(pool),
        }
    }
}

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    match state.database.stats().await {
        Ok(stats) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "message": "Family Registry API",
            "version": env!("CARGO_PKG_VERSION"),
            "families": stats.families,
            "transfers": stats.transfers,
            "pending_transfers": stats.pending_transfers,
        })),
        Err(e) => {
            tracing::error!("health check failed: {e}");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "degraded",
                "message": "database unavailable",
            }))
        }
    }
}
