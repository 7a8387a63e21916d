use std::sync::Arc;

use serde::Serialize;
use sqlx::{Pool, Postgres};

#[derive(Clone)]
pub struct Database {
    pool: Arc<Pool<Postgres>>,
}

#[derive(Serialize, Clone, Copy, Debug)]
pub struct RegistryStats {
    pub families: i64,
    pub transfers: i64,
    pub pending_transfers: i64,
}

impl Database {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn get_pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    pub async fn stats(&self) -> Result<RegistryStats, sqlx::Error> {
        let families: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM families")
            .fetch_one(self.get_pool())
            .await?;

        let transfers: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transfer_history")
            .fetch_one(self.get_pool())
            .await?;

        let pending: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM transfer_history WHERE status = 'pending'")
                .fetch_one(self.get_pool())
                .await?;

        Ok(RegistryStats {
            families: families.0,
            transfers: transfers.0,
            pending_transfers: pending.0,
        })
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("pool", &"Pool<Postgres>")
            .finish()
    }
}
