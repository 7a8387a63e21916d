use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::TransferError;
use crate::models::Jurisdiction;

/// Read-only lookup into the administrative office hierarchy. The
/// directory is owned elsewhere; this core never mutates it.
#[async_trait]
pub trait JurisdictionDirectory: Send + Sync {
    async fn lookup(&self, office_id: &str) -> Result<Option<Jurisdiction>, TransferError>;

    async fn list(&self) -> Result<Vec<Jurisdiction>, TransferError>;
}

pub struct PgJurisdictionDirectory {
    pool: PgPool,
}

impl PgJurisdictionDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_office(row: PgRow) -> Jurisdiction {
    Jurisdiction {
        id: row.get("id"),
        name: row.get("name"),
        division: row.get("division"),
        district: row.get("district"),
        province: row.get("province"),
    }
}

#[async_trait]
impl JurisdictionDirectory for PgJurisdictionDirectory {
    async fn lookup(&self, office_id: &str) -> Result<Option<Jurisdiction>, TransferError> {
        let office = sqlx::query(
            "SELECT id, name, division, district, province FROM offices WHERE id = $1",
        )
        .bind(office_id)
        .map(map_office)
        .fetch_optional(&self.pool)
        .await?;

        Ok(office)
    }

    async fn list(&self) -> Result<Vec<Jurisdiction>, TransferError> {
        let offices = sqlx::query(
            "SELECT id, name, division, district, province FROM offices ORDER BY province, district, division, name",
        )
        .map(map_office)
        .fetch_all(&self.pool)
        .await?;

        Ok(offices)
    }
}
