use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::TransferError;
use crate::models::{Family, LandRecord, Member, TransferHistory, TransferStatus};
use crate::store::{DecisionRecord, RegistryStore, TransferPlan};

pub struct PgRegistryStore {
    pool: PgPool,
}

impl PgRegistryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const FAMILY_COLUMNS: &str = "id, office_id, address, head_nic, member_count, is_transferred, \
     has_pending_transfer, transfer_summary, created_at, updated_at";

const HISTORY_COLUMNS: &str = "transfer_id, family_id, from_office, to_office, reason, notes, \
     requested_by, requested_at, status, approved_by, approved_at, rejection_reason, rejected_at";

fn map_family(row: PgRow) -> Family {
    Family {
        id: row.get("id"),
        office_id: row.get("office_id"),
        address: row.get("address"),
        head_nic: row.get("head_nic"),
        member_count: row.get("member_count"),
        is_transferred: row.get("is_transferred"),
        has_pending_transfer: row.get("has_pending_transfer"),
        transfer_summary: row.get("transfer_summary"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn map_member(row: PgRow) -> Member {
    Member {
        id: row.get("id"),
        family_id: row.get("family_id"),
        full_name: row.get("full_name"),
        nic: row.get("nic"),
        relationship: row.get("relationship"),
        created_at: row.get("created_at"),
    }
}

fn map_history(row: PgRow) -> TransferHistory {
    let status: String = row.get("status");
    TransferHistory {
        transfer_id: row.get("transfer_id"),
        family_id: row.get("family_id"),
        from_office: row.get("from_office"),
        to_office: row.get("to_office"),
        reason: row.get("reason"),
        notes: row.get("notes"),
        requested_by: row.get("requested_by"),
        requested_at: row.get("requested_at"),
        status: TransferStatus::parse(&status).unwrap_or(TransferStatus::Pending),
        approved_by: row.get("approved_by"),
        approved_at: row.get("approved_at"),
        rejection_reason: row.get("rejection_reason"),
        rejected_at: row.get("rejected_at"),
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl RegistryStore for PgRegistryStore {
    async fn family(&self, family_id: &str) -> Result<Option<Family>, TransferError> {
        let family = sqlx::query(&format!(
            "SELECT {FAMILY_COLUMNS} FROM families WHERE id = $1"
        ))
        .bind(family_id)
        .map(map_family)
        .fetch_optional(&self.pool)
        .await?;

        Ok(family)
    }

    async fn family_in_office(
        &self,
        family_id: &str,
        office_id: &str,
    ) -> Result<Option<Family>, TransferError> {
        let family = sqlx::query(&format!(
            "SELECT {FAMILY_COLUMNS} FROM families WHERE id = $1 AND office_id = $2"
        ))
        .bind(family_id)
        .bind(office_id)
        .map(map_family)
        .fetch_optional(&self.pool)
        .await?;

        Ok(family)
    }

    async fn members_of(&self, family_id: &str) -> Result<Vec<Member>, TransferError> {
        let members = sqlx::query(
            "SELECT id, family_id, full_name, nic, relationship, created_at \
             FROM members WHERE family_id = $1 ORDER BY id",
        )
        .bind(family_id)
        .map(map_member)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    async fn land_records_of(&self, family_id: &str) -> Result<Vec<LandRecord>, TransferError> {
        let records = sqlx::query(
            "SELECT id, family_id, lot_number, extent, ownership_type \
             FROM land_records WHERE family_id = $1 ORDER BY lot_number",
        )
        .bind(family_id)
        .map(|row: PgRow| LandRecord {
            id: row.get("id"),
            family_id: row.get("family_id"),
            lot_number: row.get("lot_number"),
            extent: row.get("extent"),
            ownership_type: row.get("ownership_type"),
        })
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn transfer(&self, transfer_id: &str) -> Result<Option<TransferHistory>, TransferError> {
        let history = sqlx::query(&format!(
            "SELECT {HISTORY_COLUMNS} FROM transfer_history WHERE transfer_id = $1"
        ))
        .bind(transfer_id)
        .map(map_history)
        .fetch_optional(&self.pool)
        .await?;

        Ok(history)
    }

    async fn list_transfers(
        &self,
        family_id: Option<&str>,
    ) -> Result<Vec<TransferHistory>, TransferError> {
        let rows = if let Some(fid) = family_id {
            sqlx::query(&format!(
                "SELECT {HISTORY_COLUMNS} FROM transfer_history \
                 WHERE family_id = $1 ORDER BY requested_at DESC"
            ))
            .bind(fid)
            .map(map_history)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(&format!(
                "SELECT {HISTORY_COLUMNS} FROM transfer_history ORDER BY requested_at DESC"
            ))
            .map(map_history)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(rows)
    }

    async fn awaiting_destination(
        &self,
        office_id: &str,
    ) -> Result<Vec<TransferHistory>, TransferError> {
        let rows = sqlx::query(&format!(
            "SELECT {HISTORY_COLUMNS} FROM transfer_history \
             WHERE to_office = $1 AND status = 'approved' ORDER BY approved_at DESC"
        ))
        .bind(office_id)
        .map(map_history)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn create_transfer(&self, plan: &TransferPlan) -> Result<(), TransferError> {
        let mut tx = self.pool.begin().await?;

        // Lock the family row so two concurrent initiations serialize here.
        let family = sqlx::query(
            "SELECT is_transferred FROM families WHERE id = $1 AND office_id = $2 FOR UPDATE",
        )
        .bind(&plan.family_id)
        .bind(&plan.from_office)
        .fetch_optional(&mut *tx)
        .await?;

        let is_transferred = match family {
            Some(row) => row.get::<bool, _>("is_transferred"),
            None => {
                return Err(TransferError::NotFound(format!(
                    "family {} not found under office {}",
                    plan.family_id, plan.from_office
                )))
            }
        };
        if is_transferred {
            return Err(TransferError::Conflict(format!(
                "family {} already has an active transfer",
                plan.family_id
            )));
        }

        // The partial unique index on (family_id) WHERE status = 'pending'
        // backstops the lock for initiations racing through other paths.
        let inserted = sqlx::query(
            "INSERT INTO transfer_history \
             (transfer_id, family_id, from_office, to_office, reason, notes, requested_by, requested_at, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending')",
        )
        .bind(&plan.transfer_id)
        .bind(&plan.family_id)
        .bind(&plan.from_office)
        .bind(&plan.to_office)
        .bind(&plan.reason)
        .bind(&plan.notes)
        .bind(&plan.requested_by)
        .bind(plan.requested_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if is_unique_violation(&e) {
                return Err(TransferError::Conflict(format!(
                    "a pending transfer already exists for family {}",
                    plan.family_id
                )));
            }
            return Err(e.into());
        }

        for member_id in &plan.member_ids {
            sqlx::query(
                "INSERT INTO transfer_requests \
                 (id, transfer_id, member_id, family_id, from_office, to_office, from_division, \
                  to_division, reason, notes, requested_by, requested_at, status) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'pending')",
            )
            .bind(Uuid::new_v4())
            .bind(&plan.transfer_id)
            .bind(member_id)
            .bind(&plan.family_id)
            .bind(&plan.from_office)
            .bind(&plan.to_office)
            .bind(&plan.from_division)
            .bind(&plan.to_division)
            .bind(&plan.reason)
            .bind(&plan.notes)
            .bind(&plan.requested_by)
            .bind(plan.requested_at)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE families SET is_transferred = TRUE, has_pending_transfer = TRUE, \
             transfer_summary = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(&plan.summary)
        .bind(&plan.family_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn record_decision(
        &self,
        transfer_id: &str,
        decision: &DecisionRecord,
    ) -> Result<TransferHistory, TransferError> {
        let mut tx = self.pool.begin().await?;

        // Conditional update: zero rows means the pending precondition
        // failed, either because the id is unknown or a concurrent
        // decision already landed.
        let updated = match decision.status {
            TransferStatus::Approved => {
                sqlx::query(&format!(
                    "UPDATE transfer_history SET status = 'approved', approved_by = $1, approved_at = $2 \
                     WHERE transfer_id = $3 AND status = 'pending' RETURNING {HISTORY_COLUMNS}"
                ))
                .bind(&decision.decided_by)
                .bind(decision.decided_at)
                .bind(transfer_id)
                .map(map_history)
                .fetch_optional(&mut *tx)
                .await?
            }
            TransferStatus::Rejected => {
                sqlx::query(&format!(
                    "UPDATE transfer_history SET status = 'rejected', rejection_reason = $1, rejected_at = $2 \
                     WHERE transfer_id = $3 AND status = 'pending' RETURNING {HISTORY_COLUMNS}"
                ))
                .bind(&decision.rejection_reason)
                .bind(decision.decided_at)
                .bind(transfer_id)
                .map(map_history)
                .fetch_optional(&mut *tx)
                .await?
            }
            other => {
                return Err(TransferError::Validation(format!(
                    "cannot record a decision with status '{}'",
                    other.as_str()
                )))
            }
        };

        let history = match updated {
            Some(history) => history,
            None => {
                let existing = sqlx::query("SELECT status FROM transfer_history WHERE transfer_id = $1")
                    .bind(transfer_id)
                    .fetch_optional(&mut *tx)
                    .await?;
                return Err(match existing {
                    Some(row) => TransferError::Conflict(format!(
                        "transfer {} was already processed (status: {})",
                        transfer_id,
                        row.get::<String, _>("status")
                    )),
                    None => TransferError::NotFound(format!("transfer {transfer_id} not found")),
                });
            }
        };

        // Request rows mirror the decision; they never drive it.
        sqlx::query("UPDATE transfer_requests SET status = $1 WHERE transfer_id = $2")
            .bind(decision.status.as_str())
            .bind(transfer_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE families SET has_pending_transfer = FALSE, \
             transfer_summary = COALESCE(transfer_summary, '{}'::jsonb) || $1, updated_at = NOW() \
             WHERE id = $2",
        )
        .bind(&decision.summary_patch)
        .bind(&history.family_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(history)
    }
}
