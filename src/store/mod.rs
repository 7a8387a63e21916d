use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::TransferError;
use crate::models::{Family, LandRecord, Member, TransferHistory, TransferStatus};

pub mod postgres;

#[cfg(test)]
pub mod memory;

/// Everything the workflow engine writes for one initiation, applied by
/// the store as a single atomic unit.
#[derive(Clone, Debug)]
pub struct TransferPlan {
    pub transfer_id: String,
    pub family_id: String,
    pub from_office: String,
    pub to_office: String,
    pub from_division: String,
    pub to_division: String,
    pub reason: String,
    pub notes: String,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub member_ids: Vec<i64>,
    pub summary: serde_json::Value,
}

/// Outcome of an approve/reject decision, applied conditionally on the
/// history row still being pending.
#[derive(Clone, Debug)]
pub struct DecisionRecord {
    pub status: TransferStatus,
    pub decided_by: String,
    pub decided_at: DateTime<Utc>,
    pub rejection_reason: Option<String>,
    pub summary_patch: serde_json::Value,
}

/// Durable record access for the transfer workflow. All family mutation
/// goes through `create_transfer` and `record_decision`; both are atomic
/// and enforce their preconditions under concurrency (row lock plus the
/// single-pending uniqueness constraint, and a conditional update whose
/// zero row count signals a lost race).
#[async_trait]
pub trait RegistryStore: Send + Sync {
    async fn family(&self, family_id: &str) -> Result<Option<Family>, TransferError>;

    async fn family_in_office(
        &self,
        family_id: &str,
        office_id: &str,
    ) -> Result<Option<Family>, TransferError>;

    /// Members in insertion order.
    async fn members_of(&self, family_id: &str) -> Result<Vec<Member>, TransferError>;

    async fn land_records_of(&self, family_id: &str) -> Result<Vec<LandRecord>, TransferError>;

    async fn transfer(&self, transfer_id: &str) -> Result<Option<TransferHistory>, TransferError>;

    /// History rows, newest first, optionally scoped to one family.
    async fn list_transfers(
        &self,
        family_id: Option<&str>,
    ) -> Result<Vec<TransferHistory>, TransferError>;

    /// Approved transfers the given destination office has yet to act on.
    async fn awaiting_destination(
        &self,
        office_id: &str,
    ) -> Result<Vec<TransferHistory>, TransferError>;

    async fn create_transfer(&self, plan: &TransferPlan) -> Result<(), TransferError>;

    async fn record_decision(
        &self,
        transfer_id: &str,
        decision: &DecisionRecord,
    ) -> Result<TransferHistory, TransferError>;
}
