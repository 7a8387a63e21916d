use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Family registry record. Owned by the CRUD subsystem; the transfer
/// workflow mutates only the two flags and `transfer_summary`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Family {
    pub id: String,
    pub office_id: String,
    pub address: String,
    pub head_nic: String,
    pub member_count: i64,
    pub is_transferred: bool,
    pub has_pending_transfer: bool,
    pub transfer_summary: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Member {
    pub id: i64,
    pub family_id: String,
    pub full_name: String,
    pub nic: Option<String>,
    /// "head", "spouse", or any other relationship label.
    pub relationship: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LandRecord {
    pub id: Uuid,
    pub family_id: String,
    pub lot_number: String,
    pub extent: String,
    pub ownership_type: String,
}

/// Descriptive metadata for an administrative office, resolved through
/// the Jurisdiction Directory.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Jurisdiction {
    pub id: String,
    pub name: String,
    pub division: String,
    pub district: String,
    pub province: String,
}

/// Lifecycle state of a transfer attempt. `Completed` is reachable only
/// through the receiving office's own process, never through this service.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Approved => "approved",
            TransferStatus::Rejected => "rejected",
            TransferStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<TransferStatus> {
        match s {
            "pending" => Some(TransferStatus::Pending),
            "approved" => Some(TransferStatus::Approved),
            "rejected" => Some(TransferStatus::Rejected),
            "completed" => Some(TransferStatus::Completed),
            _ => None,
        }
    }
}

/// One row per (member, transfer attempt), created only as a batch.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TransferRequest {
    pub id: Uuid,
    pub transfer_id: String,
    pub member_id: i64,
    pub family_id: String,
    pub from_office: String,
    pub to_office: String,
    pub from_division: String,
    pub to_division: String,
    pub reason: String,
    pub notes: String,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub status: TransferStatus,
}

/// One row per transfer attempt; the authoritative record the
/// approve/reject decision operates on.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TransferHistory {
    pub transfer_id: String,
    pub family_id: String,
    pub from_office: String,
    pub to_office: String,
    pub reason: String,
    pub notes: String,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub status: TransferStatus,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub rejected_at: Option<DateTime<Utc>>,
}

/// Append-only audit record; written by the workflow, never read back.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AuditLogEntry {
    pub actor: String,
    pub action: String,
    pub table_name: String,
    pub record_id: String,
    pub payload: serde_json::Value,
}

/// The acting office staff member, threaded explicitly through every
/// workflow call.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Actor {
    pub office_id: String,
    pub user_id: String,
}
