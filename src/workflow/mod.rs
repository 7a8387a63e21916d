//! The transfer workflow engine: validates an initiation, applies its
//! write set atomically through the store, and transitions a transfer
//! through its pending -> approved/rejected lifecycle. Completion belongs
//! to the receiving office's own process and is only an extension point
//! here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::audit::AuditRecorder;
use crate::directory::JurisdictionDirectory;
use crate::error::TransferError;
use crate::models::{Actor, AuditLogEntry, TransferHistory, TransferStatus};
use crate::slip::{self, TransferSlip};
use crate::store::{DecisionRecord, RegistryStore, TransferPlan};

#[derive(Deserialize, Clone, Debug)]
pub struct InitiateTransfer {
    pub family_id: String,
    pub from_office: String,
    pub to_office: String,
    pub reason: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct InitiateOutcome {
    pub transfer_id: String,
    pub slip: TransferSlip,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransferDecision {
    Approve,
    Reject,
}

/// Human-readable transfer identifier: a UTC timestamp for operational
/// legibility plus a random segment for collision resistance.
pub fn new_transfer_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("TRF-{}-{}", now.format("%Y%m%d%H%M%S"), &suffix[..8])
}

#[derive(Clone)]
pub struct TransferWorkflow {
    store: Arc<dyn RegistryStore>,
    directory: Arc<dyn JurisdictionDirectory>,
    audit: Arc<dyn AuditRecorder>,
}

impl TransferWorkflow {
    pub fn new(
        store: Arc<dyn RegistryStore>,
        directory: Arc<dyn JurisdictionDirectory>,
        audit: Arc<dyn AuditRecorder>,
    ) -> Self {
        Self {
            store,
            directory,
            audit,
        }
    }

    pub async fn initiate(
        &self,
        params: InitiateTransfer,
        actor: Actor,
    ) -> Result<InitiateOutcome, TransferError> {
        let family = self
            .store
            .family_in_office(&params.family_id, &params.from_office)
            .await?
            .ok_or_else(|| {
                TransferError::NotFound(format!(
                    "family {} not found under office {}",
                    params.family_id, params.from_office
                ))
            })?;

        if family.is_transferred {
            return Err(TransferError::Conflict(format!(
                "family {} already has an active transfer",
                family.id
            )));
        }
        if params.to_office == params.from_office {
            return Err(TransferError::Validation(
                "a family cannot be transferred to its current jurisdiction".to_string(),
            ));
        }
        if params.reason.trim().is_empty() {
            return Err(TransferError::Validation(
                "a transfer reason is required".to_string(),
            ));
        }

        let members = self.store.members_of(&params.family_id).await?;
        if members.is_empty() {
            return Err(TransferError::Validation(format!(
                "family {} has no members to transfer",
                family.id
            )));
        }

        let origin = self
            .directory
            .lookup(&params.from_office)
            .await?
            .ok_or_else(|| {
                TransferError::NotFound(format!("jurisdiction {} not found", params.from_office))
            })?;
        let destination = self
            .directory
            .lookup(&params.to_office)
            .await?
            .ok_or_else(|| {
                TransferError::NotFound(format!("jurisdiction {} not found", params.to_office))
            })?;

        let requested_at = Utc::now();
        let transfer_id = new_transfer_id(requested_at);

        // Denormalized snapshot kept on the family row for quick display
        // without re-joining the transfer tables.
        let summary = serde_json::json!({
            "transfer_id": transfer_id,
            "status": TransferStatus::Pending.as_str(),
            "from_office": origin.id,
            "from_name": origin.name,
            "from_division": origin.division,
            "to_office": destination.id,
            "to_name": destination.name,
            "to_division": destination.division,
            "reason": params.reason,
            "requested_by": actor.user_id,
            "member_count": members.len(),
            "requested_at": requested_at,
        });

        let plan = TransferPlan {
            transfer_id: transfer_id.clone(),
            family_id: params.family_id.clone(),
            from_office: params.from_office.clone(),
            to_office: params.to_office.clone(),
            from_division: origin.division.clone(),
            to_division: destination.division.clone(),
            reason: params.reason.clone(),
            notes: params.notes.clone(),
            requested_by: actor.user_id.clone(),
            requested_at,
            member_ids: members.iter().map(|m| m.id).collect(),
            summary,
        };
        self.store.create_transfer(&plan).await?;

        info!(
            transfer_id = %transfer_id,
            family_id = %params.family_id,
            from = %params.from_office,
            to = %params.to_office,
            members = members.len(),
            "transfer initiated"
        );
        self.audit
            .append(AuditLogEntry {
                actor: actor.user_id.clone(),
                action: "transfer_initiated".to_string(),
                table_name: "transfer_history".to_string(),
                record_id: transfer_id.clone(),
                payload: serde_json::json!({
                    "family_id": params.family_id,
                    "from_office": params.from_office,
                    "to_office": params.to_office,
                    "reason": params.reason,
                    "member_count": members.len(),
                    "actor_office": actor.office_id,
                }),
            })
            .await;

        let slip = slip::build_slip(
            self.store.as_ref(),
            self.directory.as_ref(),
            &transfer_id,
            &params.family_id,
        )
        .await?;

        Ok(InitiateOutcome { transfer_id, slip })
    }

    pub async fn decide(
        &self,
        transfer_id: &str,
        decision: TransferDecision,
        actor: Actor,
        rejection_reason: Option<String>,
    ) -> Result<(), TransferError> {
        let decided_at = Utc::now();
        let record = match decision {
            TransferDecision::Approve => DecisionRecord {
                status: TransferStatus::Approved,
                decided_by: actor.user_id.clone(),
                decided_at,
                rejection_reason: None,
                summary_patch: serde_json::json!({
                    "status": TransferStatus::Approved.as_str(),
                    "approved_by": actor.user_id,
                    "approved_at": decided_at,
                }),
            },
            TransferDecision::Reject => {
                let reason = rejection_reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .ok_or_else(|| {
                        TransferError::Validation("a rejection reason is required".to_string())
                    })?
                    .to_string();
                DecisionRecord {
                    status: TransferStatus::Rejected,
                    decided_by: actor.user_id.clone(),
                    decided_at,
                    rejection_reason: Some(reason.clone()),
                    summary_patch: serde_json::json!({
                        "status": TransferStatus::Rejected.as_str(),
                        "rejected_by": actor.user_id,
                        "rejected_at": decided_at,
                        "rejection_reason": reason,
                    }),
                }
            }
        };

        let history = self.store.record_decision(transfer_id, &record).await?;

        let action = match decision {
            TransferDecision::Approve => "transfer_approved",
            TransferDecision::Reject => "transfer_rejected",
        };
        info!(
            transfer_id = %transfer_id,
            family_id = %history.family_id,
            action,
            "transfer decision recorded"
        );
        self.audit
            .append(AuditLogEntry {
                actor: actor.user_id.clone(),
                action: action.to_string(),
                table_name: "transfer_history".to_string(),
                record_id: transfer_id.to_string(),
                payload: serde_json::json!({
                    "family_id": history.family_id,
                    "status": history.status.as_str(),
                    "rejection_reason": record.rejection_reason,
                    "actor_office": actor.office_id,
                }),
            })
            .await;

        Ok(())
    }

    /// Extension point for the receiving jurisdiction's own process.
    /// Checks the transition's preconditions, then refuses: completion is
    /// never performed by the originating service.
    pub async fn complete(&self, transfer_id: &str, _actor: Actor) -> Result<(), TransferError> {
        let history = self
            .store
            .transfer(transfer_id)
            .await?
            .ok_or_else(|| TransferError::NotFound(format!("transfer {transfer_id} not found")))?;

        if history.status != TransferStatus::Approved {
            return Err(TransferError::Conflict(format!(
                "transfer {} cannot be completed from status '{}'",
                transfer_id,
                history.status.as_str()
            )));
        }
        Err(TransferError::NotImplemented(
            "family transfer completion must be performed by the receiving office".to_string(),
        ))
    }

    pub async fn slip(&self, transfer_id: &str) -> Result<TransferSlip, TransferError> {
        let history = self
            .store
            .transfer(transfer_id)
            .await?
            .ok_or_else(|| TransferError::NotFound(format!("transfer {transfer_id} not found")))?;

        slip::build_slip(
            self.store.as_ref(),
            self.directory.as_ref(),
            transfer_id,
            &history.family_id,
        )
        .await
    }

    pub async fn transfer(&self, transfer_id: &str) -> Result<TransferHistory, TransferError> {
        self.store
            .transfer(transfer_id)
            .await?
            .ok_or_else(|| TransferError::NotFound(format!("transfer {transfer_id} not found")))
    }

    pub async fn list_transfers(
        &self,
        family_id: Option<&str>,
    ) -> Result<Vec<TransferHistory>, TransferError> {
        self.store.list_transfers(family_id).await
    }

    /// Approved transfers the destination office has yet to act on,
    /// derived from transfer status rather than a family flag.
    pub async fn awaiting_destination(
        &self,
        office_id: &str,
    ) -> Result<Vec<TransferHistory>, TransferError> {
        self.store.awaiting_destination(office_id).await
    }
}
