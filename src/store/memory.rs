//! In-memory fakes for the workflow engine's unit tests. Same
//! preconditions and atomicity semantics as the Postgres store, applied
//! under one mutex.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::audit::AuditRecorder;
use crate::directory::JurisdictionDirectory;
use crate::error::TransferError;
use crate::models::{
    AuditLogEntry, Family, Jurisdiction, LandRecord, Member, TransferHistory, TransferRequest,
    TransferStatus,
};
use crate::store::{DecisionRecord, RegistryStore, TransferPlan};

#[derive(Default)]
struct State {
    families: HashMap<String, Family>,
    members: Vec<Member>,
    land_records: Vec<LandRecord>,
    requests: Vec<TransferRequest>,
    history: Vec<TransferHistory>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_family(&self, id: &str, office_id: &str) {
        let mut state = self.state.lock().unwrap();
        state.families.insert(
            id.to_string(),
            Family {
                id: id.to_string(),
                office_id: office_id.to_string(),
                address: "12 Temple Road".to_string(),
                head_nic: "751234567V".to_string(),
                member_count: 0,
                is_transferred: false,
                has_pending_transfer: false,
                transfer_summary: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        );
    }

    pub fn insert_member(&self, family_id: &str, full_name: &str, relationship: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.members.len() as i64 + 1;
        state.members.push(Member {
            id,
            family_id: family_id.to_string(),
            full_name: full_name.to_string(),
            nic: None,
            relationship: relationship.to_string(),
            created_at: Utc::now(),
        });
        if let Some(family) = state.families.get_mut(family_id) {
            family.member_count += 1;
        }
        id
    }

    pub fn insert_land_record(&self, family_id: &str, lot_number: &str) {
        let mut state = self.state.lock().unwrap();
        state.land_records.push(LandRecord {
            id: Uuid::new_v4(),
            family_id: family_id.to_string(),
            lot_number: lot_number.to_string(),
            extent: "0.5 acres".to_string(),
            ownership_type: "deeded".to_string(),
        });
    }

    pub fn request_rows(&self, transfer_id: &str) -> Vec<TransferRequest> {
        let state = self.state.lock().unwrap();
        state
            .requests
            .iter()
            .filter(|r| r.transfer_id == transfer_id)
            .cloned()
            .collect()
    }

    pub fn family_snapshot(&self, family_id: &str) -> Family {
        let state = self.state.lock().unwrap();
        state.families.get(family_id).cloned().unwrap()
    }

    pub fn pending_count(&self, family_id: &str) -> usize {
        let state = self.state.lock().unwrap();
        state
            .history
            .iter()
            .filter(|h| h.family_id == family_id && h.status == TransferStatus::Pending)
            .count()
    }
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn family(&self, family_id: &str) -> Result<Option<Family>, TransferError> {
        let state = self.state.lock().unwrap();
        Ok(state.families.get(family_id).cloned())
    }

    async fn family_in_office(
        &self,
        family_id: &str,
        office_id: &str,
    ) -> Result<Option<Family>, TransferError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .families
            .get(family_id)
            .filter(|f| f.office_id == office_id)
            .cloned())
    }

    async fn members_of(&self, family_id: &str) -> Result<Vec<Member>, TransferError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .members
            .iter()
            .filter(|m| m.family_id == family_id)
            .cloned()
            .collect())
    }

    async fn land_records_of(&self, family_id: &str) -> Result<Vec<LandRecord>, TransferError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .land_records
            .iter()
            .filter(|l| l.family_id == family_id)
            .cloned()
            .collect())
    }

    async fn transfer(&self, transfer_id: &str) -> Result<Option<TransferHistory>, TransferError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .history
            .iter()
            .find(|h| h.transfer_id == transfer_id)
            .cloned())
    }

    async fn list_transfers(
        &self,
        family_id: Option<&str>,
    ) -> Result<Vec<TransferHistory>, TransferError> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<TransferHistory> = state
            .history
            .iter()
            .filter(|h| family_id.map(|f| h.family_id == f).unwrap_or(true))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(rows)
    }

    async fn awaiting_destination(
        &self,
        office_id: &str,
    ) -> Result<Vec<TransferHistory>, TransferError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .history
            .iter()
            .filter(|h| h.to_office == office_id && h.status == TransferStatus::Approved)
            .cloned()
            .collect())
    }

    async fn create_transfer(&self, plan: &TransferPlan) -> Result<(), TransferError> {
        let mut state = self.state.lock().unwrap();

        let family = state
            .families
            .get(&plan.family_id)
            .filter(|f| f.office_id == plan.from_office);
        let family = match family {
            Some(f) => f,
            None => {
                return Err(TransferError::NotFound(format!(
                    "family {} not found under office {}",
                    plan.family_id, plan.from_office
                )))
            }
        };
        if family.is_transferred {
            return Err(TransferError::Conflict(format!(
                "family {} already has an active transfer",
                plan.family_id
            )));
        }
        if state
            .history
            .iter()
            .any(|h| h.family_id == plan.family_id && h.status == TransferStatus::Pending)
        {
            return Err(TransferError::Conflict(format!(
                "a pending transfer already exists for family {}",
                plan.family_id
            )));
        }

        state.history.push(TransferHistory {
            transfer_id: plan.transfer_id.clone(),
            family_id: plan.family_id.clone(),
            from_office: plan.from_office.clone(),
            to_office: plan.to_office.clone(),
            reason: plan.reason.clone(),
            notes: plan.notes.clone(),
            requested_by: plan.requested_by.clone(),
            requested_at: plan.requested_at,
            status: TransferStatus::Pending,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            rejected_at: None,
        });
        for member_id in &plan.member_ids {
            state.requests.push(TransferRequest {
                id: Uuid::new_v4(),
                transfer_id: plan.transfer_id.clone(),
                member_id: *member_id,
                family_id: plan.family_id.clone(),
                from_office: plan.from_office.clone(),
                to_office: plan.to_office.clone(),
                from_division: plan.from_division.clone(),
                to_division: plan.to_division.clone(),
                reason: plan.reason.clone(),
                notes: plan.notes.clone(),
                requested_by: plan.requested_by.clone(),
                requested_at: plan.requested_at,
                status: TransferStatus::Pending,
            });
        }
        let family = state.families.get_mut(&plan.family_id).unwrap();
        family.is_transferred = true;
        family.has_pending_transfer = true;
        family.transfer_summary = Some(plan.summary.clone());
        family.updated_at = Utc::now();
        Ok(())
    }

    async fn record_decision(
        &self,
        transfer_id: &str,
        decision: &DecisionRecord,
    ) -> Result<TransferHistory, TransferError> {
        let mut state = self.state.lock().unwrap();

        let position = state
            .history
            .iter()
            .position(|h| h.transfer_id == transfer_id);
        let position = match position {
            Some(p) => p,
            None => {
                return Err(TransferError::NotFound(format!(
                    "transfer {transfer_id} not found"
                )))
            }
        };
        if state.history[position].status != TransferStatus::Pending {
            return Err(TransferError::Conflict(format!(
                "transfer {} was already processed (status: {})",
                transfer_id,
                state.history[position].status.as_str()
            )));
        }

        {
            let history = &mut state.history[position];
            history.status = decision.status;
            match decision.status {
                TransferStatus::Rejected => {
                    history.rejection_reason = decision.rejection_reason.clone();
                    history.rejected_at = Some(decision.decided_at);
                }
                _ => {
                    history.approved_by = Some(decision.decided_by.clone());
                    history.approved_at = Some(decision.decided_at);
                }
            }
        }
        let history = state.history[position].clone();

        for request in state
            .requests
            .iter_mut()
            .filter(|r| r.transfer_id == transfer_id)
        {
            request.status = decision.status;
        }

        if let Some(family) = state.families.get_mut(&history.family_id) {
            family.has_pending_transfer = false;
            let mut summary = family
                .transfer_summary
                .take()
                .unwrap_or_else(|| serde_json::json!({}));
            if let (Some(base), Some(patch)) =
                (summary.as_object_mut(), decision.summary_patch.as_object())
            {
                for (k, v) in patch {
                    base.insert(k.clone(), v.clone());
                }
            }
            family.transfer_summary = Some(summary);
            family.updated_at = Utc::now();
        }

        Ok(history)
    }
}

pub struct MemoryDirectory {
    offices: HashMap<String, Jurisdiction>,
}

impl MemoryDirectory {
    pub fn with_offices(ids: &[&str]) -> Self {
        let offices = ids
            .iter()
            .map(|id| {
                (
                    id.to_string(),
                    Jurisdiction {
                        id: id.to_string(),
                        name: format!("{id} Divisional Office"),
                        division: format!("{id} Division"),
                        district: "Galle".to_string(),
                        province: "Southern".to_string(),
                    },
                )
            })
            .collect();
        Self { offices }
    }
}

#[async_trait]
impl JurisdictionDirectory for MemoryDirectory {
    async fn lookup(&self, office_id: &str) -> Result<Option<Jurisdiction>, TransferError> {
        Ok(self.offices.get(office_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Jurisdiction>, TransferError> {
        let mut offices: Vec<Jurisdiction> = self.offices.values().cloned().collect();
        offices.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(offices)
    }
}

#[derive(Default)]
pub struct MemoryAudit {
    pub entries: Mutex<Vec<AuditLogEntry>>,
}

#[async_trait]
impl AuditRecorder for MemoryAudit {
    async fn append(&self, entry: AuditLogEntry) {
        self.entries.lock().unwrap().push(entry);
    }
}
