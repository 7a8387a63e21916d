//! Transfer slip assembly: the point-in-time snapshot handed between
//! offices. Pure read-side composition — both presentation paths (the
//! generated document and the client-side view) consume this one struct,
//! so its field set and ordering are part of the contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::directory::JurisdictionDirectory;
use crate::error::TransferError;
use crate::models::{Jurisdiction, LandRecord, Member, TransferStatus};
use crate::store::RegistryStore;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SlipMember {
    pub member_id: i64,
    pub full_name: String,
    pub nic: Option<String>,
    pub relationship: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SlipFamily {
    pub family_id: String,
    pub address: String,
    pub head_nic: String,
    pub head_name: String,
    pub member_count: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TransferSlip {
    pub transfer_id: String,
    pub status: TransferStatus,
    pub reason: String,
    pub notes: String,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub family: SlipFamily,
    pub origin: Jurisdiction,
    pub destination: Jurisdiction,
    pub members: Vec<SlipMember>,
    pub land_records: Vec<LandRecord>,
}

fn relationship_rank(relationship: &str) -> u8 {
    match relationship {
        "head" => 0,
        "spouse" => 1,
        _ => 2,
    }
}

/// Head of household first, spouse second, everyone else after, ties
/// broken by insertion order.
pub fn order_members(mut members: Vec<Member>) -> Vec<Member> {
    members.sort_by_key(|m| (relationship_rank(&m.relationship), m.id));
    members
}

pub async fn build_slip(
    store: &dyn RegistryStore,
    directory: &dyn JurisdictionDirectory,
    transfer_id: &str,
    family_id: &str,
) -> Result<TransferSlip, TransferError> {
    let history = store
        .transfer(transfer_id)
        .await?
        .filter(|h| h.family_id == family_id)
        .ok_or_else(|| {
            TransferError::NotFound(format!(
                "transfer {transfer_id} for family {family_id} not found"
            ))
        })?;

    let family = store
        .family(family_id)
        .await?
        .ok_or_else(|| TransferError::NotFound(format!("family {family_id} not found")))?;

    let members = order_members(store.members_of(family_id).await?);
    let land_records = store.land_records_of(family_id).await?;

    let origin = directory
        .lookup(&history.from_office)
        .await?
        .ok_or_else(|| {
            TransferError::NotFound(format!("jurisdiction {} not found", history.from_office))
        })?;
    let destination = directory.lookup(&history.to_office).await?.ok_or_else(|| {
        TransferError::NotFound(format!("jurisdiction {} not found", history.to_office))
    })?;

    let head_name = members
        .first()
        .map(|m| m.full_name.clone())
        .unwrap_or_default();
    let member_count = members.len() as i64;

    Ok(TransferSlip {
        transfer_id: history.transfer_id,
        status: history.status,
        reason: history.reason,
        notes: history.notes,
        requested_by: history.requested_by,
        requested_at: history.requested_at,
        approved_by: history.approved_by,
        approved_at: history.approved_at,
        rejection_reason: history.rejection_reason,
        rejected_at: history.rejected_at,
        family: SlipFamily {
            family_id: family.id,
            address: family.address,
            head_nic: family.head_nic,
            head_name,
            member_count,
        },
        origin,
        destination,
        members: members
            .into_iter()
            .map(|m| SlipMember {
                member_id: m.id,
                full_name: m.full_name,
                nic: m.nic,
                relationship: m.relationship,
            })
            .collect(),
        land_records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn member(id: i64, relationship: &str) -> Member {
        Member {
            id,
            family_id: "F1".to_string(),
            full_name: format!("member-{id}"),
            nic: None,
            relationship: relationship.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn head_first_spouse_second_rest_by_insertion_order() {
        let ordered = order_members(vec![
            member(1, "son"),
            member(2, "spouse"),
            member(3, "daughter"),
            member(4, "head"),
        ]);
        let ids: Vec<i64> = ordered.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![4, 2, 1, 3]);
    }

    #[test]
    fn equal_ranks_keep_insertion_order() {
        let ordered = order_members(vec![
            member(7, "daughter"),
            member(3, "son"),
            member(5, "mother"),
        ]);
        let ids: Vec<i64> = ordered.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 5, 7]);
    }
}
