//! Affected Nondh Propagation
//!
//! An adjudication (Hukam) lists other nondhs by display number. Changing an
//! entry's status copies the status and reason onto the referenced nondh's
//! own detail, then re-resolves the chain before the referenced nondh.
//!
//! Propagation is one-directional: removing an entry later does not roll
//! anything back on the referenced detail.

use super::ordering::position_of_number;
use super::validity::{in_canonical_order, resolve_from, validity_changes};
use crate::domain::entities::{Nondh, NondhDetail};
use crate::domain::errors::EngineError;
use crate::domain::value_objects::{NondhId, NondhStatus};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Outcome of an affected-entry status change
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Propagation {
    pub details: Vec<NondhDetail>,
    /// In canonical order
    pub touched_nondh_ids: Vec<NondhId>,
    pub referenced_nondh_id: NondhId,
}

/// Set an affected entry's status and sync it onto the referenced nondh.
pub fn propagate_affected_status(
    order: &[Nondh],
    details: &[NondhDetail],
    adjudication_detail_id: &str,
    affected_entry_id: &str,
    new_status: NondhStatus,
    reason: Option<&str>,
) -> Result<Propagation, EngineError> {
    let adj_idx = details
        .iter()
        .position(|d| d.id == adjudication_detail_id)
        .ok_or_else(|| EngineError::not_found("NondhDetail", adjudication_detail_id))?;
    let adjudication = details[adj_idx]
        .adjudication
        .as_ref()
        .ok_or_else(|| EngineError::not_found("Adjudication", adjudication_detail_id))?;
    let entry_idx = adjudication
        .affected_entries
        .iter()
        .position(|e| e.id == affected_entry_id)
        .ok_or_else(|| EngineError::not_found("AffectedEntry", affected_entry_id))?;

    let reason = reason.map(str::trim).filter(|r| !r.is_empty());
    if new_status == NondhStatus::Invalid && reason.is_none() {
        warn!(
            detail_id = adjudication_detail_id,
            entry_id = affected_entry_id,
            "Rejected invalid affected entry without reason"
        );
        return Err(EngineError::MissingReason {
            detail_id: adjudication_detail_id.to_owned(),
        });
    }

    let referenced_number = &adjudication.affected_entries[entry_idx].referenced_nondh_number;
    let ref_pos = position_of_number(order, referenced_number).ok_or_else(|| {
        EngineError::UnknownReference {
            referenced_number: referenced_number.clone(),
        }
    })?;
    let referenced_nondh_id = order[ref_pos].id.clone();
    let ref_idx = details
        .iter()
        .position(|d| d.nondh_id == referenced_nondh_id)
        .ok_or_else(|| EngineError::not_found("NondhDetail", referenced_nondh_id.as_str()))?;

    let synced_reason = match new_status {
        NondhStatus::Invalid => reason.map(str::to_owned),
        _ => None,
    };

    let mut updated = details.to_vec();
    if let Some(adjudication) = updated[adj_idx].adjudication.as_mut() {
        let entry = &mut adjudication.affected_entries[entry_idx];
        entry.status = new_status;
        entry.invalid_reason = synced_reason.clone();
    }
    let referenced = &mut updated[ref_idx];
    referenced.status = new_status;
    referenced.invalid_reason = synced_reason;

    let resolved = resolve_from(order, &updated, ref_pos);
    let mut touched = validity_changes(details, &resolved);
    touched.insert(details[adj_idx].nondh_id.clone());
    touched.insert(referenced_nondh_id.clone());

    info!(
        detail_id = adjudication_detail_id,
        referenced = %referenced_nondh_id,
        status = ?new_status,
        touched = touched.len(),
        "Propagated affected entry status"
    );

    Ok(Propagation {
        touched_nondh_ids: in_canonical_order(order, &touched),
        details: resolved,
        referenced_nondh_id,
    })
}

/// Drop an affected entry. The referenced nondh keeps whatever was propagated.
pub fn remove_affected_entry(
    detail: &NondhDetail,
    affected_entry_id: &str,
) -> Result<NondhDetail, EngineError> {
    let mut updated = detail.clone();
    let adjudication = updated
        .adjudication
        .as_mut()
        .ok_or_else(|| EngineError::not_found("Adjudication", detail.id.as_str()))?;
    let before = adjudication.affected_entries.len();
    adjudication
        .affected_entries
        .retain(|e| e.id != affected_entry_id);
    if adjudication.affected_entries.len() == before {
        return Err(EngineError::not_found("AffectedEntry", affected_entry_id));
    }
    Ok(updated)
}
