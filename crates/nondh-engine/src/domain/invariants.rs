//! Domain invariants for the Nondh Engine

use super::entities::{LandRecordSnapshot, Nondh, NondhDetail};
use super::value_objects::{Area, NondhStatus, AREA_TOLERANCE_SQM};
use crate::algorithms::ordering::compare_nondhs;
use crate::algorithms::validity::chain_validity;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// INVARIANT-1: One Detail Per Nondh
/// Every nondh has exactly one detail and every detail belongs to a nondh.
pub fn invariant_one_detail_per_nondh(snapshot: &LandRecordSnapshot) -> bool {
    let nondh_ids: HashSet<&str> = snapshot.nondhs.iter().map(|n| n.id.as_str()).collect();
    if nondh_ids.len() != snapshot.nondhs.len() {
        return false;
    }

    let mut per_nondh: HashMap<&str, usize> = HashMap::new();
    for detail in &snapshot.details {
        if !nondh_ids.contains(detail.nondh_id.as_str()) {
            return false;
        }
        *per_nondh.entry(detail.nondh_id.as_str()).or_insert(0) += 1;
    }

    nondh_ids
        .iter()
        .all(|id| per_nondh.get(id).copied() == Some(1))
}

/// INVARIANT-2: Area Conservation
/// For every transfer-kind detail and first-right transfer, new-owner areas
/// are finite and never exceed the old owner's area.
pub fn invariant_area_conservation(details: &[NondhDetail]) -> bool {
    let conserved = |allocated: Area, old_area: Area| {
        allocated.is_finite()
            && old_area.is_finite()
            && !allocated.exceeds(old_area, AREA_TOLERANCE_SQM)
    };

    details
        .iter()
        .filter(|d| d.amendment_kind.is_transfer() && d.selected_old_owner().is_some())
        .all(|d| conserved(d.allocated_area(), d.old_owner_area.unwrap_or_default()))
        && details
            .iter()
            .filter_map(|d| d.adjudication.as_ref())
            .flat_map(|a| a.transfers.iter())
            .all(|t| conserved(t.allocated_area(), t.old_owner_area))
}

/// INVARIANT-3: Reason Present
/// An invalid detail or affected entry always carries a non-empty reason.
pub fn invariant_reason_present(details: &[NondhDetail]) -> bool {
    let has_reason = |reason: &Option<String>| {
        reason
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty())
    };

    details.iter().all(|d| {
        (d.status != NondhStatus::Invalid || has_reason(&d.invalid_reason))
            && d.adjudication.as_ref().map_or(true, |a| {
                a.affected_entries
                    .iter()
                    .all(|e| e.status != NondhStatus::Invalid || has_reason(&e.invalid_reason))
            })
    })
}

/// INVARIANT-4: Strict Total Order
/// Adjacent nondhs in the order compare strictly less.
pub fn invariant_total_order(order: &[Nondh]) -> bool {
    order
        .windows(2)
        .all(|pair| compare_nondhs(&pair[0], &pair[1]) == Ordering::Less)
}

/// INVARIANT-5: Validity Parity
/// Every owner relation's cached flag equals the chain result for its nondh.
pub fn invariant_validity_parity(order: &[Nondh], details: &[NondhDetail]) -> bool {
    let validity = chain_validity(order, details);
    let positions: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(pos, n)| (n.id.as_str(), pos))
        .collect();

    details.iter().all(|d| {
        positions.get(d.nondh_id.as_str()).is_some_and(|&pos| {
            d.owner_relations
                .iter()
                .all(|o| o.is_valid == validity[pos])
        })
    })
}

/// Name of the first invariant the snapshot breaks, if any.
///
/// `order` must be the canonical order of `snapshot.nondhs`.
pub fn first_violation(snapshot: &LandRecordSnapshot, order: &[Nondh]) -> Option<&'static str> {
    if !invariant_one_detail_per_nondh(snapshot) {
        return Some("one detail per nondh");
    }
    if !invariant_total_order(order) {
        return Some("strict total order");
    }
    if !invariant_reason_present(&snapshot.details) {
        return Some("invalid status carries a reason");
    }
    if !invariant_area_conservation(&snapshot.details) {
        return Some("area conservation");
    }
    if !invariant_validity_parity(order, &snapshot.details) {
        return Some("validity parity");
    }
    None
}
