//! Validity Chain Resolution
//!
//! A nondh's owner data is legally valid iff the number of invalid (Radd)
//! nondhs after it in canonical order is even. Each later invalidation
//! flips everything before it; two cancel out.
//!
//! The derived value is written to every owner relation's `is_valid`.
//! A status change at canonical index `k` only affects indices `0..k`.

use super::ordering::position_of;
use crate::domain::entities::{Nondh, NondhDetail};
use crate::domain::errors::EngineError;
use crate::domain::value_objects::{NondhId, NondhStatus};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Details after a status edit, plus the nondhs whose data changed
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub details: Vec<NondhDetail>,
    /// In canonical order
    pub touched_nondh_ids: Vec<NondhId>,
}

/// Derived validity per canonical position.
///
/// Nondhs without a detail count as not invalid.
///
/// # Panics
///
/// Panics if a detail's `nondh_id` does not appear in `order`.
pub fn chain_validity(order: &[Nondh], details: &[NondhDetail]) -> Vec<bool> {
    let positions = index_positions(order);
    let mut invalid_at = vec![false; order.len()];

    for detail in details {
        let Some(&pos) = positions.get(detail.nondh_id.as_str()) else {
            panic!(
                "malformed snapshot: detail {} references nondh {} absent from canonical order",
                detail.id, detail.nondh_id
            );
        };
        invalid_at[pos] = detail.is_invalid();
    }

    let mut validity = vec![true; order.len()];
    let mut invalid_after = 0usize;
    for pos in (0..order.len()).rev() {
        validity[pos] = invalid_after % 2 == 0;
        if invalid_at[pos] {
            invalid_after += 1;
        }
    }

    validity
}

/// Recompute owner-relation validity for every detail.
///
/// # Panics
///
/// Panics if a detail's `nondh_id` does not appear in `order`.
pub fn resolve(order: &[Nondh], details: &[NondhDetail]) -> Vec<NondhDetail> {
    resolve_prefix(order, details, order.len())
}

/// Recompute only canonical indices `0..changed_index`.
///
/// Identical to [`resolve`] after a single status change at `changed_index`
/// on an otherwise resolved snapshot.
///
/// # Panics
///
/// Panics if `changed_index > order.len()` or a detail's `nondh_id` does
/// not appear in `order`.
pub fn resolve_from(
    order: &[Nondh],
    details: &[NondhDetail],
    changed_index: usize,
) -> Vec<NondhDetail> {
    assert!(
        changed_index <= order.len(),
        "changed index {} out of range for {} nondhs",
        changed_index,
        order.len()
    );
    resolve_prefix(order, details, changed_index)
}

fn resolve_prefix(order: &[Nondh], details: &[NondhDetail], limit: usize) -> Vec<NondhDetail> {
    let validity = chain_validity(order, details);
    let positions = index_positions(order);
    let mut rewritten = 0usize;

    let resolved = details
        .iter()
        .map(|detail| {
            let mut detail = detail.clone();
            // chain_validity already rejected unknown nondh ids
            let pos = positions[detail.nondh_id.as_str()];
            if pos < limit {
                let derived = validity[pos];
                for relation in &mut detail.owner_relations {
                    if relation.is_valid != derived {
                        relation.is_valid = derived;
                        rewritten += 1;
                    }
                }
            }
            detail
        })
        .collect();

    debug!(
        nondh_count = order.len(),
        limit,
        rewritten,
        "Resolved validity chain"
    );
    resolved
}

/// Set a nondh's status and ripple the chain to everything before it.
pub fn apply_status_change(
    order: &[Nondh],
    details: &[NondhDetail],
    nondh_id: &str,
    status: NondhStatus,
    reason: Option<&str>,
) -> Result<StatusChange, EngineError> {
    let pos = position_of(order, nondh_id)
        .ok_or_else(|| EngineError::not_found("Nondh", nondh_id))?;
    let detail_idx = details
        .iter()
        .position(|d| d.nondh_id == nondh_id)
        .ok_or_else(|| EngineError::not_found("NondhDetail", nondh_id))?;

    let reason = reason.map(str::trim).filter(|r| !r.is_empty());
    if status == NondhStatus::Invalid && reason.is_none() {
        warn!(detail_id = %details[detail_idx].id, "Rejected invalid status without reason");
        return Err(EngineError::MissingReason {
            detail_id: details[detail_idx].id.clone(),
        });
    }

    let mut updated = details.to_vec();
    let target = &mut updated[detail_idx];
    target.status = status;
    target.invalid_reason = match status {
        NondhStatus::Invalid => reason.map(str::to_owned),
        _ => None,
    };

    let resolved = resolve_from(order, &updated, pos);
    let mut touched = validity_changes(details, &resolved);
    touched.insert(nondh_id.to_owned());

    Ok(StatusChange {
        touched_nondh_ids: in_canonical_order(order, &touched),
        details: resolved,
    })
}

/// Nondh ids whose owner-relation validity differs between two detail lists.
pub(crate) fn validity_changes(before: &[NondhDetail], after: &[NondhDetail]) -> HashSet<NondhId> {
    let previous: HashMap<&str, &NondhDetail> =
        before.iter().map(|d| (d.id.as_str(), d)).collect();

    after
        .iter()
        .filter(|detail| {
            previous.get(detail.id.as_str()).map_or(true, |old| {
                old.owner_relations
                    .iter()
                    .map(|o| o.is_valid)
                    .ne(detail.owner_relations.iter().map(|o| o.is_valid))
            })
        })
        .map(|detail| detail.nondh_id.clone())
        .collect()
}

pub(crate) fn in_canonical_order(order: &[Nondh], ids: &HashSet<NondhId>) -> Vec<NondhId> {
    order
        .iter()
        .filter(|n| ids.contains(&n.id))
        .map(|n| n.id.clone())
        .collect()
}

fn index_positions(order: &[Nondh]) -> HashMap<&str, usize> {
    order
        .iter()
        .enumerate()
        .map(|(pos, n)| (n.id.as_str(), pos))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::ordering::canonical_order;
    use crate::domain::entities::OwnerRelation;
    use crate::domain::value_objects::{AmendmentKind, Area, SurveyRef};

    fn make_nondh(n: u32) -> Nondh {
        Nondh::new(format!("n{n}"), n.to_string()).with_ref(SurveyRef::survey("1"))
    }

    fn make_detail(n: u32, status: NondhStatus) -> NondhDetail {
        let reason = (status == NondhStatus::Invalid).then_some("radd");
        NondhDetail::new(format!("d{n}"), format!("n{n}"), AmendmentKind::Possessor)
            .with_status(status, reason)
            .with_owner(OwnerRelation::new(format!("o{n}"), format!("Owner {n}"), Area::from_sqm(100.0)))
    }

    fn relation_validity(details: &[NondhDetail]) -> Vec<bool> {
        details.iter().map(|d| d.owner_relations[0].is_valid).collect()
    }

    #[test]
    fn test_single_invalid_flips_predecessors() {
        let order = canonical_order(&[make_nondh(1), make_nondh(2), make_nondh(3)]);
        let details = vec![
            make_detail(1, NondhStatus::Valid),
            make_detail(2, NondhStatus::Invalid),
            make_detail(3, NondhStatus::Valid),
        ];

        let resolved = resolve(&order, &details);

        assert_eq!(relation_validity(&resolved), vec![false, true, true]);
    }

    #[test]
    fn test_two_invalids_cancel() {
        let order = canonical_order(&[make_nondh(1), make_nondh(2), make_nondh(3)]);
        let details = vec![
            make_detail(1, NondhStatus::Valid),
            make_detail(2, NondhStatus::Invalid),
            make_detail(3, NondhStatus::Invalid),
        ];

        let resolved = resolve(&order, &details);

        assert_eq!(relation_validity(&resolved), vec![true, false, true]);
    }

    #[test]
    fn test_nullified_does_not_flip() {
        let order = canonical_order(&[make_nondh(1), make_nondh(2)]);
        let details = vec![
            make_detail(1, NondhStatus::Valid),
            make_detail(2, NondhStatus::Nullified),
        ];

        assert_eq!(relation_validity(&resolve(&order, &details)), vec![true, true]);
    }

    #[test]
    fn test_resolve_uses_canonical_not_input_order() {
        let order = canonical_order(&[make_nondh(2), make_nondh(1)]);
        let details = vec![
            make_detail(2, NondhStatus::Invalid),
            make_detail(1, NondhStatus::Valid),
        ];

        let resolved = resolve(&order, &details);

        // Output keeps input order: d2 then d1
        assert_eq!(relation_validity(&resolved), vec![true, false]);
    }

    #[test]
    fn test_resolve_from_leaves_suffix_untouched() {
        let order = canonical_order(&[make_nondh(1), make_nondh(2), make_nondh(3)]);
        let mut details = vec![
            make_detail(1, NondhStatus::Valid),
            make_detail(2, NondhStatus::Valid),
            make_detail(3, NondhStatus::Invalid),
        ];
        details[1].owner_relations[0].is_valid = true;

        let partial = resolve_from(&order, &details, 1);

        assert_eq!(relation_validity(&partial), vec![false, true, true]);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let order = canonical_order(&[make_nondh(1), make_nondh(2), make_nondh(3)]);
        let details = vec![
            make_detail(1, NondhStatus::Invalid),
            make_detail(2, NondhStatus::Valid),
            make_detail(3, NondhStatus::Invalid),
        ];

        let once = resolve(&order, &details);
        let twice = resolve(&order, &once);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_detail_counts_as_not_invalid() {
        let order = canonical_order(&[make_nondh(1), make_nondh(2)]);
        let details = vec![make_detail(1, NondhStatus::Valid)];

        assert_eq!(chain_validity(&order, &details), vec![true, true]);
    }

    #[test]
    #[should_panic(expected = "malformed snapshot")]
    fn test_orphan_detail_is_fatal() {
        let order = canonical_order(&[make_nondh(1)]);
        let details = vec![make_detail(7, NondhStatus::Valid)];

        let _ = resolve(&order, &details);
    }

    #[test]
    fn test_status_change_requires_reason() {
        let order = canonical_order(&[make_nondh(1), make_nondh(2)]);
        let details = vec![
            make_detail(1, NondhStatus::Valid),
            make_detail(2, NondhStatus::Valid),
        ];

        let result = apply_status_change(&order, &details, "n2", NondhStatus::Invalid, Some("  "));

        assert_eq!(
            result,
            Err(EngineError::MissingReason {
                detail_id: "d2".into()
            })
        );
    }

    #[test]
    fn test_status_change_ripples_backwards() {
        let order = canonical_order(&[make_nondh(1), make_nondh(2), make_nondh(3)]);
        let details = resolve(
            &order,
            &[
                make_detail(1, NondhStatus::Valid),
                make_detail(2, NondhStatus::Valid),
                make_detail(3, NondhStatus::Valid),
            ],
        );

        let change =
            apply_status_change(&order, &details, "n3", NondhStatus::Invalid, Some("fraud"))
                .unwrap();

        assert_eq!(relation_validity(&change.details), vec![false, false, true]);
        assert_eq!(change.details[2].invalid_reason.as_deref(), Some("fraud"));
        assert_eq!(change.touched_nondh_ids, vec!["n1", "n2", "n3"]);
    }

    #[test]
    fn test_status_change_back_to_valid_clears_reason() {
        let order = canonical_order(&[make_nondh(1), make_nondh(2)]);
        let details = resolve(
            &order,
            &[
                make_detail(1, NondhStatus::Valid),
                make_detail(2, NondhStatus::Invalid),
            ],
        );

        let change =
            apply_status_change(&order, &details, "n2", NondhStatus::Valid, None).unwrap();

        assert!(change.details[1].invalid_reason.is_none());
        assert_eq!(relation_validity(&change.details), vec![true, true]);
    }

    #[test]
    fn test_status_change_unknown_nondh() {
        let order = canonical_order(&[make_nondh(1)]);
        let details = vec![make_detail(1, NondhStatus::Valid)];

        let err = apply_status_change(&order, &details, "n9", NondhStatus::Valid, None)
            .unwrap_err();

        assert!(err.is_fatal());
    }
}
