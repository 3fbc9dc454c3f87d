//! Ownership Succession
//!
//! Old owner → new owner(s) splits for transfer-kind amendments and the
//! eligible-owner pool visible at a point in the chain.
//!
//! ## Area conservation
//!
//! New-owner areas never sum past the old owner's area. A request that
//! would is rejected with `AreaExceeded`; it is never clamped. Any
//! unallocated residue stays with the old owner and is not assigned to
//! anyone.
//!
//! ## Pool ledger
//!
//! Walking the canonical order, each valid ownership-bearing nondh adds its
//! owner lines. A transfer takes only the area it handed to new owners off
//! the old owner's current holding; any drawn but unallocated area stays
//! with the old owner. The old owner drops out once nothing is left. Later
//! observations of the same name replace earlier ones.

use super::ordering::position_of;
use crate::domain::entities::{
    Nondh, NondhDetail, OwnerRecord, OwnerRelation, RightTransfer, TransferSpec,
};
use crate::domain::errors::EngineError;
use crate::domain::value_objects::{
    Area, NondhStatus, RightClass, SurveyRef, TransferState, AREA_TOLERANCE_SQM,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// Running owner ledger keyed by owner name
#[derive(Default)]
struct OwnerLedger {
    entries: BTreeMap<String, (u64, OwnerRecord)>,
    seq: u64,
}

impl OwnerLedger {
    fn observe(&mut self, record: OwnerRecord) {
        self.seq += 1;
        self.entries
            .insert(record.owner_name.clone(), (self.seq, record));
    }

    /// Take `allocated` off an owner's current holding, dropping the owner
    /// when nothing remains. Owners absent from the ledger hold nothing to take.
    fn draw(&mut self, owner_name: &str, allocated: Area, nondh: &Nondh) {
        let Some((_, held)) = self.entries.get(owner_name) else {
            debug!(owner = owner_name, nondh = %nondh.id, "Transfer from owner outside the pool");
            return;
        };
        let remaining = held.area.saturating_sub(allocated);
        if remaining.sqm() <= AREA_TOLERANCE_SQM {
            self.entries.remove(owner_name);
            return;
        }
        let survey_ref = held.survey_ref.clone();
        self.observe(OwnerRecord {
            owner_name: owner_name.to_owned(),
            area: remaining,
            survey_ref,
            source_nondh_id: nondh.id.clone(),
        });
    }

    fn into_records(self) -> Vec<OwnerRecord> {
        let mut records: Vec<_> = self.entries.into_values().collect();
        records.sort_by_key(|(seq, _)| *seq);
        records.into_iter().map(|(_, r)| r).collect()
    }
}

/// Owners eligible as old owner for `before_nondh_id`.
///
/// Only nondhs strictly before the target in canonical order with status
/// valid contribute. With `survey_ref`, only nondhs touching that parcel and
/// owner lines applying to it are considered.
pub fn previous_owners(
    order: &[Nondh],
    details: &[NondhDetail],
    survey_ref: Option<&SurveyRef>,
    before_nondh_id: &str,
) -> Result<Vec<OwnerRecord>, EngineError> {
    let target = position_of(order, before_nondh_id)
        .ok_or_else(|| EngineError::not_found("Nondh", before_nondh_id))?;
    let by_nondh: HashMap<&str, &NondhDetail> =
        details.iter().map(|d| (d.nondh_id.as_str(), d)).collect();

    let mut ledger = OwnerLedger::default();

    for nondh in &order[..target] {
        let Some(detail) = by_nondh.get(nondh.id.as_str()) else {
            continue;
        };
        if detail.status != NondhStatus::Valid || !detail.amendment_kind.is_ownership_bearing() {
            continue;
        }
        if let Some(wanted) = survey_ref {
            if !nondh.touches(wanted) {
                continue;
            }
        }

        if detail.amendment_kind.is_transfer() {
            if let Some(old_owner) = detail.selected_old_owner() {
                ledger.draw(old_owner, detail.allocated_area(), nondh);
            }
        }

        if let Some(adjudication) = &detail.adjudication {
            if adjudication.right_class == RightClass::First {
                for transfer in &adjudication.transfers {
                    ledger.draw(&transfer.old_owner_name, transfer.allocated_area(), nondh);
                }
            }
        }

        for relation in &detail.owner_relations {
            if survey_ref.is_some_and(|wanted| !relation.applies_to(wanted, nondh)) {
                continue;
            }
            ledger.observe(OwnerRecord {
                owner_name: relation.owner_name.clone(),
                area: relation.area,
                survey_ref: relation.survey_ref.clone(),
                source_nondh_id: nondh.id.clone(),
            });
        }
    }

    let pool = ledger.into_records();
    debug!(
        before = before_nondh_id,
        pool_size = pool.len(),
        "Built eligible owner pool"
    );
    Ok(pool)
}

fn ensure_transfer_kind(detail: &NondhDetail) -> Result<(), EngineError> {
    if detail.amendment_kind.is_transfer() {
        Ok(())
    } else {
        Err(EngineError::NotTransferKind {
            detail_id: detail.id.clone(),
            kind: detail.amendment_kind,
        })
    }
}

/// Reject non-finite and negative areas.
fn check_area(owner_id: &str, area: Area) -> Result<(), EngineError> {
    if !area.is_finite() {
        warn!(owner_id, "Rejected non-finite area");
        return Err(EngineError::InvalidArea {
            owner_id: owner_id.to_owned(),
        });
    }
    if area.sqm() < 0.0 {
        return Err(EngineError::NegativeArea {
            owner_id: owner_id.to_owned(),
            requested: area.sqm(),
        });
    }
    Ok(())
}

/// Check that `requested` more can be drawn from a pooled owner who has
/// already given `already_drawn` at this nondh.
pub fn check_pool_draw(
    pool: &[OwnerRecord],
    owner_name: &str,
    already_drawn: Area,
    requested: Area,
) -> Result<(), EngineError> {
    check_area(owner_name, requested)?;
    let pooled = pool
        .iter()
        .find(|r| r.owner_name == owner_name)
        .ok_or_else(|| EngineError::OwnerNotInPool {
            owner_name: owner_name.to_owned(),
        })?;
    let available = pooled.area.saturating_sub(already_drawn);
    if requested.exceeds(available, AREA_TOLERANCE_SQM) {
        warn!(
            owner = owner_name,
            requested = requested.sqm(),
            available = available.sqm(),
            "Rejected draw on pooled owner"
        );
        return Err(EngineError::AreaExceeded {
            owner_id: owner_name.to_owned(),
            requested: requested.sqm(),
            max_allowed: available.sqm(),
        });
    }
    Ok(())
}

fn require_old_owner<'a>(
    detail_id: &str,
    name: Option<&'a str>,
) -> Result<&'a str, EngineError> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| EngineError::MissingOldOwner {
            detail_id: detail_id.to_owned(),
        })
}

/// Split `old_area` across the relations named in `spec`, in spec order.
fn distribute(
    relations: &[OwnerRelation],
    old_area: Area,
    spec: &TransferSpec,
) -> Result<Vec<OwnerRelation>, EngineError> {
    let mut seen = HashSet::new();
    let mut selected = Vec::with_capacity(spec.new_owner_ids.len());
    for owner_id in &spec.new_owner_ids {
        if !seen.insert(owner_id.as_str()) {
            continue;
        }
        let relation = relations
            .iter()
            .find(|r| &r.id == owner_id)
            .ok_or_else(|| EngineError::not_found("OwnerRelation", owner_id.as_str()))?;
        selected.push(relation.clone());
    }

    if spec.equal_distribution {
        if !selected.is_empty() {
            let share = Area::from_sqm(old_area.sqm() / selected.len() as f64);
            for relation in &mut selected {
                relation.area = share;
            }
        }
        return Ok(selected);
    }

    let mut allocated = Area::ZERO;
    for relation in &mut selected {
        let requested = spec
            .per_owner_area
            .get(&relation.id)
            .copied()
            .unwrap_or(relation.area);
        check_area(&relation.id, requested)?;
        let max_allowed = old_area.saturating_sub(allocated);
        if requested.exceeds(max_allowed, AREA_TOLERANCE_SQM) {
            warn!(
                owner_id = %relation.id,
                requested = requested.sqm(),
                max_allowed = max_allowed.sqm(),
                "Rejected new-owner area"
            );
            return Err(EngineError::AreaExceeded {
                owner_id: relation.id.clone(),
                requested: requested.sqm(),
                max_allowed: max_allowed.sqm(),
            });
        }
        relation.area = requested;
        allocated = allocated + requested;
    }

    Ok(selected)
}

/// Apply an old → new owner split to a transfer-kind detail.
///
/// The detail's owner relations become exactly `spec.new_owner_ids`, each
/// of which must already be a relation on the detail. On error the caller's
/// detail is untouched.
pub fn apply_transfer(
    detail: &NondhDetail,
    spec: &TransferSpec,
) -> Result<NondhDetail, EngineError> {
    ensure_transfer_kind(detail)?;
    let old_owner = require_old_owner(&detail.id, spec.old_owner_name.as_deref())?;
    check_area(old_owner, spec.old_owner_area)?;

    let relations = distribute(&detail.owner_relations, spec.old_owner_area, spec)?;

    let mut updated = detail.clone();
    updated.old_owner_name = Some(old_owner.to_owned());
    updated.old_owner_area = Some(spec.old_owner_area);
    updated.equal_distribution = spec.equal_distribution;
    updated.owner_relations = relations;

    debug!(
        detail_id = %detail.id,
        new_owners = updated.owner_relations.len(),
        allocated = updated.allocated_area().sqm(),
        "Applied transfer"
    );
    Ok(updated)
}

/// Pick the old owner from the eligible pool and re-check the current split.
pub fn select_old_owner(
    detail: &NondhDetail,
    owner: &OwnerRecord,
) -> Result<NondhDetail, EngineError> {
    let spec = TransferSpec {
        old_owner_name: Some(owner.owner_name.clone()),
        old_owner_area: owner.area,
        ..TransferSpec::from_detail(detail)
    };
    apply_transfer(detail, &spec)
}

/// Append a new owner. Equal shares are recomputed; otherwise the relation's
/// area must fit in what the old owner has left.
pub fn add_new_owner(
    detail: &NondhDetail,
    relation: OwnerRelation,
) -> Result<NondhDetail, EngineError> {
    ensure_transfer_kind(detail)?;
    require_old_owner(&detail.id, detail.old_owner_name.as_deref())?;

    let mut staged = detail.clone();
    staged.owner_relations.retain(|r| r.id != relation.id);
    staged.owner_relations.push(relation);

    let spec = TransferSpec::from_detail(&staged);
    apply_transfer(&staged, &spec)
}

/// Remove a new owner. Equal shares are recomputed for the rest.
pub fn remove_new_owner(detail: &NondhDetail, owner_id: &str) -> Result<NondhDetail, EngineError> {
    ensure_transfer_kind(detail)?;
    if detail.relation(owner_id).is_none() {
        return Err(EngineError::not_found("OwnerRelation", owner_id));
    }

    let mut staged = detail.clone();
    staged.owner_relations.retain(|r| r.id != owner_id);

    if detail.selected_old_owner().is_none() {
        return Ok(staged);
    }
    let spec = TransferSpec::from_detail(&staged);
    apply_transfer(&staged, &spec)
}

/// Set one new owner's area by hand. Switches off equal distribution.
pub fn set_new_owner_area(
    detail: &NondhDetail,
    owner_id: &str,
    area: Area,
) -> Result<NondhDetail, EngineError> {
    ensure_transfer_kind(detail)?;
    require_old_owner(&detail.id, detail.old_owner_name.as_deref())?;
    if detail.relation(owner_id).is_none() {
        return Err(EngineError::not_found("OwnerRelation", owner_id));
    }
    check_area(owner_id, area)?;

    // cap against every other owner, independent of position
    let others: Area = detail
        .owner_relations
        .iter()
        .filter(|r| r.id != owner_id)
        .map(|r| r.area)
        .sum();
    let max_allowed = detail.old_owner_area.unwrap_or_default().saturating_sub(others);
    if area.exceeds(max_allowed, AREA_TOLERANCE_SQM) {
        warn!(
            owner_id,
            requested = area.sqm(),
            max_allowed = max_allowed.sqm(),
            "Rejected new-owner area"
        );
        return Err(EngineError::AreaExceeded {
            owner_id: owner_id.to_owned(),
            requested: area.sqm(),
            max_allowed: max_allowed.sqm(),
        });
    }

    let spec = TransferSpec {
        equal_distribution: false,
        ..TransferSpec::from_detail(detail)
    }
    .with_area(owner_id, area);
    apply_transfer(detail, &spec)
}

/// Toggle equal distribution. Enabling re-splits the old owner's area.
pub fn set_equal_distribution(
    detail: &NondhDetail,
    enabled: bool,
) -> Result<NondhDetail, EngineError> {
    ensure_transfer_kind(detail)?;
    if !enabled {
        let mut updated = detail.clone();
        updated.equal_distribution = false;
        return Ok(updated);
    }

    let spec = TransferSpec {
        equal_distribution: true,
        ..TransferSpec::from_detail(detail)
    };
    apply_transfer(detail, &spec)
}

/// Where a transfer-kind detail sits in its owner-relation lifecycle.
///
/// `Balanced` is informational; `Partial` is a legitimate resting state.
pub fn transfer_state(detail: &NondhDetail) -> TransferState {
    if detail.selected_old_owner().is_none() {
        return TransferState::Unpopulated;
    }
    let allocated = detail.allocated_area();
    if detail.owner_relations.is_empty() || allocated.sqm() <= AREA_TOLERANCE_SQM {
        return TransferState::OldOwnerSelected;
    }
    if allocated.approx_eq(detail.old_owner_area.unwrap_or_default(), AREA_TOLERANCE_SQM) {
        TransferState::Balanced
    } else {
        TransferState::Partial
    }
}

fn ensure_right_class(detail: &NondhDetail, expected: RightClass) -> Result<(), EngineError> {
    match &detail.adjudication {
        Some(adjudication) if adjudication.right_class == expected => Ok(()),
        _ => Err(EngineError::WrongRightClass {
            detail_id: detail.id.clone(),
            expected,
        }),
    }
}

/// Record first-right transfers on an adjudication detail.
///
/// Every old owner must come from `pool`, and the transfers drawing on one
/// owner may not together exceed that owner's pooled area. Each transfer's
/// new owners follow the same conservation rule as `apply_transfer`.
pub fn apply_first_right(
    detail: &NondhDetail,
    transfers: Vec<RightTransfer>,
    pool: &[OwnerRecord],
) -> Result<NondhDetail, EngineError> {
    ensure_right_class(detail, RightClass::First)?;

    let mut drawn: HashMap<String, Area> = HashMap::new();
    let mut validated = Vec::with_capacity(transfers.len());

    for mut transfer in transfers {
        let old_owner =
            require_old_owner(&detail.id, Some(transfer.old_owner_name.as_str()))?.to_owned();
        let already = drawn.get(&old_owner).copied().unwrap_or_default();
        check_pool_draw(pool, &old_owner, already, transfer.old_owner_area)?;
        drawn.insert(old_owner.clone(), already + transfer.old_owner_area);

        let spec = TransferSpec {
            old_owner_name: Some(old_owner.clone()),
            old_owner_area: transfer.old_owner_area,
            new_owner_ids: transfer.new_owners.iter().map(|o| o.id.clone()).collect(),
            equal_distribution: transfer.equal_distribution,
            per_owner_area: transfer
                .new_owners
                .iter()
                .map(|o| (o.id.clone(), o.area))
                .collect(),
        };
        transfer.new_owners = distribute(&transfer.new_owners, transfer.old_owner_area, &spec)?;
        transfer.old_owner_name = old_owner;
        validated.push(transfer);
    }

    let mut updated = detail.clone();
    updated.owner_relations = validated
        .iter()
        .flat_map(|t| t.new_owners.iter().cloned())
        .collect();
    if let Some(adjudication) = updated.adjudication.as_mut() {
        adjudication.transfers = validated;
    }

    debug!(
        detail_id = %detail.id,
        transfers = updated.adjudication.as_ref().map_or(0, |a| a.transfers.len()),
        "Applied first-right transfers"
    );
    Ok(updated)
}

/// Copy every pooled owner onto a second-right adjudication as a new,
/// independent owner line. Prior holders are not consumed.
pub fn import_second_right(
    detail: &NondhDetail,
    pool: &[OwnerRecord],
) -> Result<NondhDetail, EngineError> {
    ensure_right_class(detail, RightClass::Second)?;

    let mut updated = detail.clone();
    updated.owner_relations = pool
        .iter()
        .enumerate()
        .map(|(idx, record)| OwnerRelation {
            id: format!("{}-r{}", detail.id, idx + 1),
            owner_name: record.owner_name.clone(),
            area: record.area,
            is_valid: true,
            survey_ref: record.survey_ref.clone(),
        })
        .collect();

    debug!(detail_id = %detail.id, imported = pool.len(), "Imported second-right owners");
    Ok(updated)
}
