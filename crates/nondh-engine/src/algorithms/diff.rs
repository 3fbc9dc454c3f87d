//! Field-level detail diffing
//!
//! Tells the persistence side which details changed and how, so only those
//! are written back.

use crate::domain::entities::{NondhDetail, OwnerRelation};
use crate::domain::value_objects::DetailId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetailField {
    AmendmentKind,
    Status,
    InvalidReason,
    Date,
    OldOwner,
    EqualDistribution,
    /// Owner lines added, removed, renamed, re-scoped or re-sized
    OwnerRelations,
    /// Only cached `is_valid` flags moved
    OwnerValidity,
    Adjudication,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DetailChange {
    Added { detail_id: DetailId },
    Removed { detail_id: DetailId },
    Modified {
        detail_id: DetailId,
        fields: Vec<DetailField>,
    },
}

fn same_relation_content(a: &OwnerRelation, b: &OwnerRelation) -> bool {
    a.id == b.id && a.owner_name == b.owner_name && a.area == b.area && a.survey_ref == b.survey_ref
}

fn changed_fields(before: &NondhDetail, after: &NondhDetail) -> Vec<DetailField> {
    let mut fields = Vec::new();

    if before.amendment_kind != after.amendment_kind {
        fields.push(DetailField::AmendmentKind);
    }
    if before.status != after.status {
        fields.push(DetailField::Status);
    }
    if before.invalid_reason != after.invalid_reason {
        fields.push(DetailField::InvalidReason);
    }
    if before.date != after.date {
        fields.push(DetailField::Date);
    }
    if before.old_owner_name != after.old_owner_name || before.old_owner_area != after.old_owner_area {
        fields.push(DetailField::OldOwner);
    }
    if before.equal_distribution != after.equal_distribution {
        fields.push(DetailField::EqualDistribution);
    }

    let same_shape = before.owner_relations.len() == after.owner_relations.len()
        && before
            .owner_relations
            .iter()
            .zip(&after.owner_relations)
            .all(|(a, b)| same_relation_content(a, b));
    if !same_shape {
        fields.push(DetailField::OwnerRelations);
    } else if before
        .owner_relations
        .iter()
        .zip(&after.owner_relations)
        .any(|(a, b)| a.is_valid != b.is_valid)
    {
        fields.push(DetailField::OwnerValidity);
    }

    if before.adjudication != after.adjudication {
        fields.push(DetailField::Adjudication);
    }

    fields
}

/// Per-detail changes between two snapshots, matched by detail id.
///
/// Modified and added details follow `after` order; removals come last.
pub fn diff_details(before: &[NondhDetail], after: &[NondhDetail]) -> Vec<DetailChange> {
    let previous: HashMap<&str, &NondhDetail> =
        before.iter().map(|d| (d.id.as_str(), d)).collect();
    let mut changes = Vec::new();

    for detail in after {
        match previous.get(detail.id.as_str()) {
            None => changes.push(DetailChange::Added {
                detail_id: detail.id.clone(),
            }),
            Some(old) => {
                let fields = changed_fields(old, detail);
                if !fields.is_empty() {
                    changes.push(DetailChange::Modified {
                        detail_id: detail.id.clone(),
                        fields,
                    });
                }
            }
        }
    }

    let current: HashSet<&str> = after.iter().map(|d| d.id.as_str()).collect();
    for detail in before {
        if !current.contains(detail.id.as_str()) {
            changes.push(DetailChange::Removed {
                detail_id: detail.id.clone(),
            });
        }
    }

    changes
}
