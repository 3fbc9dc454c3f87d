//! Core entities for the Nondh Engine

use super::value_objects::{
    AmendmentKind, Area, DetailId, EntryId, LandRecordId, NondhId, NondhStatus, OwnerId,
    RightClass, SurveyRef, SurveyRefKind,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An amendment slot registered against a land record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Nondh {
    /// Opaque identifier, immutable once persisted
    pub id: NondhId,
    /// User-facing legal number, may carry `-` or `/` sub-numbers
    pub number: String,
    /// Parcels this amendment touches
    pub affected_survey_refs: Vec<SurveyRef>,
    /// Handle to the scanned document, not interpreted here
    pub document_ref: Option<String>,
}

impl Nondh {
    pub fn new(id: impl Into<NondhId>, number: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            affected_survey_refs: Vec::new(),
            document_ref: None,
        }
    }

    pub fn with_ref(mut self, survey_ref: SurveyRef) -> Self {
        if !self.affected_survey_refs.contains(&survey_ref) {
            self.affected_survey_refs.push(survey_ref);
        }
        self
    }

    pub fn with_document(mut self, document_ref: impl Into<String>) -> Self {
        self.document_ref = Some(document_ref.into());
        self
    }

    /// Highest-priority reference kind present, `None` when no refs exist.
    pub fn primary_kind(&self) -> Option<SurveyRefKind> {
        self.affected_survey_refs.iter().map(|r| r.kind).min()
    }

    pub fn touches(&self, survey_ref: &SurveyRef) -> bool {
        self.affected_survey_refs.contains(survey_ref)
    }
}

/// One owner line on a detail
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OwnerRelation {
    pub id: OwnerId,
    pub owner_name: String,
    pub area: Area,
    /// Cached chain result; overwritten by the validity resolver
    pub is_valid: bool,
    /// Parcel this line applies to; `None` means every parcel of the nondh
    pub survey_ref: Option<SurveyRef>,
}

impl OwnerRelation {
    pub fn new(id: impl Into<OwnerId>, owner_name: impl Into<String>, area: Area) -> Self {
        Self {
            id: id.into(),
            owner_name: owner_name.into(),
            area,
            is_valid: true,
            survey_ref: None,
        }
    }

    pub fn with_survey_ref(mut self, survey_ref: SurveyRef) -> Self {
        self.survey_ref = Some(survey_ref);
        self
    }

    /// Whether this line, recorded on `nondh`, applies to `survey_ref`.
    pub fn applies_to(&self, survey_ref: &SurveyRef, nondh: &Nondh) -> bool {
        match &self.survey_ref {
            Some(own) => own == survey_ref,
            None => nondh.touches(survey_ref),
        }
    }
}

/// Reference from an adjudication to another nondh, by display number
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AffectedEntry {
    pub id: EntryId,
    pub referenced_nondh_number: String,
    pub status: NondhStatus,
    pub invalid_reason: Option<String>,
}

impl AffectedEntry {
    pub fn new(id: impl Into<EntryId>, referenced_nondh_number: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            referenced_nondh_number: referenced_nondh_number.into(),
            status: NondhStatus::Valid,
            invalid_reason: None,
        }
    }
}

/// One first-right transfer inside an adjudication
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RightTransfer {
    pub id: String,
    pub old_owner_name: String,
    pub old_owner_area: Area,
    pub equal_distribution: bool,
    pub new_owners: Vec<OwnerRelation>,
}

impl RightTransfer {
    pub fn allocated_area(&self) -> Area {
        self.new_owners.iter().map(|o| o.area).sum()
    }

    /// Drawn area not handed to any new owner.
    pub fn residue(&self) -> Area {
        self.old_owner_area.saturating_sub(self.allocated_area())
    }
}

/// Hukam substructure, present only on adjudication details
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Adjudication {
    pub authority: String,
    pub adjudication_date: String,
    pub right_class: RightClass,
    pub affected_entries: Vec<AffectedEntry>,
    pub transfers: Vec<RightTransfer>,
}

impl Adjudication {
    pub fn new(authority: impl Into<String>, right_class: RightClass) -> Self {
        Self {
            authority: authority.into(),
            adjudication_date: String::new(),
            right_class,
            affected_entries: Vec::new(),
            transfers: Vec::new(),
        }
    }

    pub fn with_entry(mut self, entry: AffectedEntry) -> Self {
        self.affected_entries.push(entry);
        self
    }
}

/// Substantive content attached 1:1 to a nondh
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NondhDetail {
    pub id: DetailId,
    pub nondh_id: NondhId,
    pub amendment_kind: AmendmentKind,
    pub status: NondhStatus,
    /// Non-empty whenever `status` is invalid
    pub invalid_reason: Option<String>,
    pub date: String,
    pub old_owner_name: Option<String>,
    pub old_owner_area: Option<Area>,
    pub equal_distribution: bool,
    pub owner_relations: Vec<OwnerRelation>,
    pub adjudication: Option<Adjudication>,
}

impl NondhDetail {
    pub fn new(
        id: impl Into<DetailId>,
        nondh_id: impl Into<NondhId>,
        amendment_kind: AmendmentKind,
    ) -> Self {
        Self {
            id: id.into(),
            nondh_id: nondh_id.into(),
            amendment_kind,
            status: NondhStatus::Valid,
            invalid_reason: None,
            date: String::new(),
            old_owner_name: None,
            old_owner_area: None,
            equal_distribution: false,
            owner_relations: Vec::new(),
            adjudication: None,
        }
    }

    pub fn with_status(mut self, status: NondhStatus, reason: Option<&str>) -> Self {
        self.status = status;
        self.invalid_reason = reason.map(str::to_owned);
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn with_owner(mut self, relation: OwnerRelation) -> Self {
        self.owner_relations.push(relation);
        self
    }

    pub fn with_old_owner(mut self, name: impl Into<String>, area: Area) -> Self {
        self.old_owner_name = Some(name.into());
        self.old_owner_area = Some(area);
        self
    }

    pub fn with_adjudication(mut self, adjudication: Adjudication) -> Self {
        self.adjudication = Some(adjudication);
        self
    }

    pub fn is_invalid(&self) -> bool {
        self.status == NondhStatus::Invalid
    }

    /// Old owner name, ignoring blank input.
    pub fn selected_old_owner(&self) -> Option<&str> {
        self.old_owner_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn allocated_area(&self) -> Area {
        self.owner_relations.iter().map(|o| o.area).sum()
    }

    pub fn relation(&self, owner_id: &str) -> Option<&OwnerRelation> {
        self.owner_relations.iter().find(|o| o.id == owner_id)
    }
}

/// Ephemeral old → new owner split consumed by `apply_transfer`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferSpec {
    pub old_owner_name: Option<String>,
    pub old_owner_area: Area,
    /// New owners in allocation order; ids of relations on the detail
    pub new_owner_ids: Vec<OwnerId>,
    pub equal_distribution: bool,
    /// Requested areas; owners absent here keep their current area
    pub per_owner_area: BTreeMap<OwnerId, Area>,
}

impl TransferSpec {
    /// Spec reproducing the detail's current split.
    pub fn from_detail(detail: &NondhDetail) -> Self {
        Self {
            old_owner_name: detail.old_owner_name.clone(),
            old_owner_area: detail.old_owner_area.unwrap_or_default(),
            new_owner_ids: detail.owner_relations.iter().map(|o| o.id.clone()).collect(),
            equal_distribution: detail.equal_distribution,
            per_owner_area: detail
                .owner_relations
                .iter()
                .map(|o| (o.id.clone(), o.area))
                .collect(),
        }
    }

    pub fn with_area(mut self, owner_id: impl Into<OwnerId>, area: Area) -> Self {
        self.per_owner_area.insert(owner_id.into(), area);
        self
    }
}

/// An owner eligible to be selected as old owner at some point in the chain
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OwnerRecord {
    pub owner_name: String,
    pub area: Area,
    pub survey_ref: Option<SurveyRef>,
    /// Nondh where this holding was last observed
    pub source_nondh_id: NondhId,
}

/// Everything the engine knows about one land record
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LandRecordSnapshot {
    pub land_record_id: LandRecordId,
    /// Bumped by the store on every successful save
    pub revision: u64,
    pub nondhs: Vec<Nondh>,
    pub details: Vec<NondhDetail>,
}

impl LandRecordSnapshot {
    pub fn new(land_record_id: impl Into<LandRecordId>) -> Self {
        Self {
            land_record_id: land_record_id.into(),
            ..Default::default()
        }
    }

    pub fn with_entry(mut self, nondh: Nondh, detail: NondhDetail) -> Self {
        self.nondhs.push(nondh);
        self.details.push(detail);
        self
    }

    pub fn detail_for(&self, nondh_id: &str) -> Option<&NondhDetail> {
        self.details.iter().find(|d| d.nondh_id == nondh_id)
    }
}
