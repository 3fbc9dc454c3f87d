//! Inbound Ports (Driving Ports / API)

use crate::algorithms::propagation::Propagation;
use crate::algorithms::validity::StatusChange;
use crate::domain::entities::{LandRecordSnapshot, NondhDetail, OwnerRecord, TransferSpec};
use crate::domain::errors::EngineError;
use crate::domain::value_objects::{NondhStatus, SurveyRef};

/// Primary Nondh Engine API
///
/// Every mutating call loads the land record, computes the new snapshot and
/// saves it back. Nothing is saved when a call returns an error.
pub trait NondhEngineApi: Send + Sync {
    /// Re-derive every owner relation's validity flag and persist the result.
    fn resolve_record(&self, land_record_id: &str) -> Result<LandRecordSnapshot, EngineError>;

    /// Change one nondh's status and re-resolve everything before it.
    fn change_status(
        &self,
        land_record_id: &str,
        nondh_id: &str,
        status: NondhStatus,
        reason: Option<&str>,
    ) -> Result<StatusChange, EngineError>;

    /// Set an adjudication's affected entry status and sync it onto the
    /// referenced nondh.
    fn propagate_affected(
        &self,
        land_record_id: &str,
        adjudication_detail_id: &str,
        affected_entry_id: &str,
        status: NondhStatus,
        reason: Option<&str>,
    ) -> Result<Propagation, EngineError>;

    /// Apply an old → new owner split to a transfer-kind detail.
    fn transfer(
        &self,
        land_record_id: &str,
        detail_id: &str,
        spec: &TransferSpec,
    ) -> Result<NondhDetail, EngineError>;

    /// Owners eligible as old owner for `before_nondh_id`. Read only.
    fn previous_owners(
        &self,
        land_record_id: &str,
        survey_ref: Option<&SurveyRef>,
        before_nondh_id: &str,
    ) -> Result<Vec<OwnerRecord>, EngineError>;
}
