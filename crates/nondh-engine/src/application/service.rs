//! Nondh Engine Service
//!
//! Main service implementing NondhEngineApi on top of a SnapshotStore.

use crate::algorithms::ordering::canonical_order;
use crate::algorithms::propagation::{propagate_affected_status, Propagation};
use crate::algorithms::succession::{apply_transfer, check_pool_draw, previous_owners};
use crate::algorithms::validity::{apply_status_change, resolve, StatusChange};
use crate::config::EngineConfig;
use crate::domain::entities::{LandRecordSnapshot, Nondh, NondhDetail, OwnerRecord, TransferSpec};
use crate::domain::errors::EngineError;
use crate::domain::invariants::{first_violation, invariant_one_detail_per_nondh};
use crate::domain::value_objects::{Area, NondhStatus, SurveyRef};
use crate::ports::inbound::NondhEngineApi;
use crate::ports::outbound::SnapshotStore;

use tracing::{debug, info, warn};

/// Nondh Engine Service
///
/// Orchestrates every call the same way:
/// 1. Load the snapshot and validate its size and shape
/// 2. Compute the canonical order
/// 3. Run the pure algorithm
/// 4. Check invariants (when enabled)
/// 5. Save with the loaded revision (when enforced)
pub struct NondhEngineService<S: SnapshotStore> {
    store: S,
    config: EngineConfig,
}

impl<S: SnapshotStore> NondhEngineService<S> {
    /// Create a new service with default config
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: EngineConfig::default(),
        }
    }

    /// Create a new service with custom config
    pub fn with_config(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load a snapshot and its canonical order
    fn load(&self, land_record_id: &str) -> Result<(LandRecordSnapshot, Vec<Nondh>), EngineError> {
        let snapshot = self.store.load(land_record_id)?;

        if snapshot.nondhs.len() > self.config.max_nondhs_per_record {
            return Err(EngineError::TooManyNondhs {
                count: snapshot.nondhs.len(),
                max: self.config.max_nondhs_per_record,
            });
        }

        // orphan or duplicate details would break the validity chain
        if !invariant_one_detail_per_nondh(&snapshot) {
            warn!(land_record_id, "Loaded snapshot is malformed");
            return Err(EngineError::InvariantViolated {
                invariant: "one detail per nondh",
            });
        }

        let order = canonical_order(&snapshot.nondhs);
        debug!(
            land_record_id,
            revision = snapshot.revision,
            nondhs = order.len(),
            "Loaded land record"
        );
        Ok((snapshot, order))
    }

    /// Verify and persist a computed snapshot
    fn commit(&self, snapshot: LandRecordSnapshot, order: &[Nondh]) -> Result<u64, EngineError> {
        if self.config.verify_invariants {
            if let Some(invariant) = first_violation(&snapshot, order) {
                warn!(
                    land_record_id = %snapshot.land_record_id,
                    invariant,
                    "Refusing to save snapshot"
                );
                return Err(EngineError::InvariantViolated { invariant });
            }
        }

        let expected = self.config.enforce_revision.then_some(snapshot.revision);
        let land_record_id = snapshot.land_record_id.clone();
        let revision = self.store.save(snapshot, expected)?;
        debug!(%land_record_id, revision, "Saved land record");
        Ok(revision)
    }
}

impl<S: SnapshotStore> NondhEngineApi for NondhEngineService<S> {
    fn resolve_record(&self, land_record_id: &str) -> Result<LandRecordSnapshot, EngineError> {
        let (mut snapshot, order) = self.load(land_record_id)?;

        snapshot.details = resolve(&order, &snapshot.details);
        let revision = self.commit(snapshot.clone(), &order)?;
        snapshot.revision = revision;

        info!(land_record_id, revision, "Resolved land record");
        Ok(snapshot)
    }

    fn change_status(
        &self,
        land_record_id: &str,
        nondh_id: &str,
        status: NondhStatus,
        reason: Option<&str>,
    ) -> Result<StatusChange, EngineError> {
        let (mut snapshot, order) = self.load(land_record_id)?;

        let change = apply_status_change(&order, &snapshot.details, nondh_id, status, reason)?;
        snapshot.details = change.details.clone();
        let revision = self.commit(snapshot, &order)?;

        info!(
            land_record_id,
            nondh_id,
            status = ?status,
            touched = change.touched_nondh_ids.len(),
            revision,
            "Changed nondh status"
        );
        Ok(change)
    }

    fn propagate_affected(
        &self,
        land_record_id: &str,
        adjudication_detail_id: &str,
        affected_entry_id: &str,
        status: NondhStatus,
        reason: Option<&str>,
    ) -> Result<Propagation, EngineError> {
        let (mut snapshot, order) = self.load(land_record_id)?;

        let propagation = propagate_affected_status(
            &order,
            &snapshot.details,
            adjudication_detail_id,
            affected_entry_id,
            status,
            reason,
        )?;
        snapshot.details = propagation.details.clone();
        self.commit(snapshot, &order)?;

        Ok(propagation)
    }

    fn transfer(
        &self,
        land_record_id: &str,
        detail_id: &str,
        spec: &TransferSpec,
    ) -> Result<NondhDetail, EngineError> {
        let (mut snapshot, order) = self.load(land_record_id)?;

        let idx = snapshot
            .details
            .iter()
            .position(|d| d.id == detail_id)
            .ok_or_else(|| EngineError::not_found("NondhDetail", detail_id))?;

        // the old owner must hold at least the transferred area at this point of the chain
        if let Some(old_owner) = spec.old_owner_name.as_deref().map(str::trim) {
            if !old_owner.is_empty() {
                let nondh_id = snapshot.details[idx].nondh_id.clone();
                let pool = previous_owners(&order, &snapshot.details, None, &nondh_id)?;
                check_pool_draw(&pool, old_owner, Area::ZERO, spec.old_owner_area)?;
            }
        }
        snapshot.details[idx] = apply_transfer(&snapshot.details[idx], spec)?;

        // new owner lines take the chain validity of their nondh
        snapshot.details = resolve(&order, &snapshot.details);
        let updated = snapshot.details[idx].clone();
        let revision = self.commit(snapshot, &order)?;

        info!(
            land_record_id,
            detail_id,
            new_owners = updated.owner_relations.len(),
            revision,
            "Recorded transfer"
        );
        Ok(updated)
    }

    fn previous_owners(
        &self,
        land_record_id: &str,
        survey_ref: Option<&SurveyRef>,
        before_nondh_id: &str,
    ) -> Result<Vec<OwnerRecord>, EngineError> {
        let (snapshot, order) = self.load(land_record_id)?;
        previous_owners(&order, &snapshot.details, survey_ref, before_nondh_id)
    }
}
