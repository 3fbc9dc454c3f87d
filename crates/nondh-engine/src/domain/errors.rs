//! Error types for the Nondh Engine

use super::value_objects::{AmendmentKind, RightClass};
use thiserror::Error;

/// Business-rule and integration failures returned by the engine
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// New-owner area would exceed what the old owner still holds
    #[error("Area exceeded for owner {owner_id}: requested {requested} sqm, max allowed {max_allowed} sqm")]
    AreaExceeded {
        owner_id: String,
        requested: f64,
        max_allowed: f64,
    },

    /// New-owner operation on a transfer with no old owner selected
    #[error("Detail {detail_id} has no old owner selected")]
    MissingOldOwner { detail_id: String },

    /// Status set to invalid without a reason
    #[error("Detail {detail_id} marked invalid without a reason")]
    MissingReason { detail_id: String },

    /// Affected entry points at a nondh number not in the record
    #[error("Unknown nondh reference: {referenced_number}")]
    UnknownReference { referenced_number: String },

    /// Caller passed an id absent from the snapshot
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Negative area requested for an owner
    #[error("Negative area requested for owner {owner_id}: {requested} sqm")]
    NegativeArea { owner_id: String, requested: f64 },

    /// NaN or infinite area requested for an owner
    #[error("Invalid area requested for owner {owner_id}")]
    InvalidArea { owner_id: String },

    /// Transfer operation on a detail that does not transfer ownership
    #[error("Detail {detail_id} of kind {kind:?} does not transfer ownership")]
    NotTransferKind {
        detail_id: String,
        kind: AmendmentKind,
    },

    /// Adjudication right operation on the wrong right class
    #[error("Detail {detail_id} is not a {expected:?}-right adjudication")]
    WrongRightClass {
        detail_id: String,
        expected: RightClass,
    },

    /// Selected old owner is not eligible at this point of the chain
    #[error("Owner {owner_name} is not in the eligible owner pool")]
    OwnerNotInPool { owner_name: String },

    /// Snapshot exceeds configured limits
    #[error("Too many nondhs: {count} > {max}")]
    TooManyNondhs { count: usize, max: usize },

    /// Computed snapshot broke a ledger invariant
    #[error("Invariant violated: {invariant}")]
    InvariantViolated { invariant: &'static str },

    /// Persistence collaborator failed
    #[error("Snapshot store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Broken caller contract rather than a user-correctable condition.
    pub fn is_fatal(&self) -> bool {
        match self {
            EngineError::NotFound { .. } | EngineError::InvariantViolated { .. } => true,
            EngineError::Store(inner) => matches!(inner, StoreError::LockPoisoned),
            _ => false,
        }
    }
}

/// Snapshot store errors
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("Snapshot not found for land record {land_record_id}")]
    SnapshotNotFound { land_record_id: String },

    #[error("Revision conflict: expected {expected}, stored {actual}")]
    RevisionConflict { expected: u64, actual: u64 },

    #[error("Snapshot store lock poisoned")]
    LockPoisoned,
}
