//! Outbound Ports (Driven Ports / SPI)

use crate::domain::entities::LandRecordSnapshot;
use crate::domain::errors::StoreError;

/// Land record snapshot persistence
///
/// Implementations must be safe for concurrent use. The engine itself is
/// a single writer per land record; `expected_revision` lets a store reject
/// a save that raced another writer.
pub trait SnapshotStore: Send + Sync {
    /// Load the latest snapshot of a land record.
    fn load(&self, land_record_id: &str) -> Result<LandRecordSnapshot, StoreError>;

    /// Persist a snapshot and return its new revision.
    ///
    /// With `Some(expected)`, the save fails with `RevisionConflict` unless
    /// the stored revision still equals `expected`.
    fn save(
        &self,
        snapshot: LandRecordSnapshot,
        expected_revision: Option<u64>,
    ) -> Result<u64, StoreError>;
}

/// Mock implementations for testing
#[cfg(test)]
pub mod mocks {
    use super::*;

    /// Store whose lock is always poisoned
    pub struct PoisonedStore;

    impl SnapshotStore for PoisonedStore {
        fn load(&self, _land_record_id: &str) -> Result<LandRecordSnapshot, StoreError> {
            Err(StoreError::LockPoisoned)
        }

        fn save(
            &self,
            _snapshot: LandRecordSnapshot,
            _expected_revision: Option<u64>,
        ) -> Result<u64, StoreError> {
            Err(StoreError::LockPoisoned)
        }
    }
}
