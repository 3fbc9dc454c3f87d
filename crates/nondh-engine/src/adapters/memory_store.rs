use crate::domain::entities::LandRecordSnapshot;
use crate::domain::errors::StoreError;
use crate::domain::value_objects::LandRecordId;
use crate::ports::SnapshotStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory implementation of SnapshotStore for testing
pub struct InMemorySnapshotStore {
    snapshots: RwLock<HashMap<LandRecordId, LandRecordSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    /// Seed a snapshot as-is, bypassing the revision check.
    pub fn insert(&self, snapshot: LandRecordSnapshot) -> Result<(), StoreError> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        snapshots.insert(snapshot.land_record_id.clone(), snapshot);
        Ok(())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(snapshots.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load(&self, land_record_id: &str) -> Result<LandRecordSnapshot, StoreError> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        snapshots
            .get(land_record_id)
            .cloned()
            .ok_or_else(|| StoreError::SnapshotNotFound {
                land_record_id: land_record_id.to_owned(),
            })
    }

    fn save(
        &self,
        mut snapshot: LandRecordSnapshot,
        expected_revision: Option<u64>,
    ) -> Result<u64, StoreError> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let stored = snapshots
            .get(&snapshot.land_record_id)
            .map_or(0, |s| s.revision);

        if let Some(expected) = expected_revision {
            if expected != stored {
                return Err(StoreError::RevisionConflict {
                    expected,
                    actual: stored,
                });
            }
        }

        snapshot.revision = stored + 1;
        let revision = snapshot.revision;
        snapshots.insert(snapshot.land_record_id.clone(), snapshot);
        Ok(revision)
    }
}
