//! Configuration for the Nondh Engine

use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum nondhs accepted in one land record snapshot
    pub max_nondhs_per_record: usize,
    /// Pass the loaded revision to the store on save (optimistic single writer)
    pub enforce_revision: bool,
    /// Run the invariant checkers before every save
    pub verify_invariants: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_nondhs_per_record: 1000,
            enforce_revision: true,
            verify_invariants: true,
        }
    }
}
