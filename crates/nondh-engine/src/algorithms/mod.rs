//! Algorithms module for the Nondh Engine
//!
//! Contains:
//! - Area unit conversion
//! - Canonical nondh ordering
//! - Validity chain resolution
//! - Ownership succession
//! - Affected nondh propagation
//! - Field-level detail diffing

pub mod area;
pub mod diff;
pub mod ordering;
pub mod propagation;
pub mod succession;
pub mod validity;

pub use ordering::canonical_order;
pub use propagation::propagate_affected_status;
pub use succession::{apply_transfer, previous_owners};
pub use validity::{resolve, resolve_from};
