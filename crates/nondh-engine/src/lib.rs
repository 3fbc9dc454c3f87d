//! # Nondh Engine
//!
//! Validity and ownership succession engine for cadastral amendment
//! entries ("nondhs").
//!
//! ## Architecture
//!
//! - **Domain**: Core entities (Nondh, NondhDetail, OwnerRelation), `Area`,
//!   errors, invariant checkers
//! - **Algorithms**: area conversion, canonical ordering, validity chain,
//!   ownership succession, affected-entry propagation, field diffing
//! - **Ports**: Inbound (`NondhEngineApi`) and Outbound (`SnapshotStore`)
//! - **Adapters**: In-memory snapshot store
//! - **Application**: Service orchestration (load → compute → save)
//!
//! ## Data Flow
//!
//! ```text
//! snapshot ──→ canonical_order ──→ resolve ──→ previous_owners / apply_transfer
//!                                      ↑                  │
//!                                      └── propagate_affected_status
//! ```
//!
//! Every algorithm is a pure function over a snapshot. Callers persist the
//! returned snapshot; the engine performs no I/O of its own.

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::InMemorySnapshotStore;
pub use algorithms::area::{
    from_acre_guntha, from_square_meters, to_acre_guntha, to_display, to_square_meters,
};
pub use algorithms::diff::{diff_details, DetailChange, DetailField};
pub use algorithms::ordering::canonical_order;
pub use algorithms::propagation::{
    propagate_affected_status, remove_affected_entry, Propagation,
};
pub use algorithms::succession::{
    add_new_owner, apply_first_right, apply_transfer, check_pool_draw, import_second_right,
    previous_owners, remove_new_owner, select_old_owner, set_equal_distribution,
    set_new_owner_area, transfer_state,
};
pub use algorithms::validity::{apply_status_change, resolve, resolve_from, StatusChange};
pub use application::service::NondhEngineService;
pub use config::EngineConfig;
pub use domain::entities::*;
pub use domain::errors::{EngineError, StoreError};
pub use domain::value_objects::*;
pub use ports::inbound::NondhEngineApi;
pub use ports::outbound::SnapshotStore;
