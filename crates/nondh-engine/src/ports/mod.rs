//! Ports module for the Nondh Engine
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::NondhEngineApi;
pub use outbound::SnapshotStore;
