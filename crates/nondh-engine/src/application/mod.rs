//! Application layer for the Nondh Engine

pub mod service;

pub use service::NondhEngineService;
