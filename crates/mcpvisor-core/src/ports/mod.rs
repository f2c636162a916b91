//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the provider manager expects from
//! infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No process or filesystem types in any signature
//! - Intent-based methods for the process controller (start, stop, kill)
//! - Ordinary probe failures are values, never errors

pub mod event_emitter;
pub mod health_probe;
pub mod process_controller;
pub mod provider_error;
pub mod repository;

pub use event_emitter::EventEmitter;
pub use health_probe::{HandshakeReport, HealthProbe, ProbeFailure, ProviderChannel};
pub use process_controller::{
    ProcessController, ProcessError, ProcessExit, ProcessHandle, StopOutcome, Termination,
};
pub use provider_error::{ErrorCategory, ImportValidationError, ProviderError, ProviderErrorInfo};
pub use repository::{ProviderRepository, RepositoryError};
