//! Core domain logic for the objective ledger.
//! This crate is the single source of truth for ledger invariants.

pub mod config;
pub mod counter;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, LedgerConfig, TerminationPolicy};
pub use counter::{Counter, ManualCounter};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::objective::{
    ObjectiveRecord, ObjectiveSummary, ParticipantSnapshot, PriorityRecord, TemporalRecord,
    ValidationError, Weight, MAX_DESCRIPTION_CHARS,
};
pub use model::participant::ParticipantId;
pub use repo::ledger_repo::{LedgerRepository, RepoError, RepoResult, SqliteLedgerRepository};
pub use service::ledger_service::{LedgerError, LedgerResult, LedgerService};

/// Minimal health-check API for integration probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
