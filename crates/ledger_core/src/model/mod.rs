//! Domain model for the objective ledger.
//!
//! # Responsibility
//! - Define the three per-participant record kinds and their read models.
//! - Own value-level validation (description bounds, weight range, identity).
//!
//! # Invariants
//! - Every record is keyed by a validated `ParticipantId`.
//! - A stored objective description is never empty and at most
//!   `MAX_DESCRIPTION_CHARS` characters.
//! - `Weight` can only hold 1, 2 or 3.

pub mod objective;
pub mod participant;
