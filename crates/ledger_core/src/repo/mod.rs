//! Repository layer for the ledger tables.
//!
//! # Responsibility
//! - Define the storage contract the ledger service is written against.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Writes validate records before touching SQL.
//! - Reads reject invalid persisted state instead of masking it.
//! - Semantic outcomes (`NotFound`, `AlreadyExists`) are reported separately
//!   from transport errors.

pub mod ledger_repo;
