//! Ledger use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the ledger operations.
//! - Keep callers decoupled from storage details.

pub mod ledger_service;
