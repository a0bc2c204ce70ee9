//! Participant identity.
//!
//! # Responsibility
//! - Wrap the opaque principal string supplied by the caller identity
//!   provider into a validated key type.
//!
//! # Invariants
//! - Identity is non-empty, contains no whitespace and is at most
//!   `MAX_PARTICIPANT_BYTES` bytes.

use crate::model::objective::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Upper bound for participant identity length in bytes.
pub const MAX_PARTICIPANT_BYTES: usize = 128;

/// Unique principal identifier keying every ledger table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Parses and validates one participant identity.
    ///
    /// Leading/trailing whitespace is rejected rather than trimmed, so the
    /// stored key is always byte-identical to what the caller supplied.
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty()
            || value.len() > MAX_PARTICIPANT_BYTES
            || value.chars().any(char::is_whitespace)
        {
            return Err(ValidationError::InvalidParticipant(value));
        }
        Ok(Self(value))
    }

    /// Borrowed string form used as the storage key.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ParticipantId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for ParticipantId {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ParticipantId> for String {
    fn from(value: ParticipantId) -> Self {
        value.0
    }
}
