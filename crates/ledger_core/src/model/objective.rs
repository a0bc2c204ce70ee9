//! Objective, priority and temporal-bounds records.
//!
//! # Responsibility
//! - Define the canonical shapes stored in the `objectives`, `priorities`
//!   and `deadlines` tables.
//! - Provide constructors that enforce value constraints before persistence.
//!
//! # Invariants
//! - `ObjectiveRecord::description` is 1..=`MAX_DESCRIPTION_CHARS` characters
//!   and contains no NUL; this holds for deserialized records too.
//! - `Weight` is always within `Weight::MIN..=Weight::MAX`.
//! - `TemporalRecord::alert_activated` starts as `false`; nothing in core
//!   sets it to `true`.

use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum description length, counted in characters (Unicode scalar values).
pub const MAX_DESCRIPTION_CHARS: usize = 100;

/// Value-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Description is the empty string.
    EmptyDescription,
    /// Description contains a NUL character.
    DescriptionContainsNul,
    /// Description exceeds `MAX_DESCRIPTION_CHARS`.
    DescriptionTooLong { max: usize, actual: usize },
    /// Priority weight outside `1..=3`.
    WeightOutOfRange(u64),
    /// Deadline duration is zero.
    NonPositiveDuration,
    /// `current + duration` does not fit the counter/storage range.
    DeadlineOverflow { current: u64, duration: u64 },
    /// Participant identity is empty, oversized or contains whitespace.
    InvalidParticipant(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "description must not be empty"),
            Self::DescriptionContainsNul => {
                write!(f, "description must not contain NUL characters")
            }
            Self::DescriptionTooLong { max, actual } => write!(
                f,
                "description has {actual} characters; at most {max} allowed"
            ),
            Self::WeightOutOfRange(weight) => write!(
                f,
                "weight {weight} out of range; expected {}..={}",
                Weight::MIN,
                Weight::MAX
            ),
            Self::NonPositiveDuration => write!(f, "duration must be greater than zero"),
            Self::DeadlineOverflow { current, duration } => write!(
                f,
                "deadline overflows: counter {current} + duration {duration}"
            ),
            Self::InvalidParticipant(value) => {
                write!(f, "invalid participant identity `{value}`")
            }
        }
    }
}

impl Error for ValidationError {}

/// Checks the description bounds shared by registration, modification and
/// delegation.
pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    // SQLite's length() stops at the first NUL.
    if description.contains('\0') {
        return Err(ValidationError::DescriptionContainsNul);
    }
    let actual = description.chars().count();
    if actual > MAX_DESCRIPTION_CHARS {
        return Err(ValidationError::DescriptionTooLong {
            max: MAX_DESCRIPTION_CHARS,
            actual,
        });
    }
    Ok(())
}

/// One participant's active objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawObjectiveRecord")]
pub struct ObjectiveRecord {
    pub description: String,
    pub completed: bool,
}

/// Unchecked wire shape; converted through `ObjectiveRecord::validate`.
#[derive(Deserialize)]
struct RawObjectiveRecord {
    description: String,
    completed: bool,
}

impl TryFrom<RawObjectiveRecord> for ObjectiveRecord {
    type Error = ValidationError;

    fn try_from(raw: RawObjectiveRecord) -> Result<Self, Self::Error> {
        let record = Self {
            description: raw.description,
            completed: raw.completed,
        };
        record.validate()?;
        Ok(record)
    }
}

impl ObjectiveRecord {
    /// Creates an open (not completed) objective after validating the text.
    pub fn new(description: impl Into<String>) -> Result<Self, ValidationError> {
        let record = Self {
            description: description.into(),
            completed: false,
        };
        record.validate()?;
        Ok(record)
    }

    /// Validates stored-record invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_description(&self.description)
    }

    /// Description length in characters, as reported by `query`.
    pub fn description_len(&self) -> usize {
        self.description.chars().count()
    }
}

/// Priority classification restricted to 1..=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Weight(u8);

impl Weight {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 3;

    pub fn new(value: u64) -> Result<Self, ValidationError> {
        match u8::try_from(value) {
            Ok(weight) if (Self::MIN..=Self::MAX).contains(&weight) => Ok(Self(weight)),
            _ => Err(ValidationError::WeightOutOfRange(value)),
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u64> for Weight {
    type Error = ValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Weight> for u64 {
    fn from(value: Weight) -> Self {
        u64::from(value.0)
    }
}

impl Display for Weight {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Priority table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityRecord {
    pub weight: Weight,
}

/// Temporal-bounds table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalRecord {
    /// Absolute counter value (e.g. block height).
    pub deadline: u64,
    /// Stored for future alerting; never flipped by core operations.
    pub alert_activated: bool,
}

impl TemporalRecord {
    /// Computes `current + duration` and returns a fresh, non-alerted record.
    ///
    /// # Errors
    /// - `NonPositiveDuration` when `duration == 0`.
    /// - `DeadlineOverflow` when the sum exceeds `i64::MAX`, the largest value
    ///   SQLite can hold in an INTEGER column.
    pub fn starting_at(current: u64, duration: u64) -> Result<Self, ValidationError> {
        if duration == 0 {
            return Err(ValidationError::NonPositiveDuration);
        }
        let deadline = current
            .checked_add(duration)
            .filter(|deadline| i64::try_from(*deadline).is_ok())
            .ok_or(ValidationError::DeadlineOverflow { current, duration })?;
        Ok(Self {
            deadline,
            alert_activated: false,
        })
    }
}

/// Result of the `query` operation.
///
/// Carries the description length only; the text itself is not exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveSummary {
    pub exists: bool,
    pub description_length: usize,
    pub completed: bool,
}

impl ObjectiveSummary {
    /// Summary returned for participants without an objective.
    pub fn absent() -> Self {
        Self {
            exists: false,
            description_length: 0,
            completed: false,
        }
    }
}

impl From<&ObjectiveRecord> for ObjectiveSummary {
    fn from(record: &ObjectiveRecord) -> Self {
        Self {
            exists: true,
            description_length: record.description_len(),
            completed: record.completed,
        }
    }
}

/// All three tables correlated by one participant identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSnapshot {
    pub participant: ParticipantId,
    pub objective: Option<ObjectiveRecord>,
    pub priority: Option<PriorityRecord>,
    pub temporal: Option<TemporalRecord>,
}

impl ParticipantSnapshot {
    /// True when auxiliary records outlive (or predate) the objective.
    pub fn is_orphaned(&self) -> bool {
        self.objective.is_none() && (self.priority.is_some() || self.temporal.is_some())
    }
}
