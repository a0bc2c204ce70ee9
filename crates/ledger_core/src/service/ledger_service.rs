//! Objective ledger use-case service.
//!
//! # Responsibility
//! - Implement the ledger operations (register, modify, terminate,
//!   configure priority, establish deadline, delegate, query).
//! - Map repository outcomes onto the ledger error taxonomy.
//!
//! # Invariants
//! - Every operation validates input before touching storage, then checks
//!   record existence, then commits. No failure path leaves partial writes.
//! - Priority and deadline writes require an existing objective for the
//!   same participant.
//! - Log events carry participant ids and lengths, never description text.

use crate::config::{LedgerConfig, TerminationPolicy};
use crate::counter::Counter;
use crate::model::objective::{
    validate_description, ObjectiveRecord, ObjectiveSummary, ParticipantSnapshot, PriorityRecord,
    TemporalRecord, ValidationError, Weight,
};
use crate::model::participant::ParticipantId;
use crate::repo::ledger_repo::{LedgerRepository, RepoError};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MSG_REGISTERED: &str = "objective registered";
pub const MSG_MODIFIED: &str = "objective updated";
pub const MSG_TERMINATED: &str = "objective terminated";
pub const MSG_PRIORITY_SET: &str = "priority configured";
pub const MSG_DEADLINE_SET: &str = "deadline established";
pub const MSG_DELEGATED: &str = "objective delegated";

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Failure outcomes of ledger operations.
#[derive(Debug)]
pub enum LedgerError {
    /// The operation needs an objective for this participant and none exists.
    EntityMissing(ParticipantId),
    /// A supplied value violates a constraint.
    InvalidInput(ValidationError),
    /// The operation needs the absence of an objective and one exists.
    RecordExists(ParticipantId),
    /// Storage failure.
    Repo(RepoError),
}

impl LedgerError {
    /// Stable error code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EntityMissing(_) => "entity_missing",
            Self::InvalidInput(_) => "invalid_input",
            Self::RecordExists(_) => "record_exists",
            Self::Repo(_) => "repo_error",
        }
    }
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EntityMissing(participant) => {
                write!(f, "no objective registered for {participant}")
            }
            Self::InvalidInput(err) => write!(f, "invalid input: {err}"),
            Self::RecordExists(participant) => {
                write!(f, "objective already registered for {participant}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for LedgerError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<RepoError> for LedgerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(participant) => Self::EntityMissing(participant),
            RepoError::AlreadyExists(participant) => Self::RecordExists(participant),
            RepoError::Validation(err) => Self::InvalidInput(err),
            other => Self::Repo(other),
        }
    }
}

/// Ledger facade over one repository and one counter.
pub struct LedgerService<R: LedgerRepository, C: Counter> {
    repo: R,
    counter: C,
    termination_policy: TerminationPolicy,
}

impl<R: LedgerRepository, C: Counter> LedgerService<R, C> {
    /// Creates a service with the default configuration.
    pub fn new(repo: R, counter: C) -> Self {
        Self::with_config(repo, counter, &LedgerConfig::default())
    }

    pub fn with_config(repo: R, counter: C, config: &LedgerConfig) -> Self {
        Self {
            repo,
            counter,
            termination_policy: config.termination_policy,
        }
    }

    /// Policy applied by `terminate`.
    pub fn termination_policy(&self) -> TerminationPolicy {
        self.termination_policy
    }

    /// Registers the caller's objective.
    ///
    /// # Errors
    /// - `InvalidInput` for an empty, over-long or NUL-bearing description.
    /// - `RecordExists` when the caller already has an objective.
    pub fn register(
        &self,
        caller: &ParticipantId,
        description: &str,
    ) -> LedgerResult<&'static str> {
        let result = self
            .create_objective(caller, description)
            .map(|()| MSG_REGISTERED);
        log_outcome("objective_register", caller, &result);
        result
    }

    /// Overwrites the caller's description and completion flag.
    ///
    /// Reopening (`completed` true -> false) is allowed.
    pub fn modify(
        &self,
        caller: &ParticipantId,
        description: &str,
        completed: bool,
    ) -> LedgerResult<&'static str> {
        let result = self.modify_inner(caller, description, completed);
        log_outcome("objective_modify", caller, &result);
        result
    }

    /// Deletes the caller's objective according to the termination policy.
    pub fn terminate(&self, caller: &ParticipantId) -> LedgerResult<&'static str> {
        let result = match self.termination_policy {
            TerminationPolicy::RetainAuxiliary => self.repo.delete_objective(caller),
            TerminationPolicy::Cascade => self.repo.delete_objective_cascade(caller),
        }
        .map(|()| MSG_TERMINATED)
        .map_err(LedgerError::from);
        log_outcome("objective_terminate", caller, &result);
        result
    }

    /// Creates or overwrites the caller's priority weight (1..=3).
    pub fn configure_priority(
        &self,
        caller: &ParticipantId,
        weight: u64,
    ) -> LedgerResult<&'static str> {
        let result = self.configure_priority_inner(caller, weight);
        log_outcome("priority_configure", caller, &result);
        result
    }

    /// Sets the caller's deadline to `counter.current() + duration`.
    pub fn establish_deadline(
        &self,
        caller: &ParticipantId,
        duration: u64,
    ) -> LedgerResult<&'static str> {
        let result = self.establish_deadline_inner(caller, duration);
        log_outcome("deadline_establish", caller, &result);
        result
    }

    /// Assigns a fresh objective to `target`.
    ///
    /// Only the target's record is checked; any caller may delegate to any
    /// participant.
    pub fn delegate(
        &self,
        caller: &ParticipantId,
        target: &ParticipantId,
        description: &str,
    ) -> LedgerResult<&'static str> {
        let result = self
            .create_objective(target, description)
            .map(|()| MSG_DELEGATED);
        match &result {
            Ok(_) => info!(
                "event=objective_delegate module=service status=ok caller={caller} target={target}"
            ),
            Err(err) => log_failure("objective_delegate", target, err),
        }
        result
    }

    /// Existence, description length and completion flag of the caller's
    /// objective. Absent objectives yield `ObjectiveSummary::absent()`.
    pub fn query(&self, caller: &ParticipantId) -> LedgerResult<ObjectiveSummary> {
        Ok(self
            .repo
            .get_objective(caller)?
            .as_ref()
            .map_or_else(ObjectiveSummary::absent, ObjectiveSummary::from))
    }

    pub fn objective(&self, participant: &ParticipantId) -> LedgerResult<Option<ObjectiveRecord>> {
        Ok(self.repo.get_objective(participant)?)
    }

    pub fn priority(&self, participant: &ParticipantId) -> LedgerResult<Option<PriorityRecord>> {
        Ok(self.repo.get_priority(participant)?)
    }

    pub fn deadline(&self, participant: &ParticipantId) -> LedgerResult<Option<TemporalRecord>> {
        Ok(self.repo.get_temporal(participant)?)
    }

    /// Reads all three tables for one participant.
    pub fn snapshot(&self, participant: &ParticipantId) -> LedgerResult<ParticipantSnapshot> {
        Ok(ParticipantSnapshot {
            participant: participant.clone(),
            objective: self.repo.get_objective(participant)?,
            priority: self.repo.get_priority(participant)?,
            temporal: self.repo.get_temporal(participant)?,
        })
    }

    /// Participants whose priority/deadline rows outlived their objective.
    pub fn orphaned_participants(&self) -> LedgerResult<Vec<ParticipantId>> {
        Ok(self.repo.list_orphaned_participants()?)
    }

    fn create_objective(&self, participant: &ParticipantId, description: &str) -> LedgerResult<()> {
        let record = ObjectiveRecord::new(description)?;
        if self.repo.get_objective(participant)?.is_some() {
            return Err(LedgerError::RecordExists(participant.clone()));
        }
        self.repo.insert_objective(participant, &record)?;
        debug!(
            "event=objective_create module=service status=ok participant={participant} description_len={}",
            record.description_len()
        );
        Ok(())
    }

    fn modify_inner(
        &self,
        caller: &ParticipantId,
        description: &str,
        completed: bool,
    ) -> LedgerResult<&'static str> {
        validate_description(description)?;
        self.require_objective(caller)?;
        let record = ObjectiveRecord {
            description: description.to_string(),
            completed,
        };
        self.repo.update_objective(caller, &record)?;
        Ok(MSG_MODIFIED)
    }

    fn configure_priority_inner(
        &self,
        caller: &ParticipantId,
        weight: u64,
    ) -> LedgerResult<&'static str> {
        let weight = Weight::new(weight)?;
        self.require_objective(caller)?;
        self.repo
            .upsert_priority(caller, &PriorityRecord { weight })?;
        Ok(MSG_PRIORITY_SET)
    }

    fn establish_deadline_inner(
        &self,
        caller: &ParticipantId,
        duration: u64,
    ) -> LedgerResult<&'static str> {
        let current = self.counter.current();
        let record = TemporalRecord::starting_at(current, duration)?;
        self.require_objective(caller)?;
        self.repo.upsert_temporal(caller, &record)?;
        debug!(
            "event=deadline_compute module=service status=ok participant={caller} current={current} deadline={}",
            record.deadline
        );
        Ok(MSG_DEADLINE_SET)
    }

    fn require_objective(&self, participant: &ParticipantId) -> LedgerResult<()> {
        match self.repo.get_objective(participant)? {
            Some(_) => Ok(()),
            None => Err(LedgerError::EntityMissing(participant.clone())),
        }
    }
}

fn log_outcome<T>(event: &'static str, participant: &ParticipantId, result: &LedgerResult<T>) {
    match result {
        Ok(_) => info!("event={event} module=service status=ok participant={participant}"),
        Err(err) => log_failure(event, participant, err),
    }
}

fn log_failure(event: &'static str, participant: &ParticipantId, err: &LedgerError) {
    match err {
        LedgerError::Repo(inner) => error!(
            "event={event} module=service status=error participant={participant} error_code={} error={inner}",
            err.code()
        ),
        _ => debug!(
            "event={event} module=service status=rejected participant={participant} error_code={}",
            err.code()
        ),
    }
}
