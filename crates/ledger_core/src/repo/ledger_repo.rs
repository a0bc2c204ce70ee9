//! Ledger repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide per-table primitives over `objectives`, `priorities` and
//!   `deadlines`.
//! - Run multi-table deletes inside one transaction.
//!
//! # Invariants
//! - Each table holds at most one row per participant.
//! - Auxiliary rows are only removed through `delete_auxiliary` or
//!   `delete_objective_cascade`; plain objective deletion leaves them alone.

use crate::db::{latest_version, schema_version, DbError};
use crate::model::objective::{ObjectiveRecord, PriorityRecord, TemporalRecord, ValidationError, Weight};
use crate::model::participant::ParticipantId;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("objectives", &["participant", "description", "completed"]),
    ("priorities", &["participant", "weight"]),
    ("deadlines", &["participant", "deadline", "alert_activated"]),
];

/// Repository error for ledger persistence and lookups.
#[derive(Debug)]
pub enum RepoError {
    /// Record failed value validation before write.
    Validation(ValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target participant has no objective row.
    NotFound(ParticipantId),
    /// Target participant already has an objective row.
    AlreadyExists(ParticipantId),
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from an expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(participant) => write!(f, "objective not found: {participant}"),
            Self::AlreadyExists(participant) => {
                write!(f, "objective already exists: {participant}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted ledger data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "ledger repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "ledger repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "ledger repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract for the three ledger tables.
pub trait LedgerRepository {
    /// Loads one participant's objective.
    fn get_objective(&self, participant: &ParticipantId) -> RepoResult<Option<ObjectiveRecord>>;
    /// Inserts a new objective; fails with `AlreadyExists` when one is present.
    fn insert_objective(
        &self,
        participant: &ParticipantId,
        record: &ObjectiveRecord,
    ) -> RepoResult<()>;
    /// Overwrites an existing objective; fails with `NotFound` otherwise.
    fn update_objective(
        &self,
        participant: &ParticipantId,
        record: &ObjectiveRecord,
    ) -> RepoResult<()>;
    /// Deletes the objective row only.
    fn delete_objective(&self, participant: &ParticipantId) -> RepoResult<()>;
    /// Deletes the objective row and its auxiliary rows in one transaction.
    fn delete_objective_cascade(&self, participant: &ParticipantId) -> RepoResult<()>;
    /// Deletes priority and deadline rows; returns the number of rows removed.
    fn delete_auxiliary(&self, participant: &ParticipantId) -> RepoResult<usize>;
    fn get_priority(&self, participant: &ParticipantId) -> RepoResult<Option<PriorityRecord>>;
    /// Creates or overwrites the priority row.
    fn upsert_priority(&self, participant: &ParticipantId, record: &PriorityRecord)
        -> RepoResult<()>;
    fn get_temporal(&self, participant: &ParticipantId) -> RepoResult<Option<TemporalRecord>>;
    /// Creates or overwrites the deadline row.
    fn upsert_temporal(&self, participant: &ParticipantId, record: &TemporalRecord)
        -> RepoResult<()>;
    /// Participants holding priority/deadline rows without an objective,
    /// sorted ascending.
    fn list_orphaned_participants(&self) -> RepoResult<Vec<ParticipantId>>;
}

/// SQLite-backed ledger repository over a borrowed, migrated connection.
pub struct SqliteLedgerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLedgerRepository<'conn> {
    /// Constructs a repository after checking schema version and table shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl LedgerRepository for SqliteLedgerRepository<'_> {
    fn get_objective(&self, participant: &ParticipantId) -> RepoResult<Option<ObjectiveRecord>> {
        self.conn
            .query_row(
                "SELECT description, completed FROM objectives WHERE participant = ?1;",
                [participant.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?
            .map(|(description, completed)| -> RepoResult<ObjectiveRecord> {
                let record = ObjectiveRecord {
                    description,
                    completed: int_to_bool(completed, "objectives.completed")?,
                };
                record.validate().map_err(|err| {
                    RepoError::InvalidData(format!("objectives row for {participant}: {err}"))
                })?;
                Ok(record)
            })
            .transpose()
    }

    fn insert_objective(
        &self,
        participant: &ParticipantId,
        record: &ObjectiveRecord,
    ) -> RepoResult<()> {
        record.validate()?;

        let changed = self.conn.execute(
            "INSERT INTO objectives (participant, description, completed)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(participant) DO NOTHING;",
            params![
                participant.as_str(),
                record.description.as_str(),
                bool_to_int(record.completed),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::AlreadyExists(participant.clone()));
        }
        Ok(())
    }

    fn update_objective(
        &self,
        participant: &ParticipantId,
        record: &ObjectiveRecord,
    ) -> RepoResult<()> {
        record.validate()?;

        let changed = self.conn.execute(
            "UPDATE objectives
             SET description = ?2, completed = ?3
             WHERE participant = ?1;",
            params![
                participant.as_str(),
                record.description.as_str(),
                bool_to_int(record.completed),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(participant.clone()));
        }
        Ok(())
    }

    fn delete_objective(&self, participant: &ParticipantId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM objectives WHERE participant = ?1;",
            [participant.as_str()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(participant.clone()));
        }
        Ok(())
    }

    fn delete_objective_cascade(&self, participant: &ParticipantId) -> RepoResult<()> {
        // Dropping the transaction without commit rolls back.
        let tx = self.conn.unchecked_transaction()?;
        self.delete_objective(participant)?;
        self.delete_auxiliary(participant)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_auxiliary(&self, participant: &ParticipantId) -> RepoResult<usize> {
        let priorities = self.conn.execute(
            "DELETE FROM priorities WHERE participant = ?1;",
            [participant.as_str()],
        )?;
        let deadlines = self.conn.execute(
            "DELETE FROM deadlines WHERE participant = ?1;",
            [participant.as_str()],
        )?;
        Ok(priorities + deadlines)
    }

    fn get_priority(&self, participant: &ParticipantId) -> RepoResult<Option<PriorityRecord>> {
        self.conn
            .query_row(
                "SELECT weight FROM priorities WHERE participant = ?1;",
                [participant.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .map(|weight| -> RepoResult<PriorityRecord> {
                let weight = u64::try_from(weight)
                    .ok()
                    .and_then(|value| Weight::new(value).ok())
                    .ok_or_else(|| {
                        RepoError::InvalidData(format!(
                            "invalid weight `{weight}` in priorities.weight"
                        ))
                    })?;
                Ok(PriorityRecord { weight })
            })
            .transpose()
    }

    fn upsert_priority(
        &self,
        participant: &ParticipantId,
        record: &PriorityRecord,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO priorities (participant, weight)
             VALUES (?1, ?2)
             ON CONFLICT(participant) DO UPDATE SET weight = excluded.weight;",
            params![participant.as_str(), i64::from(record.weight.get())],
        )?;
        Ok(())
    }

    fn get_temporal(&self, participant: &ParticipantId) -> RepoResult<Option<TemporalRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT deadline, alert_activated FROM deadlines WHERE participant = ?1;")?;
        let mut rows = stmt.query([participant.as_str()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_temporal_row(row)?)),
            None => Ok(None),
        }
    }

    fn upsert_temporal(
        &self,
        participant: &ParticipantId,
        record: &TemporalRecord,
    ) -> RepoResult<()> {
        let deadline = i64::try_from(record.deadline).map_err(|_| {
            RepoError::InvalidData(format!("deadline {} exceeds storage range", record.deadline))
        })?;

        self.conn.execute(
            "INSERT INTO deadlines (participant, deadline, alert_activated)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(participant) DO UPDATE SET
                deadline = excluded.deadline,
                alert_activated = excluded.alert_activated;",
            params![
                participant.as_str(),
                deadline,
                bool_to_int(record.alert_activated)
            ],
        )?;
        Ok(())
    }

    fn list_orphaned_participants(&self) -> RepoResult<Vec<ParticipantId>> {
        let mut stmt = self.conn.prepare(
            "SELECT participant FROM priorities
             UNION
             SELECT participant FROM deadlines
             EXCEPT
             SELECT participant FROM objectives
             ORDER BY participant ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut participants = Vec::new();

        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            let participant = ParticipantId::parse(value.as_str()).map_err(|_| {
                RepoError::InvalidData(format!("invalid participant `{value}` in auxiliary table"))
            })?;
            participants.push(participant);
        }

        Ok(participants)
    }
}

fn parse_temporal_row(row: &Row<'_>) -> RepoResult<TemporalRecord> {
    let deadline: i64 = row.get("deadline")?;
    let deadline = u64::try_from(deadline).map_err(|_| {
        RepoError::InvalidData(format!("invalid deadline `{deadline}` in deadlines.deadline"))
    })?;
    let alert_activated = int_to_bool(row.get("alert_activated")?, "deadlines.alert_activated")?;
    Ok(TemporalRecord {
        deadline,
        alert_activated,
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}
