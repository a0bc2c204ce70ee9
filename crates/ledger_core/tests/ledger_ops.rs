use ledger_core::db::open_db_in_memory;
use ledger_core::{
    LedgerConfig, LedgerError, LedgerService, ManualCounter, ObjectiveRecord, ObjectiveSummary,
    ParticipantId, PriorityRecord, SqliteLedgerRepository, TemporalRecord, TerminationPolicy,
    ValidationError, Weight,
};
use rusqlite::Connection;

fn participant(value: &str) -> ParticipantId {
    ParticipantId::parse(value).unwrap()
}

fn service(
    conn: &Connection,
    counter: u64,
) -> LedgerService<SqliteLedgerRepository<'_>, ManualCounter> {
    let repo = SqliteLedgerRepository::try_new(conn).unwrap();
    LedgerService::new(repo, ManualCounter::new(counter))
}

#[test]
fn query_on_unknown_participant_reports_absent() {
    let conn = open_db_in_memory().unwrap();
    let ledger = service(&conn, 0);

    let summary = ledger.query(&participant("nobody")).unwrap();
    assert_eq!(summary, ObjectiveSummary::absent());
    assert!(!summary.exists);
    assert_eq!(summary.description_length, 0);
    assert!(!summary.completed);
}

#[test]
fn register_with_empty_description_fails_without_mutation() {
    let conn = open_db_in_memory().unwrap();
    let ledger = service(&conn, 0);
    let alice = participant("alice");

    let err = ledger.register(&alice, "").unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InvalidInput(ValidationError::EmptyDescription)
    ));
    assert!(ledger.objective(&alice).unwrap().is_none());
}

#[test]
fn register_rejects_over_long_description() {
    let conn = open_db_in_memory().unwrap();
    let ledger = service(&conn, 0);
    let alice = participant("alice");

    let err = ledger.register(&alice, &"x".repeat(101)).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InvalidInput(ValidationError::DescriptionTooLong {
            max: 100,
            actual: 101
        })
    ));
    ledger.register(&alice, &"x".repeat(100)).unwrap();
}

#[test]
fn multi_byte_description_length_survives_storage() {
    let conn = open_db_in_memory().unwrap();
    let ledger = service(&conn, 0);
    let alice = participant("alice");
    let bob = participant("bob");

    let accented = "é".repeat(100);
    ledger.register(&alice, &accented).unwrap();
    let summary = ledger.query(&alice).unwrap();
    assert!(summary.exists);
    assert_eq!(summary.description_length, 100);
    assert_eq!(
        ledger.objective(&alice).unwrap().unwrap().description,
        accented
    );

    ledger.register(&bob, "日本語の目標").unwrap();
    assert_eq!(ledger.query(&bob).unwrap().description_length, 6);
}

#[test]
fn descriptions_with_nul_are_invalid_input_everywhere() {
    let conn = open_db_in_memory().unwrap();
    let ledger = service(&conn, 0);
    let alice = participant("alice");
    let bob = participant("bob");
    let padded = format!("{}\0{}", "a".repeat(60), "b".repeat(39));

    for text in ["\0abc", padded.as_str()] {
        let err = ledger.register(&alice, text).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidInput(ValidationError::DescriptionContainsNul)
        ));
        assert!(ledger.objective(&alice).unwrap().is_none());

        let err = ledger.delegate(&alice, &bob, text).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
        assert!(!ledger.query(&bob).unwrap().exists);
    }

    ledger.register(&alice, "clean").unwrap();
    let err = ledger.modify(&alice, &padded, true).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InvalidInput(ValidationError::DescriptionContainsNul)
    ));
    assert_eq!(
        ledger.objective(&alice).unwrap(),
        Some(ObjectiveRecord::new("clean").unwrap())
    );
}

#[test]
fn second_register_fails_and_keeps_first_record() {
    let conn = open_db_in_memory().unwrap();
    let ledger = service(&conn, 0);
    let alice = participant("alice");

    ledger.register(&alice, "read the book").unwrap();
    let err = ledger.register(&alice, "write the book").unwrap_err();
    assert!(matches!(err, LedgerError::RecordExists(id) if id == alice));

    let stored = ledger.objective(&alice).unwrap().unwrap();
    assert_eq!(stored, ObjectiveRecord::new("read the book").unwrap());
}

#[test]
fn modify_overwrites_description_and_completion() {
    let conn = open_db_in_memory().unwrap();
    let ledger = service(&conn, 0);
    let alice = participant("alice");

    ledger.register(&alice, "draft").unwrap();
    ledger.modify(&alice, "final version", true).unwrap();

    let summary = ledger.query(&alice).unwrap();
    assert!(summary.exists);
    assert_eq!(summary.description_length, 13);
    assert!(summary.completed);

    ledger.modify(&alice, "reopened", false).unwrap();
    assert!(!ledger.query(&alice).unwrap().completed);
}

#[test]
fn modify_requires_existing_objective_and_valid_description() {
    let conn = open_db_in_memory().unwrap();
    let ledger = service(&conn, 0);
    let alice = participant("alice");

    let err = ledger.modify(&alice, "anything", true).unwrap_err();
    assert!(matches!(err, LedgerError::EntityMissing(_)));

    ledger.register(&alice, "kept").unwrap();
    let err = ledger.modify(&alice, "", true).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(_)));
    assert_eq!(
        ledger.objective(&alice).unwrap().unwrap().description,
        "kept"
    );
}

#[test]
fn modify_rejects_over_long_description_and_keeps_record() {
    let conn = open_db_in_memory().unwrap();
    let ledger = service(&conn, 0);
    let alice = participant("alice");

    ledger.register(&alice, "kept").unwrap();
    let err = ledger.modify(&alice, &"x".repeat(101), true).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InvalidInput(ValidationError::DescriptionTooLong {
            max: 100,
            actual: 101
        })
    ));
    assert_eq!(
        ledger.query(&alice).unwrap(),
        ObjectiveSummary {
            exists: true,
            description_length: 4,
            completed: false,
        }
    );

    ledger.modify(&alice, &"y".repeat(100), true).unwrap();
    assert_eq!(ledger.query(&alice).unwrap().description_length, 100);
}

#[test]
fn terminate_succeeds_once_then_reports_missing() {
    let conn = open_db_in_memory().unwrap();
    let ledger = service(&conn, 0);
    let alice = participant("alice");

    ledger.register(&alice, "short lived").unwrap();
    ledger.terminate(&alice).unwrap();
    let err = ledger.terminate(&alice).unwrap_err();
    assert!(matches!(err, LedgerError::EntityMissing(_)));

    // Absent -> Active again after termination.
    ledger.register(&alice, "second life").unwrap();
    assert!(ledger.query(&alice).unwrap().exists);
}

#[test]
fn configure_priority_validates_range_and_existence() {
    let conn = open_db_in_memory().unwrap();
    let ledger = service(&conn, 0);
    let alice = participant("alice");

    for weight in [0, 4] {
        let err = ledger.configure_priority(&alice, weight).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidInput(ValidationError::WeightOutOfRange(w)) if w == weight
        ));
    }

    let err = ledger.configure_priority(&alice, 2).unwrap_err();
    assert!(matches!(err, LedgerError::EntityMissing(_)));
    assert!(ledger.priority(&alice).unwrap().is_none());

    ledger.register(&alice, "prioritized").unwrap();
    ledger.configure_priority(&alice, 2).unwrap();
    ledger.configure_priority(&alice, 3).unwrap();
    assert_eq!(
        ledger.priority(&alice).unwrap(),
        Some(PriorityRecord {
            weight: Weight::new(3).unwrap()
        })
    );
}

#[test]
fn establish_deadline_uses_current_counter_value() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLedgerRepository::try_new(&conn).unwrap();
    let counter = ManualCounter::new(1_000);
    let ledger = LedgerService::new(repo, &counter);
    let alice = participant("alice");

    let err = ledger.establish_deadline(&alice, 10).unwrap_err();
    assert!(matches!(err, LedgerError::EntityMissing(_)));

    ledger.register(&alice, "timed").unwrap();
    let err = ledger.establish_deadline(&alice, 0).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InvalidInput(ValidationError::NonPositiveDuration)
    ));

    ledger.establish_deadline(&alice, 10).unwrap();
    assert_eq!(
        ledger.deadline(&alice).unwrap(),
        Some(TemporalRecord {
            deadline: 1_010,
            alert_activated: false
        })
    );

    counter.advance(90);
    ledger.establish_deadline(&alice, 10).unwrap();
    assert_eq!(ledger.deadline(&alice).unwrap().unwrap().deadline, 1_100);
}

#[test]
fn establish_deadline_rejects_overflowing_duration() {
    let conn = open_db_in_memory().unwrap();
    let ledger = service(&conn, 10);
    let alice = participant("alice");

    ledger.register(&alice, "forever").unwrap();
    let err = ledger.establish_deadline(&alice, u64::MAX).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InvalidInput(ValidationError::DeadlineOverflow { current: 10, .. })
    ));
    assert!(ledger.deadline(&alice).unwrap().is_none());
}

#[test]
fn delegate_creates_objective_for_target_regardless_of_caller() {
    let conn = open_db_in_memory().unwrap();
    let ledger = service(&conn, 0);
    let mallory = participant("mallory");
    let bob = participant("bob");

    ledger
        .delegate(&mallory, &bob, "review the design")
        .unwrap();
    let summary = ledger.query(&bob).unwrap();
    assert!(summary.exists);
    assert!(!summary.completed);
    assert!(!ledger.query(&mallory).unwrap().exists);

    let err = ledger.delegate(&mallory, &bob, "another").unwrap_err();
    assert!(matches!(err, LedgerError::RecordExists(id) if id == bob));

    let err = ledger
        .delegate(&mallory, &participant("carol"), "")
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(_)));
}

#[test]
fn delegate_checks_target_not_caller() {
    let conn = open_db_in_memory().unwrap();
    let ledger = service(&conn, 0);
    let alice = participant("alice");
    let bob = participant("bob");

    ledger.register(&alice, "my own goal").unwrap();
    ledger.delegate(&alice, &bob, "your goal").unwrap();
    assert_eq!(
        ledger.objective(&bob).unwrap().unwrap().description,
        "your goal"
    );
}

#[test]
fn alice_scenario_leaves_documented_orphans() {
    let conn = open_db_in_memory().unwrap();
    let ledger = service(&conn, 500);
    let alice = participant("alice");
    let description = "Learn distributed systems";

    ledger.register(&alice, description).unwrap();
    let summary = ledger.query(&alice).unwrap();
    assert!(summary.exists);
    assert_eq!(summary.description_length, 25);
    assert!(!summary.completed);

    ledger.configure_priority(&alice, 2).unwrap();
    ledger.establish_deadline(&alice, 100).unwrap();
    assert_eq!(
        ledger.deadline(&alice).unwrap(),
        Some(TemporalRecord {
            deadline: 600,
            alert_activated: false
        })
    );

    ledger.modify(&alice, description, true).unwrap();
    assert!(ledger.query(&alice).unwrap().completed);

    ledger.terminate(&alice).unwrap();
    assert_eq!(ledger.query(&alice).unwrap(), ObjectiveSummary::absent());

    let snapshot = ledger.snapshot(&alice).unwrap();
    assert!(snapshot.is_orphaned());
    assert_eq!(snapshot.priority.unwrap().weight.get(), 2);
    assert_eq!(snapshot.temporal.unwrap().deadline, 600);
    assert_eq!(ledger.orphaned_participants().unwrap(), vec![alice]);
}

#[test]
fn cascade_policy_removes_auxiliary_records_on_terminate() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLedgerRepository::try_new(&conn).unwrap();
    let config = LedgerConfig {
        termination_policy: TerminationPolicy::Cascade,
        ..LedgerConfig::default()
    };
    let ledger = LedgerService::with_config(repo, ManualCounter::new(500), &config);
    let alice = participant("alice");

    ledger.register(&alice, "clean exit").unwrap();
    ledger.configure_priority(&alice, 1).unwrap();
    ledger.establish_deadline(&alice, 5).unwrap();
    ledger.terminate(&alice).unwrap();

    let snapshot = ledger.snapshot(&alice).unwrap();
    assert!(snapshot.objective.is_none());
    assert!(snapshot.priority.is_none());
    assert!(snapshot.temporal.is_none());
    assert!(!snapshot.is_orphaned());
    assert!(ledger.orphaned_participants().unwrap().is_empty());
}

#[test]
fn re_registration_reuses_orphaned_auxiliary_records() {
    let conn = open_db_in_memory().unwrap();
    let ledger = service(&conn, 0);
    let alice = participant("alice");

    ledger.register(&alice, "first").unwrap();
    ledger.configure_priority(&alice, 3).unwrap();
    ledger.terminate(&alice).unwrap();
    ledger.register(&alice, "second").unwrap();

    let snapshot = ledger.snapshot(&alice).unwrap();
    assert!(!snapshot.is_orphaned());
    assert_eq!(snapshot.priority.unwrap().weight.get(), 3);
}
