//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `ledger_core` linkage with deterministic output.
//! - `demo [config.json]` walks one participant through the full objective
//!   lifecycle on an in-memory ledger and prints each observed state. The
//!   optional JSON file selects the termination policy and log level. Set
//!   `LEDGER_LOG_DIR` (absolute path) to capture core log events.

use ledger_core::db::open_db_in_memory;
use ledger_core::{
    init_logging, LedgerConfig, LedgerService, ManualCounter, ParticipantId, SqliteLedgerRepository,
};
use log::info;
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("ledger_core ping={}", ledger_core::ping());
    println!("ledger_core version={}", ledger_core::core_version());

    let mut args = std::env::args().skip(1);
    if args.next().as_deref() != Some("demo") {
        return ExitCode::SUCCESS;
    }

    match run_demo(args.next()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("demo failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_demo(config_path: Option<String>) -> Result<(), Box<dyn Error>> {
    let config = match config_path {
        Some(path) => LedgerConfig::load(path)?,
        None => LedgerConfig::default(),
    };
    if let Ok(log_dir) = std::env::var("LEDGER_LOG_DIR") {
        init_logging(config.effective_log_level(), &log_dir)?;
    }

    let conn = open_db_in_memory()?;
    let repo = SqliteLedgerRepository::try_new(&conn)?;
    let counter = ManualCounter::new(500);
    let ledger = LedgerService::with_config(repo, &counter, &config);
    let alice = ParticipantId::parse("alice")?;
    let description = "Learn distributed systems";

    info!("event=demo_start module=cli status=start");
    println!("policy: {:?}", ledger.termination_policy());
    println!("register: {}", ledger.register(&alice, description)?);
    println!("query: {:?}", ledger.query(&alice)?);
    println!("priority: {}", ledger.configure_priority(&alice, 2)?);
    println!("deadline: {}", ledger.establish_deadline(&alice, 100)?);
    println!("modify: {}", ledger.modify(&alice, description, true)?);
    println!("terminate: {}", ledger.terminate(&alice)?);
    println!("query: {:?}", ledger.query(&alice)?);
    println!("snapshot: {:?}", ledger.snapshot(&alice)?);
    println!("orphans: {:?}", ledger.orphaned_participants()?);
    info!("event=demo_finish module=cli status=ok");
    Ok(())
}
