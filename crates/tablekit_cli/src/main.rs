//! Demonstration entry point for `tablekit_core`.
//!
//! # Responsibility
//! - Run the `employees` walkthrough (insert, update, list, delete) against a
//!   store file given as the first argument.
//! - Keep output deterministic for quick local sanity checks.

use log::info;
use std::process::ExitCode;
use tablekit_core::{
    default_log_level, init_logging, Assignments, Field, Filter, Record, RepoResult,
    SqliteTableAccessor, TableAccessor,
};

const DEFAULT_DB_PATH: &str = "tablekit_demo.sqlite3";
const DEMO_TABLE: &str = "employees";

fn main() -> ExitCode {
    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

    let log_dir = std::env::temp_dir().join("tablekit").join("logs");
    if let Err(err) = init_logging(default_log_level(), &log_dir.to_string_lossy()) {
        eprintln!("logging disabled: {err}");
    }

    println!("tablekit_core version={}", tablekit_core::core_version());
    match run_demo(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_demo(db_path: &str) -> RepoResult<()> {
    let table = SqliteTableAccessor::<Record>::open(db_path, DEMO_TABLE)?;

    table.add_records(&[
        Record::new("Margot", "margotcat@xmpl.com"),
        Record::new("Tamir", "tamirdog@xmpl.com"),
    ])?;
    table.update_records(
        &Filter::eq(Field::Name, "Margot"),
        &Assignments::new().set(Field::Email, "margotcat_nn@xmpl.com"),
    )?;
    print_records(&table)?;

    table.delete_records(&Filter::eq(Field::Name, "Margot"))?;
    table.delete_records(&Filter::eq(Field::Name, "Tamir"))?;

    println!();
    print_records(&table)?;

    info!("event=demo_finished module=cli status=ok table={DEMO_TABLE}");
    Ok(())
}

fn print_records(table: &SqliteTableAccessor<Record>) -> RepoResult<()> {
    for record in table.get_records(&Filter::All)? {
        println!("{record:?}");
    }
    Ok(())
}
