use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime, Time};

use expense_trace::{
    initialize_db,
    settings::{UserFormatSettings, save_user_settings},
    summary::{Transaction, create_transaction},
};

/// A utility for creating a test database for ExpenseTrace.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// How many days of sample transactions to create, counting back from today.
    #[arg(long, default_value_t = 90)]
    days: u16,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating sample transactions...");

    let today = OffsetDateTime::now_utc().date();
    let mut count = 0;

    for days_ago in 0..i64::from(args.days) {
        let date = today - Duration::days(days_ago);

        if date.day() == 1 {
            create_transaction(Transaction::build(4200.0, date, "Salary"), &conn)?;
            create_transaction(Transaction::build(-1650.0, date, "Rent"), &conn)?;
            count += 2;
        }

        // A coffee on weekdays at a time that drifts through the morning.
        if date.weekday().number_from_monday() <= 5 {
            let minute = (days_ago % 60) as u8;
            create_transaction(
                Transaction::build(-4.5, date, "Coffee").time(Time::from_hms(8, minute, 0).ok()),
                &conn,
            )?;
            count += 1;
        }

        if days_ago % 7 == 3 {
            create_transaction(Transaction::build(-132.75, date, "Groceries"), &conn)?;
            count += 1;
        }
    }

    save_user_settings(&UserFormatSettings::default(), &conn)?;

    println!("Created {count} transactions.");
    println!("Success!");

    Ok(())
}
