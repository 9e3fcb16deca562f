//! Transactions and the per-day and per-period totals derived from them.

use std::collections::HashMap;

use rusqlite::{Connection, Row};
use serde::Serialize;
use time::{Date, Time};

use crate::{Error, calendar::CalendarMonth, database_id::DatabaseId, period::DateRange};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income recorded on a particular day.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// Positive for income, negative for expenses.
    pub amount: f64,
    /// The day the transaction happened.
    pub date: Date,
    /// The time of day, if one was recorded.
    pub time: Option<Time>,
    /// What the transaction was for.
    pub description: String,
}

impl Transaction {
    /// Start building a new transaction.
    pub fn build(amount: f64, date: Date, description: &str) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            date,
            time: None,
            description: description.to_owned(),
        }
    }
}

/// A transaction that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    /// Positive for income, negative for expenses.
    pub amount: f64,
    /// The day the transaction happened.
    pub date: Date,
    /// The time of day, if known.
    pub time: Option<Time>,
    /// What the transaction was for.
    pub description: String,
}

impl TransactionBuilder {
    /// Set the time of day.
    pub fn time(mut self, time: Option<Time>) -> Self {
        self.time = time;
        self
    }
}

/// Income, expenses and transactions for one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DaySummary {
    /// Sum of positive amounts.
    pub income: f64,
    /// Sum of negative amounts as a positive number.
    pub expense: f64,
    /// The day's transactions, timed ones first in time order.
    pub transactions: Vec<Transaction>,
}

impl DaySummary {
    /// Income minus expenses.
    pub fn net(&self) -> f64 {
        self.income - self.expense
    }

    fn add(&mut self, transaction: Transaction) {
        if transaction.amount > 0.0 {
            self.income += transaction.amount;
        } else {
            self.expense -= transaction.amount;
        }

        self.transactions.push(transaction);
    }
}

/// Totals over a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PeriodTotals {
    /// Sum of positive amounts.
    pub income: f64,
    /// Sum of negative amounts as a positive number.
    pub expense: f64,
    /// Number of transactions in the period.
    pub transaction_count: u32,
}

impl PeriodTotals {
    /// Income minus expenses.
    pub fn net(&self) -> f64 {
        self.income - self.expense
    }

    /// The share of income that was not spent, as a percentage.
    ///
    /// Returns `None` when there was no income.
    pub fn savings_rate(&self) -> Option<f64> {
        (self.income > 0.0).then(|| self.net() / self.income * 100.0)
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                time TEXT,
                description TEXT NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date ON \"transaction\"(date);",
        (),
    )?;

    Ok(())
}

/// Save a new transaction.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (amount, date, time, description)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, amount, date, time, description",
        )?
        .query_row(
            (
                builder.amount,
                builder.date,
                builder.time,
                builder.description,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Get the summary of every day in `calendar_month` that has transactions,
/// keyed by day of the month.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_day_summaries(
    calendar_month: CalendarMonth,
    connection: &Connection,
) -> Result<HashMap<u8, DaySummary>, Error> {
    let range = calendar_month.date_range();
    let transactions = connection
        .prepare(
            "SELECT id, amount, date, time, description FROM \"transaction\"
             WHERE date BETWEEN ?1 AND ?2
             ORDER BY date, time IS NULL, time, id",
        )?
        .query_map((range.start, range.end), map_transaction_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut summaries: HashMap<u8, DaySummary> = HashMap::new();
    for transaction in transactions {
        summaries
            .entry(transaction.date.day())
            .or_default()
            .add(transaction);
    }

    Ok(summaries)
}

/// Get the summary for `date`. Days without transactions have zero totals.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_day_summary(date: Date, connection: &Connection) -> Result<DaySummary, Error> {
    let transactions = connection
        .prepare(
            "SELECT id, amount, date, time, description FROM \"transaction\"
             WHERE date = ?1
             ORDER BY time IS NULL, time, id",
        )?
        .query_map([date], map_transaction_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut summary = DaySummary::default();
    transactions
        .into_iter()
        .for_each(|transaction| summary.add(transaction));

    Ok(summary)
}

/// Get the totals for the dates in `date_range`, or for all transactions
/// when `date_range` is `None`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_period_totals(
    date_range: Option<DateRange>,
    connection: &Connection,
) -> Result<PeriodTotals, Error> {
    const TOTALS: &str = "SELECT
            COALESCE(SUM(CASE WHEN amount > 0 THEN amount END), 0.0),
            COALESCE(SUM(CASE WHEN amount < 0 THEN -amount END), 0.0),
            COUNT(id)
        FROM \"transaction\"";

    let totals = match date_range {
        Some(range) => connection.query_row(
            &format!("{TOTALS} WHERE date BETWEEN ?1 AND ?2"),
            (range.start, range.end),
            map_totals_row,
        )?,
        None => connection.query_row(TOTALS, (), map_totals_row)?,
    };

    Ok(totals)
}

/// Get the earliest and latest transaction dates, or `None` if there are no
/// transactions.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_transaction_date_bounds(connection: &Connection) -> Result<Option<DateRange>, Error> {
    let (min_date, max_date): (Option<Date>, Option<Date>) = connection.query_row(
        "SELECT MIN(date), MAX(date) FROM \"transaction\"",
        (),
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    match (min_date, max_date) {
        (Some(start), Some(end)) => Ok(Some(DateRange { start, end })),
        _ => Ok(None),
    }
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        amount: row.get(1)?,
        date: row.get(2)?,
        time: row.get(3)?,
        description: row.get(4)?,
    })
}

fn map_totals_row(row: &Row) -> Result<PeriodTotals, rusqlite::Error> {
    Ok(PeriodTotals {
        income: row.get(0)?,
        expense: row.get(1)?,
        transaction_count: row.get(2)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
