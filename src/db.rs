//! Database setup.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{settings::create_user_settings_table, summary::create_transaction_table};

/// Create all of the application's tables.
///
/// The tables are created in a single exclusive transaction, so either all of
/// them exist afterwards or none of the changes are kept.
///
/// # Errors
/// Returns an error if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_transaction_table(&transaction)?;
    create_user_settings_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::initialize;

    fn table_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn creates_tables() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();

        let tables = table_names(&conn);
        assert!(tables.contains(&"transaction".to_owned()));
        assert!(tables.contains(&"user_settings".to_owned()));
    }

    #[test]
    fn can_run_twice() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        assert!(initialize(&conn).is_ok());
    }
}
