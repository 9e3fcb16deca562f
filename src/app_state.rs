//! Implements a struct that holds the state of the server.

use std::sync::{Arc, Mutex};

use clap::ValueEnum;
use rusqlite::Connection;
use time::Time;

use crate::{
    Error, db::initialize, format::MissingTime, settings::SettingsCache,
    timezone::get_local_offset,
};

/// What to show for transactions that were saved without a time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MissingTimePolicy {
    /// Show only the date.
    #[default]
    Omit,
    /// Show the current local time next to the date.
    Now,
}

impl MissingTimePolicy {
    /// The formatter setting for this policy, given the current local time.
    pub fn missing_time(self, now: Time) -> MissingTime {
        match self {
            Self::Omit => MissingTime::Omit,
            Self::Now => MissingTime::Clock(now),
        }
    }
}

/// The state of the server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The user's format settings, shared by every page.
    pub settings_cache: Arc<SettingsCache>,

    /// What to show for transactions without a time of day.
    pub missing_time: MissingTimePolicy,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if `local_timezone` is not a known
    /// timezone, or an SQL error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        local_timezone: &str,
        missing_time: MissingTimePolicy,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            local_timezone: local_timezone.to_owned(),
            settings_cache: Arc::new(SettingsCache::default()),
            missing_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::time;

    use crate::{Error, format::MissingTime};

    use super::{AppState, MissingTimePolicy};

    #[test]
    fn new_initializes_database() {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "Etc/UTC",
            MissingTimePolicy::Omit,
        )
        .unwrap();

        let connection = state.db_connection.lock().unwrap();
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM \"transaction\"", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn new_rejects_unknown_timezone() {
        let result = AppState::new(
            Connection::open_in_memory().unwrap(),
            "Middle/Earth",
            MissingTimePolicy::Omit,
        );

        assert_eq!(
            result.map(|_| ()),
            Err(Error::InvalidTimezoneError("Middle/Earth".to_owned()))
        );
    }

    #[test]
    fn policy_maps_to_missing_time() {
        let now = time!(10:30);

        assert_eq!(MissingTimePolicy::Omit.missing_time(now), MissingTime::Omit);
        assert_eq!(
            MissingTimePolicy::Now.missing_time(now),
            MissingTime::Clock(now)
        );
    }
}
