//! User format preferences.
//!
//! The preferences are stored as small integer codes in the database and in
//! the JSON API. Unknown codes decode to the default for that field so a bad
//! value can never break formatting.
//!
//! Reads go through [SettingsCache], which keeps the last loaded value for
//! [SETTINGS_STALE_AFTER]. Writes go through [update_user_settings], which is
//! the only place that both saves and invalidates the cache.

use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::Error;

/// The currency used when the user has not chosen one.
pub const DEFAULT_CURRENCY_CODE: &str = "USD";

/// How long cached settings are served before they are loaded again.
pub const SETTINGS_STALE_AFTER: Duration = Duration::minutes(5);

/// Clock style used for times of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum TimeFormat {
    /// `1:05 PM`, code 1.
    #[default]
    TwelveHour,
    /// `13:05`, code 2.
    TwentyFourHour,
}

impl TimeFormat {
    /// All variants in code order.
    pub const ALL: [Self; 2] = [Self::TwelveHour, Self::TwentyFourHour];

    /// The stored code for this variant.
    pub fn code(self) -> u8 {
        match self {
            Self::TwelveHour => 1,
            Self::TwentyFourHour => 2,
        }
    }

    /// A short description for the settings form.
    pub fn label(self) -> &'static str {
        match self {
            Self::TwelveHour => "12-hour (1:05 PM)",
            Self::TwentyFourHour => "24-hour (13:05)",
        }
    }
}

impl From<u8> for TimeFormat {
    fn from(code: u8) -> Self {
        match code {
            2 => Self::TwentyFourHour,
            _ => Self::TwelveHour,
        }
    }
}

impl From<TimeFormat> for u8 {
    fn from(format: TimeFormat) -> Self {
        format.code()
    }
}

/// How many decimal places amounts are shown with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum DecimalFormat {
    /// Whole amounts without decimals, fractional amounts with two, code 1.
    #[default]
    Readable,
    /// Always round to a whole number, code 2.
    Whole,
    /// Always one decimal place, code 3.
    OneDecimal,
    /// Always two decimal places, code 4.
    TwoDecimals,
}

impl DecimalFormat {
    /// All variants in code order.
    pub const ALL: [Self; 4] = [
        Self::Readable,
        Self::Whole,
        Self::OneDecimal,
        Self::TwoDecimals,
    ];

    /// The stored code for this variant.
    pub fn code(self) -> u8 {
        match self {
            Self::Readable => 1,
            Self::Whole => 2,
            Self::OneDecimal => 3,
            Self::TwoDecimals => 4,
        }
    }

    /// A short description for the settings form.
    pub fn label(self) -> &'static str {
        match self {
            Self::Readable => "Automatic (1,234 or 1,234.50)",
            Self::Whole => "No decimals (1,235)",
            Self::OneDecimal => "One decimal (1,234.5)",
            Self::TwoDecimals => "Two decimals (1,234.50)",
        }
    }
}

impl From<u8> for DecimalFormat {
    fn from(code: u8) -> Self {
        match code {
            2 => Self::Whole,
            3 => Self::OneDecimal,
            4 => Self::TwoDecimals,
            _ => Self::Readable,
        }
    }
}

impl From<DecimalFormat> for u8 {
    fn from(format: DecimalFormat) -> Self {
        format.code()
    }
}

/// How the digits of the whole part of an amount are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum NumberFormat {
    /// Thousands grouping, `1,234,567`, code 1.
    #[default]
    Western,
    /// Lakh/crore grouping from one lakh upwards, `12,34,567`, code 2.
    Lakh,
    /// No grouping, `1234567`, code 3.
    Plain,
}

impl NumberFormat {
    /// All variants in code order.
    pub const ALL: [Self; 3] = [Self::Western, Self::Lakh, Self::Plain];

    /// The stored code for this variant.
    pub fn code(self) -> u8 {
        match self {
            Self::Western => 1,
            Self::Lakh => 2,
            Self::Plain => 3,
        }
    }

    /// A short description for the settings form.
    pub fn label(self) -> &'static str {
        match self {
            Self::Western => "1,234,567",
            Self::Lakh => "12,34,567",
            Self::Plain => "1234567",
        }
    }
}

impl From<u8> for NumberFormat {
    fn from(code: u8) -> Self {
        match code {
            2 => Self::Lakh,
            3 => Self::Plain,
            _ => Self::Western,
        }
    }
}

impl From<NumberFormat> for u8 {
    fn from(format: NumberFormat) -> Self {
        format.code()
    }
}

/// The user's display preferences for amounts and times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFormatSettings {
    /// Clock style, code 1 or 2.
    #[serde(default)]
    pub time_format: TimeFormat,
    /// Decimal places policy, codes 1 to 4.
    #[serde(default)]
    pub decimal_format: DecimalFormat,
    /// Digit grouping policy, codes 1 to 3.
    #[serde(default)]
    pub number_format: NumberFormat,
    /// An ISO 4217 style currency code such as "USD" or "INR".
    #[serde(default = "default_currency_code")]
    pub currency_code: String,
}

fn default_currency_code() -> String {
    DEFAULT_CURRENCY_CODE.to_owned()
}

impl Default for UserFormatSettings {
    fn default() -> Self {
        Self {
            time_format: TimeFormat::default(),
            decimal_format: DecimalFormat::default(),
            number_format: NumberFormat::default(),
            currency_code: default_currency_code(),
        }
    }
}

impl UserFormatSettings {
    /// Trim and upper-case the currency code, falling back to
    /// [DEFAULT_CURRENCY_CODE] when it is blank.
    pub fn normalized(self) -> Self {
        let currency_code = self.currency_code.trim().to_ascii_uppercase();
        let currency_code = if currency_code.is_empty() {
            default_currency_code()
        } else {
            currency_code
        };

        Self {
            currency_code,
            ..self
        }
    }
}

/// Create the table that stores the user's format settings.
///
/// The table holds at most one row.
pub fn create_user_settings_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user_settings (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            time_format INTEGER NOT NULL,
            decimal_format INTEGER NOT NULL,
            number_format INTEGER NOT NULL,
            currency_code TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Get the saved settings, or `None` if the user has never saved any.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_user_settings(connection: &Connection) -> Result<Option<UserFormatSettings>, Error> {
    let settings = connection
        .query_row(
            "SELECT time_format, decimal_format, number_format, currency_code
            FROM user_settings WHERE id = 1",
            (),
            |row| {
                Ok(UserFormatSettings {
                    time_format: TimeFormat::from(row.get::<_, u8>(0)?),
                    decimal_format: DecimalFormat::from(row.get::<_, u8>(1)?),
                    number_format: NumberFormat::from(row.get::<_, u8>(2)?),
                    currency_code: row.get(3)?,
                })
            },
        )
        .optional()?;

    Ok(settings)
}

/// Save `settings`, replacing any previously saved settings.
///
/// Callers that serve cached settings should use [update_user_settings]
/// instead so the cache is invalidated.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn save_user_settings(
    settings: &UserFormatSettings,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO user_settings (id, time_format, decimal_format, number_format, currency_code)
        VALUES (1, ?1, ?2, ?3, ?4)
        ON CONFLICT(id) DO UPDATE SET
            time_format = excluded.time_format,
            decimal_format = excluded.decimal_format,
            number_format = excluded.number_format,
            currency_code = excluded.currency_code",
        (
            settings.time_format.code(),
            settings.decimal_format.code(),
            settings.number_format.code(),
            &settings.currency_code,
        ),
    )?;

    Ok(())
}

/// Save `settings` and drop the cached copy so the next read sees them.
///
/// # Errors
/// Returns [Error::SqlError] if the settings could not be saved. The cache is
/// left untouched in that case.
pub fn update_user_settings(
    settings: &UserFormatSettings,
    cache: &SettingsCache,
    connection: &Connection,
) -> Result<(), Error> {
    save_user_settings(settings, connection)?;
    cache.invalidate();
    tracing::info!("Updated user format settings: {settings:?}");

    Ok(())
}

/// Load the settings through `cache`, reading the database only when the
/// cached copy is missing or stale.
///
/// # Errors
/// Returns an error if the cache lock is poisoned or the query fails.
pub fn load_user_settings(
    cache: &SettingsCache,
    connection: &Connection,
    now: OffsetDateTime,
) -> Result<UserFormatSettings, Error> {
    cache.get_or_load(now, || get_user_settings(connection))
}

#[derive(Debug, Clone)]
struct CachedSettings {
    settings: UserFormatSettings,
    fetched_at: OffsetDateTime,
}

/// An in-memory copy of the user's settings with a staleness window.
#[derive(Debug)]
pub struct SettingsCache {
    stale_after: Duration,
    entry: Mutex<Option<CachedSettings>>,
}

impl Default for SettingsCache {
    fn default() -> Self {
        Self::new(SETTINGS_STALE_AFTER)
    }
}

impl SettingsCache {
    /// Create an empty cache whose entries are reloaded after `stale_after`.
    pub fn new(stale_after: Duration) -> Self {
        Self {
            stale_after,
            entry: Mutex::new(None),
        }
    }

    /// Return the cached settings if they are fresh at `now`, otherwise call
    /// `load` and cache its result.
    ///
    /// When `load` returns `None` the defaults are cached and returned.
    ///
    /// # Errors
    /// Returns [Error::CacheLockError] if the lock is poisoned, or the error
    /// from `load`.
    pub fn get_or_load<F>(&self, now: OffsetDateTime, load: F) -> Result<UserFormatSettings, Error>
    where
        F: FnOnce() -> Result<Option<UserFormatSettings>, Error>,
    {
        let mut entry = self
            .entry
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire settings cache lock: {error}"))
            .map_err(|_| Error::CacheLockError)?;

        if let Some(cached) = entry.as_ref() {
            if now - cached.fetched_at < self.stale_after {
                return Ok(cached.settings.clone());
            }
        }

        let settings = load()?.unwrap_or_default();
        tracing::debug!("Loaded user format settings: {settings:?}");
        *entry = Some(CachedSettings {
            settings: settings.clone(),
            fetched_at: now,
        });

        Ok(settings)
    }

    /// Forget the cached settings.
    pub fn invalidate(&self) {
        match self.entry.lock() {
            Ok(mut entry) => *entry = None,
            Err(error) => tracing::error!("could not invalidate settings cache: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use rusqlite::Connection;
    use time::{Duration, macros::datetime};

    use crate::db::initialize;

    use super::{
        DecimalFormat, NumberFormat, SettingsCache, TimeFormat, UserFormatSettings,
        get_user_settings, load_user_settings, save_user_settings, update_user_settings,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn indian_settings() -> UserFormatSettings {
        UserFormatSettings {
            time_format: TimeFormat::TwentyFourHour,
            decimal_format: DecimalFormat::TwoDecimals,
            number_format: NumberFormat::Lakh,
            currency_code: "INR".to_owned(),
        }
    }

    #[test]
    fn unknown_codes_fall_back_to_defaults() {
        assert_eq!(TimeFormat::from(0), TimeFormat::TwelveHour);
        assert_eq!(TimeFormat::from(7), TimeFormat::TwelveHour);
        assert_eq!(DecimalFormat::from(5), DecimalFormat::Readable);
        assert_eq!(NumberFormat::from(9), NumberFormat::Western);
    }

    #[test]
    fn codes_match_variants() {
        for format in TimeFormat::ALL {
            assert_eq!(TimeFormat::from(format.code()), format);
        }
        for format in DecimalFormat::ALL {
            assert_eq!(DecimalFormat::from(format.code()), format);
        }
        for format in NumberFormat::ALL {
            assert_eq!(NumberFormat::from(format.code()), format);
        }
    }

    #[test]
    fn deserializes_codes_from_json() {
        let json = r#"{"timeFormat":2,"decimalFormat":3,"numberFormat":2,"currencyCode":"INR"}"#;

        let settings: UserFormatSettings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.time_format, TimeFormat::TwentyFourHour);
        assert_eq!(settings.decimal_format, DecimalFormat::OneDecimal);
        assert_eq!(settings.number_format, NumberFormat::Lakh);
        assert_eq!(settings.currency_code, "INR");
    }

    #[test]
    fn missing_json_fields_use_defaults() {
        let settings: UserFormatSettings = serde_json::from_str("{}").unwrap();

        assert_eq!(settings, UserFormatSettings::default());
        assert_eq!(settings.currency_code, "USD");
    }

    #[test]
    fn serializes_codes_as_numbers() {
        let json = serde_json::to_value(indian_settings()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "timeFormat": 2,
                "decimalFormat": 4,
                "numberFormat": 2,
                "currencyCode": "INR",
            })
        );
    }

    #[test]
    fn normalized_cleans_currency_code() {
        let settings = UserFormatSettings {
            currency_code: "  inr ".to_owned(),
            ..Default::default()
        };
        assert_eq!(settings.normalized().currency_code, "INR");

        let settings = UserFormatSettings {
            currency_code: "   ".to_owned(),
            ..Default::default()
        };
        assert_eq!(settings.normalized().currency_code, "USD");
    }

    #[test]
    fn get_returns_none_before_first_save() {
        let conn = get_test_connection();

        assert_eq!(get_user_settings(&conn).unwrap(), None);
    }

    #[test]
    fn save_then_get_returns_saved_settings() {
        let conn = get_test_connection();

        save_user_settings(&indian_settings(), &conn).unwrap();

        assert_eq!(get_user_settings(&conn).unwrap(), Some(indian_settings()));
    }

    #[test]
    fn save_replaces_existing_settings() {
        let conn = get_test_connection();
        save_user_settings(&indian_settings(), &conn).unwrap();

        save_user_settings(&UserFormatSettings::default(), &conn).unwrap();

        assert_eq!(
            get_user_settings(&conn).unwrap(),
            Some(UserFormatSettings::default())
        );
        let row_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM user_settings", (), |row| row.get(0))
            .unwrap();
        assert_eq!(row_count, 1);
    }

    #[test]
    fn cache_serves_fresh_entry_without_loading() {
        let cache = SettingsCache::default();
        let now = datetime!(2024-02-14 09:00 UTC);
        let load_count = Cell::new(0);
        let load = || {
            load_count.set(load_count.get() + 1);
            Ok(Some(indian_settings()))
        };

        let first = cache.get_or_load(now, load).unwrap();
        let second = cache
            .get_or_load(now + Duration::minutes(4), || {
                load_count.set(load_count.get() + 1);
                Ok(None)
            })
            .unwrap();

        assert_eq!(first, indian_settings());
        assert_eq!(second, indian_settings());
        assert_eq!(load_count.get(), 1);
    }

    #[test]
    fn cache_reloads_stale_entry() {
        let cache = SettingsCache::default();
        let now = datetime!(2024-02-14 09:00 UTC);
        cache.get_or_load(now, || Ok(Some(indian_settings()))).unwrap();

        let settings = cache
            .get_or_load(now + Duration::minutes(5), || Ok(None))
            .unwrap();

        assert_eq!(settings, UserFormatSettings::default());
    }

    #[test]
    fn update_invalidates_cache() {
        let conn = get_test_connection();
        let cache = SettingsCache::default();
        let now = datetime!(2024-02-14 09:00 UTC);
        assert_eq!(
            load_user_settings(&cache, &conn, now).unwrap(),
            UserFormatSettings::default()
        );

        update_user_settings(&indian_settings(), &cache, &conn).unwrap();

        assert_eq!(
            load_user_settings(&cache, &conn, now + Duration::seconds(1)).unwrap(),
            indian_settings()
        );
    }

    #[test]
    fn load_error_is_not_cached() {
        let cache = SettingsCache::default();
        let now = datetime!(2024-02-14 09:00 UTC);

        let result = cache.get_or_load(now, || Err(crate::Error::NotFound));

        assert_eq!(result, Err(crate::Error::NotFound));
        assert_eq!(
            cache.get_or_load(now, || Ok(Some(indian_settings()))).unwrap(),
            indian_settings()
        );
    }
}
