//! Step through days one at a time and keep the day view's URL in sync.

use serde::{Deserialize, Serialize};
use time::{Date, Month};

/// The day view's query parameters as decimal integer strings.
///
/// The fields are strings so that a bad value can fall back to today's value
/// instead of rejecting the whole request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayQuery {
    /// Day of the month.
    pub day: Option<String>,
    /// Month, 1 to 12.
    pub month: Option<String>,
    /// Year.
    pub year: Option<String>,
}

/// A `(day, month, year)` triple that moves one calendar day at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayNavigator {
    date: Date,
}

impl DayNavigator {
    /// Start at `date`.
    pub fn at(date: Date) -> Self {
        Self { date }
    }

    /// Read the triple from `query`.
    ///
    /// Each missing or invalid field takes the value of the same field of
    /// `today`. If the fields do not form a real date, e.g. 31 February, the
    /// navigator starts at `today`.
    pub fn from_query(query: &DayQuery, today: Date) -> Self {
        let day = parse_field(query.day.as_deref())
            .filter(|day| (1..=31).contains(day))
            .unwrap_or(today.day());
        let month = parse_field::<u8>(query.month.as_deref())
            .and_then(|month| Month::try_from(month).ok())
            .unwrap_or(today.month());
        let year = parse_field(query.year.as_deref()).unwrap_or(today.year());

        match Date::from_calendar_date(year, month, day) {
            Ok(date) => Self { date },
            Err(error) => {
                tracing::debug!("Invalid day query {query:?}, using today: {error}");
                Self { date: today }
            }
        }
    }

    /// Move forward one day. Does nothing on the last representable date.
    pub fn next(&mut self) {
        if let Some(date) = self.date.next_day() {
            self.date = date;
        }
    }

    /// Move back one day. Does nothing on the first representable date.
    pub fn prev(&mut self) {
        if let Some(date) = self.date.previous_day() {
            self.date = date;
        }
    }

    /// The current date.
    pub fn date(self) -> Date {
        self.date
    }

    /// The day of the month.
    pub fn day(self) -> u8 {
        self.date.day()
    }

    /// The month, 1 to 12.
    pub fn month(self) -> u8 {
        u8::from(self.date.month())
    }

    /// The year.
    pub fn year(self) -> i32 {
        self.date.year()
    }

    /// The canonical query for the current date.
    pub fn to_query(self) -> DayQuery {
        DayQuery {
            day: Some(self.day().to_string()),
            month: Some(self.month().to_string()),
            year: Some(self.year().to_string()),
        }
    }

    /// The canonical query string, e.g. `day=31&month=12&year=2023`.
    pub fn to_query_string(self) -> String {
        serde_urlencoded::to_string(self.to_query()).unwrap_or_else(|error| {
            tracing::error!("Could not encode day query for {}: {error}", self.date);
            String::new()
        })
    }

    /// `route` with the canonical query string appended.
    pub fn url(self, route: &str) -> String {
        format!("{route}?{}", self.to_query_string())
    }
}

fn parse_field<T: std::str::FromStr>(field: Option<&str>) -> Option<T> {
    field?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::{DayNavigator, DayQuery};

    const TODAY: time::Date = date!(2024 - 02 - 14);

    fn query(day: &str, month: &str, year: &str) -> DayQuery {
        DayQuery {
            day: Some(day.to_owned()),
            month: Some(month.to_owned()),
            year: Some(year.to_owned()),
        }
    }

    #[test]
    fn next_crosses_year_boundary() {
        let mut navigator = DayNavigator::at(date!(2023 - 12 - 31));

        navigator.next();

        assert_eq!(
            (navigator.day(), navigator.month(), navigator.year()),
            (1, 1, 2024)
        );
    }

    #[test]
    fn prev_crosses_year_boundary() {
        let mut navigator = DayNavigator::at(date!(2024 - 01 - 01));

        navigator.prev();

        assert_eq!(navigator.date(), date!(2023 - 12 - 31));
    }

    #[test]
    fn steps_through_leap_day() {
        let mut navigator = DayNavigator::at(date!(2024 - 02 - 28));

        navigator.next();
        assert_eq!(navigator.date(), date!(2024 - 02 - 29));

        navigator.next();
        assert_eq!(navigator.date(), date!(2024 - 03 - 01));

        navigator.prev();
        navigator.prev();
        assert_eq!(navigator.date(), date!(2024 - 02 - 28));
    }

    #[test]
    fn stepping_past_representable_range_does_nothing() {
        let mut last = DayNavigator::at(time::Date::MAX);
        let mut first = DayNavigator::at(time::Date::MIN);

        last.next();
        first.prev();

        assert_eq!(last.date(), time::Date::MAX);
        assert_eq!(first.date(), time::Date::MIN);
    }

    #[test]
    fn reads_complete_query() {
        let navigator = DayNavigator::from_query(&query("31", "12", "2023"), TODAY);

        assert_eq!(navigator.date(), date!(2023 - 12 - 31));
    }

    #[test]
    fn missing_fields_use_today() {
        let navigator = DayNavigator::from_query(&DayQuery::default(), TODAY);
        assert_eq!(navigator.date(), TODAY);

        let only_day = DayQuery {
            day: Some("3".to_owned()),
            ..Default::default()
        };
        let navigator = DayNavigator::from_query(&only_day, TODAY);
        assert_eq!(navigator.date(), date!(2024 - 02 - 03));
    }

    #[test]
    fn invalid_fields_use_today() {
        let navigator = DayNavigator::from_query(&query("abc", "13", "2023"), TODAY);

        assert_eq!(navigator.date(), date!(2023 - 02 - 14));
    }

    #[test]
    fn impossible_date_uses_today() {
        let navigator = DayNavigator::from_query(&query("31", "2", "2023"), TODAY);

        assert_eq!(navigator.date(), TODAY);
    }

    #[test]
    fn url_is_canonical() {
        let navigator = DayNavigator::from_query(&query("05", "01", "2024"), TODAY);

        assert_eq!(navigator.to_query_string(), "day=5&month=1&year=2024");
        assert_eq!(navigator.url("/day"), "/day?day=5&month=1&year=2024");
        assert_eq!(navigator.to_query(), query("5", "1", "2024"));
    }
}
