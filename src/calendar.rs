//! Month grids for the calendar page.
//!
//! A grid starts on a Sunday: the first row is padded with empty cells up to
//! the weekday of the first of the month, then there is one cell per day.

use std::{collections::HashMap, slice::Chunks};

use time::{Date, Duration, Month};

use crate::{endpoints, period::DateRange, summary::DaySummary};

/// Number of cells in one row of the grid.
pub const DAYS_PER_WEEK: usize = 7;

/// Which way to move through time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    /// Backwards, towards earlier dates.
    Prev,
    /// Forwards, towards later dates.
    Next,
}

/// Move one month in `direction`, rolling the year over between December and
/// January.
pub fn navigate_month(month: Month, year: i32, direction: NavDirection) -> (Month, i32) {
    match (direction, month) {
        (NavDirection::Prev, Month::January) => (Month::December, year.saturating_sub(1)),
        (NavDirection::Next, Month::December) => (Month::January, year.saturating_add(1)),
        (NavDirection::Prev, month) => (month.previous(), year),
        (NavDirection::Next, month) => (month.next(), year),
    }
}

/// A month of a particular year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarMonth {
    first_day: Date,
}

impl CalendarMonth {
    /// The month `month` of `year`, or `None` if the year cannot be
    /// represented.
    pub fn new(month: Month, year: i32) -> Option<Self> {
        Date::from_calendar_date(year, month, 1)
            .ok()
            .map(|first_day| Self { first_day })
    }

    /// The month that contains `date`.
    pub fn from_date(date: Date) -> Self {
        Self {
            first_day: date - Duration::days(i64::from(date.day()) - 1),
        }
    }

    /// The month of the year.
    pub fn month(self) -> Month {
        self.first_day.month()
    }

    /// The year.
    pub fn year(self) -> i32 {
        self.first_day.year()
    }

    /// The first day of the month.
    pub fn first_day(self) -> Date {
        self.first_day
    }

    /// The last day of the month.
    pub fn last_day(self) -> Date {
        self.first_day
            .saturating_add(Duration::days(i64::from(self.days_in_month()) - 1))
    }

    /// The number of days in the month, found as the day before the first of
    /// the next month.
    pub fn days_in_month(self) -> u8 {
        match self.navigate(NavDirection::Next) {
            Some(next) => next.first_day.previous_day().map_or(31, |date| date.day()),
            // Only December of the last representable year ends up here.
            None => 31,
        }
    }

    /// The weekday of the first of the month, 0 for Sunday to 6 for Saturday.
    pub fn first_weekday(self) -> u8 {
        self.first_day.weekday().number_days_from_sunday()
    }

    /// The adjacent month in `direction`, or `None` past the representable
    /// range.
    pub fn navigate(self, direction: NavDirection) -> Option<Self> {
        let (month, year) = navigate_month(self.month(), self.year(), direction);

        Self::new(month, year)
    }

    /// Whether `date` falls in this month.
    pub fn contains(self, date: Date) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// The inclusive range of dates in this month.
    pub fn date_range(self) -> DateRange {
        DateRange {
            start: self.first_day,
            end: self.last_day(),
        }
    }

    /// The month name and year, e.g. "January 2024".
    pub fn label(self) -> String {
        format!("{} {}", self.month(), self.year())
    }

    /// The query string that selects this month on the calendar page.
    pub fn to_query_string(self) -> String {
        format!("month={}&year={}", u8::from(self.month()), self.year())
    }
}

/// One cell of a month grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarCell {
    /// The day of the month, or `None` for leading padding.
    pub day: Option<u8>,
    /// Whether any income or expense was recorded on this day.
    pub has_data: bool,
    /// Total income for the day.
    pub income: f64,
    /// Total expenses for the day as a positive number.
    pub expense: f64,
    /// Whether this cell is the current date.
    pub is_today: bool,
}

impl CalendarCell {
    fn padding() -> Self {
        Self {
            day: None,
            has_data: false,
            income: 0.0,
            expense: 0.0,
            is_today: false,
        }
    }
}

/// A request to open the day view for a date picked on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayIntent {
    /// The day of the month.
    pub day: u8,
    /// The month, 1 to 12.
    pub month: u8,
    /// The year.
    pub year: i32,
}

impl DayIntent {
    /// The URL of the day view for this date.
    pub fn url(self) -> String {
        format!(
            "{}?day={}&month={}&year={}",
            endpoints::DAY_VIEW,
            self.day,
            self.month,
            self.year
        )
    }
}

/// The cells of one month, laid out in rows starting on Sunday.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthGrid {
    month: CalendarMonth,
    cells: Vec<CalendarCell>,
}

impl MonthGrid {
    /// The month shown by the grid.
    pub fn month(&self) -> CalendarMonth {
        self.month
    }

    /// All cells in order, padding first.
    pub fn cells(&self) -> &[CalendarCell] {
        &self.cells
    }

    /// The cells in rows of seven. The last row may be shorter.
    pub fn weeks(&self) -> Chunks<'_, CalendarCell> {
        self.cells.chunks(DAYS_PER_WEEK)
    }

    /// The day view request for `cell`, or `None` for padding cells.
    pub fn day_intent(&self, cell: &CalendarCell) -> Option<DayIntent> {
        cell.day.map(|day| DayIntent {
            day,
            month: u8::from(self.month.month()),
            year: self.month.year(),
        })
    }
}

/// Build the grid for `calendar_month`.
///
/// `day_summaries` is keyed by day of the month. Days without a summary have
/// zero income and expense. `today` marks the current date's cell.
pub fn build_month_grid(
    calendar_month: CalendarMonth,
    day_summaries: &HashMap<u8, DaySummary>,
    today: Date,
) -> MonthGrid {
    let leading = usize::from(calendar_month.first_weekday());
    let days_in_month = calendar_month.days_in_month();
    let today_in_month = calendar_month.contains(today).then(|| today.day());

    let mut cells = Vec::with_capacity(leading + usize::from(days_in_month));
    cells.extend((0..leading).map(|_| CalendarCell::padding()));
    cells.extend((1..=days_in_month).map(|day| {
        let (income, expense) = day_summaries
            .get(&day)
            .map_or((0.0, 0.0), |summary| (summary.income, summary.expense));

        CalendarCell {
            day: Some(day),
            has_data: income > 0.0 || expense > 0.0,
            income,
            expense,
            is_today: today_in_month == Some(day),
        }
    }));

    MonthGrid {
        month: calendar_month,
        cells,
    }
}
