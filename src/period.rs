//! Analysis periods and the canonical query parameters that select them.
//!
//! [resolve_period] turns the analysis page's tab and navigation state into
//! [QueryParams]. It never fails: any state it cannot make sense of resolves
//! to the current month.

use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month, macros::format_description};

use crate::calendar::{CalendarMonth, NavDirection, navigate_month};

/// The years a picker lets the user choose from, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearWindow {
    /// The earliest selectable year.
    pub min_year: i32,
    /// The latest selectable year.
    pub max_year: i32,
}

impl YearWindow {
    /// The calendar page's month picker.
    pub const CALENDAR: Self = Self {
        min_year: 2010,
        max_year: 2050,
    };

    /// The analysis page's period picker.
    pub const ANALYSIS: Self = Self {
        min_year: 2020,
        max_year: 2030,
    };

    /// Whether `year` is selectable.
    pub fn contains(self, year: i32) -> bool {
        (self.min_year..=self.max_year).contains(&year)
    }

    /// The closest selectable year to `year`.
    pub fn clamp(self, year: i32) -> i32 {
        year.clamp(self.min_year, self.max_year)
    }
}

/// The tabs of the analysis page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodTab {
    /// Sunday to Saturday.
    Week,
    /// A calendar month.
    #[default]
    Month,
    /// A calendar year.
    Year,
    /// A date range picked by the user, or all time.
    Custom,
}

impl PeriodTab {
    /// All tabs in display order.
    pub const ALL: [Self; 4] = [Self::Week, Self::Month, Self::Year, Self::Custom];

    /// The value used for this tab in query strings.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::Custom => "custom",
        }
    }

    /// The tab's display name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Week => "Week",
            Self::Month => "Month",
            Self::Year => "Year",
            Self::Custom => "Custom",
        }
    }
}

/// Where the week, month and year tabs are currently pointing.
///
/// The fields are independent: moving the week does not move the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavState {
    /// Any date in the selected week.
    pub week_anchor: Date,
    /// The selected month, 1 to 12.
    pub month: u8,
    /// The selected year for the month and year tabs.
    pub year: i32,
}

impl NavState {
    /// Point every tab at `date`.
    pub fn from_date(date: Date) -> Self {
        Self {
            week_anchor: date,
            month: u8::from(date.month()),
            year: date.year(),
        }
    }
}

/// A custom range as picked in the analysis form, one field per picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomRange {
    /// Day of the month of the first day.
    pub from_date: u8,
    /// Month of the first day, 1 to 12.
    pub from_month: u8,
    /// Year of the first day.
    pub from_year: i32,
    /// Day of the month of the last day.
    pub to_date: u8,
    /// Month of the last day, 1 to 12.
    pub to_month: u8,
    /// Year of the last day.
    pub to_year: i32,
}

impl CustomRange {
    /// The range from `from` to `to`.
    pub fn from_dates(from: Date, to: Date) -> Self {
        Self {
            from_date: from.day(),
            from_month: u8::from(from.month()),
            from_year: from.year(),
            to_date: to.day(),
            to_month: u8::from(to.month()),
            to_year: to.year(),
        }
    }

    /// The first and last day, or `None` if either is not a real date or the
    /// range is backwards.
    pub fn dates(self) -> Option<(Date, Date)> {
        let from = date_from_parts(self.from_date, self.from_month, self.from_year)?;
        let to = date_from_parts(self.to_date, self.to_month, self.to_year)?;

        (from <= to).then_some((from, to))
    }
}

/// What the user applied on the custom tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomSelection {
    /// Every transaction ever recorded.
    AllTime,
    /// An explicit range.
    Range(CustomRange),
}

/// The Sunday and Saturday of a week, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekSpan {
    /// The Sunday.
    pub start: Date,
    /// The Saturday.
    pub end: Date,
}

impl WeekSpan {
    /// Whether any day of the week falls in a year of `window`.
    ///
    /// A week that straddles New Year belongs to both years.
    pub fn overlaps(self, window: YearWindow) -> bool {
        window.contains(self.start.year()) || window.contains(self.end.year())
    }
}

/// The Sunday to Saturday week that contains `anchor`.
pub fn week_dates(anchor: Date) -> WeekSpan {
    let days_since_sunday = anchor.weekday().number_days_from_sunday();
    let start = anchor.saturating_sub(Duration::days(i64::from(days_since_sunday)));
    let end = start.saturating_add(Duration::days(6));

    WeekSpan { start, end }
}

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// The first day.
    pub start: Date,
    /// The last day.
    pub end: Date,
}

/// A span of time to summarise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// The week starting on the Sunday `reference_date`.
    Week {
        /// The first day of the week.
        reference_date: Date,
    },
    /// A calendar month.
    Month {
        /// The month.
        month: Month,
        /// The year.
        year: i32,
    },
    /// A calendar year.
    Year {
        /// The year.
        year: i32,
    },
    /// An explicit range, `from` no later than `to`.
    Custom {
        /// The first day.
        from: Date,
        /// The last day.
        to: Date,
    },
    /// No date bounds.
    All,
}

impl Period {
    /// The dates covered by the period, or `None` for [Period::All].
    pub fn date_range(self) -> Option<DateRange> {
        match self {
            Self::Week { reference_date } => {
                let WeekSpan { start, end } = week_dates(reference_date);
                Some(DateRange { start, end })
            }
            Self::Month { month, year } => {
                CalendarMonth::new(month, year).map(CalendarMonth::date_range)
            }
            Self::Year { year } => {
                let start = Date::from_calendar_date(year, Month::January, 1).ok()?;
                let end = Date::from_calendar_date(year, Month::December, 31).ok()?;
                Some(DateRange { start, end })
            }
            Self::Custom { from, to } => Some(DateRange {
                start: from,
                end: to,
            }),
            Self::All => None,
        }
    }

    /// A human readable name for the period, e.g. "February 2024".
    pub fn label(self) -> String {
        match self {
            Self::Month { month, year } => format!("{month} {year}"),
            Self::Year { year } => year.to_string(),
            Self::All => "All time".to_owned(),
            Self::Week { .. } | Self::Custom { .. } => match self.date_range() {
                Some(range) => format!(
                    "{} - {}",
                    format_date_label(range.start),
                    format_date_label(range.end)
                ),
                None => "All time".to_owned(),
            },
        }
    }
}

/// The canonical query parameters for a [Period].
///
/// Serialises to JSON as an object tagged with `type`, e.g.
/// `{"type":"month","month":2,"year":2024}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "WireParams")]
pub struct QueryParams {
    period: Period,
}

impl QueryParams {
    /// Wrap `period`.
    pub fn new(period: Period) -> Self {
        Self { period }
    }

    /// The period these parameters select.
    pub fn period(self) -> Period {
        self.period
    }

    /// The human readable name of the period.
    pub fn label(self) -> String {
        self.period.label()
    }

    /// The parameters as key-value pairs in canonical order.
    pub fn to_pairs(self) -> Vec<(&'static str, String)> {
        match self.period {
            Period::Week { reference_date } => vec![
                ("type", "week".to_owned()),
                ("date", reference_date.day().to_string()),
                ("month", u8::from(reference_date.month()).to_string()),
                ("year", reference_date.year().to_string()),
            ],
            Period::Month { month, year } => vec![
                ("type", "month".to_owned()),
                ("month", u8::from(month).to_string()),
                ("year", year.to_string()),
            ],
            Period::Year { year } => vec![("type", "year".to_owned()), ("year", year.to_string())],
            Period::Custom { from, to } => vec![
                ("type", "custom".to_owned()),
                ("from", format_day_month_year(from)),
                ("to", format_day_month_year(to)),
            ],
            Period::All => vec![("type", "all".to_owned())],
        }
    }

    /// The URL-encoded query string, e.g. `type=week&date=11&month=2&year=2024`.
    pub fn to_query_string(self) -> String {
        serde_urlencoded::to_string(self.to_pairs()).unwrap_or_else(|error| {
            tracing::error!("Could not encode period query {:?}: {error}", self.period);
            String::new()
        })
    }
}

impl From<Period> for QueryParams {
    fn from(period: Period) -> Self {
        Self::new(period)
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireParams {
    Week { date: u8, month: u8, year: i32 },
    Month { month: u8, year: i32 },
    Year { year: i32 },
    Custom { from: String, to: String },
    All,
}

impl From<QueryParams> for WireParams {
    fn from(params: QueryParams) -> Self {
        match params.period {
            Period::Week { reference_date } => Self::Week {
                date: reference_date.day(),
                month: u8::from(reference_date.month()),
                year: reference_date.year(),
            },
            Period::Month { month, year } => Self::Month {
                month: u8::from(month),
                year,
            },
            Period::Year { year } => Self::Year { year },
            Period::Custom { from, to } => Self::Custom {
                from: format_day_month_year(from),
                to: format_day_month_year(to),
            },
            Period::All => Self::All,
        }
    }
}

/// The canonical query parameters as they arrive in a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodQuery {
    /// One of `week`, `month`, `year`, `custom` or `all`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Day of the month of the first day of a week.
    pub date: Option<u8>,
    /// Month, 1 to 12.
    pub month: Option<u8>,
    /// Year.
    pub year: Option<i32>,
    /// First day of a custom range, `dd-mm-yyyy`.
    pub from: Option<String>,
    /// Last day of a custom range, `dd-mm-yyyy`.
    pub to: Option<String>,
}

impl PeriodQuery {
    /// The period the query selects, or `None` if it is incomplete, invalid
    /// or outside `window`.
    ///
    /// Accepts exactly what [resolve_period] can produce for `window`, so
    /// every period has a date range except [Period::All].
    pub fn period(&self, window: YearWindow) -> Option<Period> {
        match self.kind.as_deref()? {
            "week" => {
                let span = week_dates(date_from_parts(self.date?, self.month?, self.year?)?);
                span.overlaps(window).then_some(Period::Week {
                    reference_date: span.start,
                })
            }
            "month" => {
                let year = self.year?;
                let month = CalendarMonth::new(Month::try_from(self.month?).ok()?, year)?;
                window.contains(year).then_some(Period::Month {
                    month: month.month(),
                    year,
                })
            }
            "year" => {
                let year = self.year?;
                (window.contains(year) && Date::from_calendar_date(year, Month::January, 1).is_ok())
                    .then_some(Period::Year { year })
            }
            "custom" => {
                let from = parse_day_month_year(self.from.as_deref()?)?;
                let to = parse_day_month_year(self.to.as_deref()?)?;
                (from <= to && window.contains(from.year()) && window.contains(to.year()))
                    .then_some(Period::Custom { from, to })
            }
            "all" => Some(Period::All),
            _ => None,
        }
    }
}

/// Resolve the analysis page state into canonical query parameters.
///
/// Anything missing or out of range (no tab, a month outside 1 to 12, a year
/// outside `window`, a custom tab with nothing applied, or an invalid custom
/// range) resolves to the month containing `today`.
pub fn resolve_period(
    tab: Option<PeriodTab>,
    nav_state: &NavState,
    custom: Option<&CustomSelection>,
    window: YearWindow,
    today: Date,
) -> QueryParams {
    let period = tab.and_then(|tab| match tab {
        PeriodTab::Week => {
            let span = week_dates(nav_state.week_anchor);
            span.overlaps(window).then_some(Period::Week {
                reference_date: span.start,
            })
        }
        PeriodTab::Month => {
            let month = Month::try_from(nav_state.month).ok()?;
            window.contains(nav_state.year).then_some(Period::Month {
                month,
                year: nav_state.year,
            })
        }
        PeriodTab::Year => window
            .contains(nav_state.year)
            .then_some(Period::Year {
                year: nav_state.year,
            }),
        PeriodTab::Custom => match custom? {
            CustomSelection::AllTime => Some(Period::All),
            CustomSelection::Range(range) => {
                let (from, to) = range.dates()?;
                (window.contains(from.year()) && window.contains(to.year()))
                    .then_some(Period::Custom { from, to })
            }
        },
    });

    let period = period.unwrap_or_else(|| {
        tracing::debug!("Could not resolve period for tab {tab:?}, using the current month");
        Period::Month {
            month: today.month(),
            year: today.year(),
        }
    });

    QueryParams::new(period)
}

/// Move the navigation state of `tab` one period in `direction`.
///
/// Weeks move by seven days and months roll over between December and
/// January. A week or month move that would leave `window` is ignored, while
/// year moves are clamped to `window`. The custom tab has nothing to move.
pub fn navigate_period(
    tab: PeriodTab,
    nav_state: &NavState,
    direction: NavDirection,
    window: YearWindow,
) -> NavState {
    let nav_state = *nav_state;

    match tab {
        PeriodTab::Week => {
            let step = match direction {
                NavDirection::Prev => Duration::days(-7),
                NavDirection::Next => Duration::days(7),
            };

            match nav_state.week_anchor.checked_add(step) {
                Some(week_anchor) if week_dates(week_anchor).overlaps(window) => NavState {
                    week_anchor,
                    ..nav_state
                },
                _ => nav_state,
            }
        }
        PeriodTab::Month => {
            let Ok(month) = Month::try_from(nav_state.month) else {
                return nav_state;
            };
            let (month, year) = navigate_month(month, nav_state.year, direction);

            if window.contains(year) {
                NavState {
                    month: u8::from(month),
                    year,
                    ..nav_state
                }
            } else {
                nav_state
            }
        }
        PeriodTab::Year => {
            let year = match direction {
                NavDirection::Prev => nav_state.year.saturating_sub(1),
                NavDirection::Next => nav_state.year.saturating_add(1),
            };

            NavState {
                year: window.clamp(year),
                ..nav_state
            }
        }
        PeriodTab::Custom => nav_state,
    }
}

/// Parse a `dd-mm-yyyy` date. Leading zeros are optional.
pub fn parse_day_month_year(text: &str) -> Option<Date> {
    let mut parts = text.trim().splitn(3, '-');
    let day = parts.next()?.parse().ok()?;
    let month = parts.next()?.parse().ok()?;
    let year = parts.next()?.parse().ok()?;

    date_from_parts(day, month, year)
}

/// Format `date` as `dd-mm-yyyy`.
pub fn format_day_month_year(date: Date) -> String {
    format!(
        "{:02}-{:02}-{:04}",
        date.day(),
        u8::from(date.month()),
        date.year()
    )
}

fn date_from_parts(day: u8, month: u8, year: i32) -> Option<Date> {
    let month = Month::try_from(month).ok()?;

    Date::from_calendar_date(year, month, day).ok()
}

fn format_date_label(date: Date) -> String {
    date.format(format_description!(
        "[day padding:none] [month repr:short] [year]"
    ))
    .unwrap_or_else(|_| date.to_string())
}
