//! The month calendar with daily income and expense totals.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, Month};

use crate::{
    AppState, Error,
    calendar::{CalendarCell, CalendarMonth, MonthGrid, NavDirection, build_month_grid},
    endpoints,
    format::format_compact_number,
    html::{
        EXPENSE_TEXT_STYLE, INCOME_TEXT_STYLE, PAGE_CONTAINER_STYLE, TABLE_HEADER_STYLE, base,
        stepper,
    },
    navigation::NavBar,
    period::YearWindow,
    settings::{SettingsCache, UserFormatSettings, load_user_settings},
    summary::get_day_summaries,
    timezone::current_local_date_time,
};

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// The state needed for the calendar page.
#[derive(Debug, Clone)]
pub struct CalendarPageState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The user's format settings.
    pub settings_cache: Arc<SettingsCache>,
}

impl FromRef<AppState> for CalendarPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            settings_cache: state.settings_cache.clone(),
        }
    }
}

/// The month to show, as decimal integer strings.
#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    /// The month, 1 to 12.
    pub month: Option<String>,
    /// The year.
    pub year: Option<String>,
}

/// Display the calendar for the month in the query, or the current month.
pub async fn get_calendar_page(
    State(state): State<CalendarPageState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Response, Error> {
    let now = current_local_date_time(&state.local_timezone)?;
    let today = now.date();
    let calendar_month = resolve_calendar_month(&query, today, YearWindow::CALENDAR);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let settings = load_user_settings(&state.settings_cache, &connection, now)
        .inspect_err(|error| tracing::error!("could not load format settings: {error}"))?;
    let day_summaries = get_day_summaries(calendar_month, &connection).inspect_err(|error| {
        tracing::error!("could not get day summaries for {calendar_month:?}: {error}")
    })?;

    let grid = build_month_grid(calendar_month, &day_summaries, today);

    Ok(calendar_view(&grid, &settings, YearWindow::CALENDAR).into_response())
}

/// The month selected by `query`.
///
/// A missing or invalid month or year takes the value from `today`. Years
/// outside `window` are clamped into it.
fn resolve_calendar_month(query: &CalendarQuery, today: Date, window: YearWindow) -> CalendarMonth {
    let month = query
        .month
        .as_deref()
        .and_then(|month| month.trim().parse::<u8>().ok())
        .and_then(|month| Month::try_from(month).ok())
        .unwrap_or(today.month());
    let year = query
        .year
        .as_deref()
        .and_then(|year| year.trim().parse::<i32>().ok())
        .unwrap_or(today.year());

    CalendarMonth::new(month, window.clamp(year))
        .unwrap_or_else(|| CalendarMonth::from_date(today))
}

fn month_url(calendar_month: CalendarMonth) -> String {
    format!(
        "{}?{}",
        endpoints::CALENDAR_VIEW,
        calendar_month.to_query_string()
    )
}

fn adjacent_month_url(
    calendar_month: CalendarMonth,
    direction: NavDirection,
    window: YearWindow,
) -> Option<String> {
    calendar_month
        .navigate(direction)
        .filter(|month| window.contains(month.year()))
        .map(month_url)
}

fn calendar_view(grid: &MonthGrid, settings: &UserFormatSettings, window: YearWindow) -> Markup {
    let calendar_month = grid.month();
    let prev_url = adjacent_month_url(calendar_month, NavDirection::Prev, window);
    let next_url = adjacent_month_url(calendar_month, NavDirection::Next, window);
    let nav_bar = NavBar::new(endpoints::CALENDAR_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            (stepper(&calendar_month.label(), prev_url.as_deref(), next_url.as_deref()))

            table id="calendar" class="w-full max-w-3xl table-fixed text-sm"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        @for name in WEEKDAY_NAMES {
                            th scope="col" class="px-2 py-3" { (name) }
                        }
                    }
                }

                tbody
                {
                    @for week in grid.weeks() {
                        tr
                        {
                            @for cell in week {
                                (calendar_cell(grid, cell, settings))
                            }

                            @for _ in week.len()..WEEKDAY_NAMES.len() {
                                td {}
                            }
                        }
                    }
                }
            }
        }
    );

    base("Calendar", &content)
}

fn calendar_cell(grid: &MonthGrid, cell: &CalendarCell, settings: &UserFormatSettings) -> Markup {
    let Some(intent) = grid.day_intent(cell) else {
        return html!(td class="h-20" {});
    };

    let style = if cell.is_today {
        "h-20 align-top p-1 border border-blue-500 bg-blue-50 dark:bg-blue-900/30"
    } else {
        "h-20 align-top p-1 border border-gray-200 dark:border-gray-700"
    };

    html!(
        td class=(style) aria-current=[cell.is_today.then_some("date")]
        {
            a href=(intent.url()) class="flex flex-col h-full"
            {
                span class="font-semibold" { (intent.day) }

                @if cell.has_data {
                    @if cell.income > 0.0 {
                        span class={ "text-xs income " (INCOME_TEXT_STYLE) }
                        {
                            "+" (format_compact_number(cell.income, Some(settings)))
                        }
                    }
                    @if cell.expense > 0.0 {
                        span class={ "text-xs expense " (EXPENSE_TEXT_STYLE) }
                        {
                            "-" (format_compact_number(cell.expense, Some(settings)))
                        }
                    }
                }
            }
        }
    )
}
