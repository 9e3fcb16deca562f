//! The summary of a single day with links to the previous and next day.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, MissingTimePolicy,
    day_navigator::{DayNavigator, DayQuery},
    endpoints,
    format::{MissingTime, format_currency, format_date, format_date_time},
    html::{
        EXPENSE_TEXT_STYLE, INCOME_TEXT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, link, stepper, summary_card,
    },
    navigation::NavBar,
    settings::{SettingsCache, UserFormatSettings, load_user_settings},
    summary::{DaySummary, get_day_summary},
    timezone::current_local_date_time,
};

/// Tells htmx which URL to show in the address bar after a boosted request.
const HX_PUSH_URL: &str = "hx-push-url";

/// The state needed for the day page.
#[derive(Debug, Clone)]
pub struct DayPageState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The user's format settings.
    pub settings_cache: Arc<SettingsCache>,
    /// What to show for transactions without a time of day.
    pub missing_time: MissingTimePolicy,
}

impl FromRef<AppState> for DayPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            settings_cache: state.settings_cache.clone(),
            missing_time: state.missing_time,
        }
    }
}

/// Display the income, expenses and transactions for the day in the query.
///
/// Queries that are not in canonical form, including missing or invalid
/// fields, are redirected to the canonical URL for the day they resolve to.
pub async fn get_day_page(
    State(state): State<DayPageState>,
    Query(query): Query<DayQuery>,
) -> Result<Response, Error> {
    let now = current_local_date_time(&state.local_timezone)?;
    let navigator = DayNavigator::from_query(&query, now.date());
    let canonical_url = navigator.url(endpoints::DAY_VIEW);

    if query != navigator.to_query() {
        tracing::debug!("Redirecting day query {query:?} to {canonical_url}");
        return Ok(Redirect::to(&canonical_url).into_response());
    }

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let settings = load_user_settings(&state.settings_cache, &connection, now)
        .inspect_err(|error| tracing::error!("could not load format settings: {error}"))?;
    let summary = get_day_summary(navigator.date(), &connection).inspect_err(|error| {
        tracing::error!("could not get summary for {}: {error}", navigator.date())
    })?;

    let missing_time = state.missing_time.missing_time(now.time());
    let view = day_view(navigator, &summary, &settings, missing_time);

    Ok(([(HX_PUSH_URL, canonical_url)], view).into_response())
}

fn day_view(
    navigator: DayNavigator,
    summary: &DaySummary,
    settings: &UserFormatSettings,
    missing_time: MissingTime,
) -> Markup {
    let mut prev = navigator;
    prev.prev();
    let mut next = navigator;
    next.next();

    let prev_url = prev.url(endpoints::DAY_VIEW);
    let next_url = next.url(endpoints::DAY_VIEW);
    let calendar_url = format!(
        "{}?month={}&year={}",
        endpoints::CALENDAR_VIEW,
        navigator.month(),
        navigator.year()
    );
    let nav_bar = NavBar::new(endpoints::DAY_VIEW).into_html();
    let net_style = if summary.net() < 0.0 {
        EXPENSE_TEXT_STYLE
    } else {
        INCOME_TEXT_STYLE
    };

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            (stepper(&format_date(navigator.date()), Some(&prev_url), Some(&next_url)))

            p class="mb-4" { (link(&calendar_url, "Back to calendar")) }

            div id="day-summary" class="grid grid-cols-3 gap-4 w-full max-w-md mb-6"
            {
                (summary_card("Income", &format_currency(summary.income, Some(settings)), INCOME_TEXT_STYLE))
                (summary_card("Expenses", &format_currency(summary.expense, Some(settings)), EXPENSE_TEXT_STYLE))
                (summary_card("Net", &format_currency(summary.net(), Some(settings)), net_style))
            }

            @if summary.transactions.is_empty() {
                p { "No transactions on this day." }
            } @else {
                table id="transactions" class="w-full max-w-3xl text-sm text-left"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "When" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        }
                    }

                    tbody
                    {
                        @for transaction in &summary.transactions {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE)
                                {
                                    (format_date_time(transaction.date, transaction.time, Some(settings), missing_time))
                                }
                                td class=(TABLE_CELL_STYLE) { (transaction.description) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    (format_currency(transaction.amount, Some(settings)))
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Day", &content)
}
