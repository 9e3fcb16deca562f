//! Income and expense totals for a week, month, year or custom range.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    calendar::NavDirection,
    endpoints,
    format::{DEFAULT_PERCENTAGE_DECIMALS, format_currency, format_date, format_percentage},
    html::{
        BUTTON_PRIMARY_STYLE, EXPENSE_TEXT_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, INCOME_TEXT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, link,
        stepper, summary_card,
    },
    navigation::NavBar,
    period::{
        CustomRange, CustomSelection, DateRange, NavState, Period, PeriodQuery, PeriodTab,
        QueryParams, YearWindow, format_day_month_year, navigate_period, parse_day_month_year,
        resolve_period,
    },
    settings::{SettingsCache, UserFormatSettings, load_user_settings},
    summary::{PeriodTotals, get_period_totals, get_transaction_date_bounds},
    timezone::current_local_date_time,
};

/// The state needed for the analysis page and the period API.
#[derive(Debug, Clone)]
pub struct AnalysisPageState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The user's format settings.
    pub settings_cache: Arc<SettingsCache>,
}

impl FromRef<AppState> for AnalysisPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            settings_cache: state.settings_cache.clone(),
        }
    }
}

/// The analysis page state as it appears in the URL.
///
/// Fields are kept as strings so that a malformed value falls back to its
/// default instead of rejecting the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisQuery {
    /// One of `week`, `month`, `year` or `custom`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab: Option<String>,
    /// Any day in the selected week, `dd-mm-yyyy`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    /// The selected month, 1 to 12.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    /// The selected year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    /// First day of a custom range, `dd-mm-yyyy`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Last day of a custom range, `dd-mm-yyyy`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// `true` to select every transaction on the custom tab.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all: Option<String>,
}

impl AnalysisQuery {
    fn tab(&self) -> Option<PeriodTab> {
        let tab = self.tab.as_deref()?.trim();

        PeriodTab::ALL
            .into_iter()
            .find(|candidate| candidate.as_query_value() == tab)
    }

    /// The navigation state in the query, with missing or malformed fields
    /// taken from `today`.
    fn nav_state(&self, today: Date) -> NavState {
        let defaults = NavState::from_date(today);

        NavState {
            week_anchor: self
                .anchor
                .as_deref()
                .and_then(parse_day_month_year)
                .unwrap_or(defaults.week_anchor),
            month: self
                .month
                .as_deref()
                .and_then(|month| month.trim().parse().ok())
                .unwrap_or(defaults.month),
            year: self
                .year
                .as_deref()
                .and_then(|year| year.trim().parse().ok())
                .unwrap_or(defaults.year),
        }
    }

    fn custom_selection(&self) -> Option<CustomSelection> {
        if self.all.as_deref().map(str::trim) == Some("true") {
            return Some(CustomSelection::AllTime);
        }

        let from = parse_day_month_year(self.from.as_deref()?)?;
        let to = parse_day_month_year(self.to.as_deref()?)?;

        Some(CustomSelection::Range(CustomRange::from_dates(from, to)))
    }

    fn for_tab(tab: PeriodTab, nav_state: &NavState) -> Self {
        Self {
            tab: Some(tab.as_query_value().to_owned()),
            anchor: Some(format_day_month_year(nav_state.week_anchor)),
            month: Some(nav_state.month.to_string()),
            year: Some(nav_state.year.to_string()),
            ..Default::default()
        }
    }

    fn url(&self) -> String {
        match serde_urlencoded::to_string(self) {
            Ok(query_string) if !query_string.is_empty() => {
                format!("{}?{query_string}", endpoints::ANALYSIS_VIEW)
            }
            Ok(_) => endpoints::ANALYSIS_VIEW.to_owned(),
            Err(error) => {
                tracing::error!("Could not encode analysis query {self:?}: {error}");
                endpoints::ANALYSIS_VIEW.to_owned()
            }
        }
    }
}

/// The tab that shows `period`.
fn tab_for(period: Period) -> PeriodTab {
    match period {
        Period::Week { .. } => PeriodTab::Week,
        Period::Month { .. } => PeriodTab::Month,
        Period::Year { .. } => PeriodTab::Year,
        Period::Custom { .. } | Period::All => PeriodTab::Custom,
    }
}

/// The dates to total for `period`, where `None` selects every transaction.
///
/// # Errors
/// Returns [Error::InvalidPeriod] if a bounded period has no date range.
fn totals_date_range(period: Period) -> Result<Option<DateRange>, Error> {
    match (period, period.date_range()) {
        (Period::All, _) => Ok(None),
        (_, Some(date_range)) => Ok(Some(date_range)),
        (_, None) => {
            tracing::error!("Period {period:?} has no date range");
            Err(Error::InvalidPeriod)
        }
    }
}

/// `nav_state` moved to point at the resolved `period`.
fn sync_nav_state(nav_state: NavState, period: Period) -> NavState {
    match period {
        Period::Week { reference_date } => NavState {
            week_anchor: reference_date,
            ..nav_state
        },
        Period::Month { month, year } => NavState {
            month: u8::from(month),
            year,
            ..nav_state
        },
        Period::Year { year } => NavState { year, ..nav_state },
        Period::Custom { .. } | Period::All => nav_state,
    }
}

/// What the custom tab shows besides the selected totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CustomForm {
    /// The submitted range could not be used.
    rejected: bool,
    /// The first and last transaction dates, if there are any transactions.
    transaction_dates: Option<DateRange>,
}

/// Display the totals for the period selected in the query.
///
/// An incomplete or invalid selection shows the current month. A rejected
/// custom range keeps the custom tab open with the submitted text and an
/// error message.
pub async fn get_analysis_page(
    State(state): State<AnalysisPageState>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Response, Error> {
    let now = current_local_date_time(&state.local_timezone)?;
    let today = now.date();
    let custom = query.custom_selection();
    let params = resolve_period(
        query.tab(),
        &query.nav_state(today),
        custom.as_ref(),
        YearWindow::ANALYSIS,
        today,
    );
    let nav_state = sync_nav_state(query.nav_state(today), params.period());
    let active_tab = match query.tab() {
        Some(PeriodTab::Custom) => PeriodTab::Custom,
        _ => tab_for(params.period()),
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let settings = load_user_settings(&state.settings_cache, &connection, now)
        .inspect_err(|error| tracing::error!("could not load format settings: {error}"))?;
    let totals = get_period_totals(totals_date_range(params.period())?, &connection)
        .inspect_err(|error| tracing::error!("could not get totals for {params:?}: {error}"))?;

    let custom_form = if active_tab == PeriodTab::Custom {
        let submitted_range = query.from.is_some() || query.to.is_some();
        CustomForm {
            rejected: submitted_range && tab_for(params.period()) != PeriodTab::Custom,
            transaction_dates: get_transaction_date_bounds(&connection).inspect_err(|error| {
                tracing::error!("could not get transaction date bounds: {error}")
            })?,
        }
    } else {
        CustomForm::default()
    };

    Ok(analysis_view(
        params,
        active_tab,
        nav_state,
        &query,
        custom_form,
        &totals,
        &settings,
    )
    .into_response())
}

fn adjacent_period_url(
    tab: PeriodTab,
    nav_state: &NavState,
    direction: NavDirection,
) -> Option<String> {
    let moved = navigate_period(tab, nav_state, direction, YearWindow::ANALYSIS);

    (moved != *nav_state).then(|| AnalysisQuery::for_tab(tab, &moved).url())
}

fn analysis_view(
    params: QueryParams,
    active_tab: PeriodTab,
    nav_state: NavState,
    query: &AnalysisQuery,
    custom_form: CustomForm,
    totals: &PeriodTotals,
    settings: &UserFormatSettings,
) -> Markup {
    let prev_url = adjacent_period_url(active_tab, &nav_state, NavDirection::Prev);
    let next_url = adjacent_period_url(active_tab, &nav_state, NavDirection::Next);
    let all_time_url = AnalysisQuery {
        tab: Some(PeriodTab::Custom.as_query_value().to_owned()),
        all: Some("true".to_owned()),
        ..Default::default()
    }
    .url();
    let api_url = format!("{}?{}", endpoints::PERIOD_API, params.to_query_string());
    let savings_rate = totals
        .savings_rate()
        .map(|rate| format_percentage(rate, DEFAULT_PERCENTAGE_DECIMALS))
        .unwrap_or_else(|| "-".to_owned());
    let net_style = if totals.net() < 0.0 {
        EXPENSE_TEXT_STYLE
    } else {
        INCOME_TEXT_STYLE
    };
    let nav_bar = NavBar::new(endpoints::ANALYSIS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            ul id="period-tabs" class="flex gap-4 mb-4"
            {
                @for tab in PeriodTab::ALL {
                    li
                    {
                        a
                            href=(AnalysisQuery::for_tab(tab, &nav_state).url())
                            class=(LINK_STYLE)
                            aria-current=[(tab == active_tab).then_some("page")]
                        {
                            (tab.label())
                        }
                    }
                }
            }

            (stepper(&params.label(), prev_url.as_deref(), next_url.as_deref()))

            div id="period-summary" class="grid grid-cols-2 gap-4 w-full max-w-md mb-6"
            {
                (summary_card("Income", &format_currency(totals.income, Some(settings)), INCOME_TEXT_STYLE))
                (summary_card("Expenses", &format_currency(totals.expense, Some(settings)), EXPENSE_TEXT_STYLE))
                (summary_card("Net", &format_currency(totals.net(), Some(settings)), net_style))
                (summary_card("Savings rate", &savings_rate, net_style))
            }

            p class="mb-4"
            {
                (totals.transaction_count) " transactions. "
                (link(&api_url, "View as JSON"))
            }

            @if active_tab == PeriodTab::Custom {
                form
                    method="get"
                    action=(endpoints::ANALYSIS_VIEW)
                    class=(FORM_CONTAINER_STYLE)
                {
                    input type="hidden" name="tab" value=(PeriodTab::Custom.as_query_value());

                    @if custom_form.rejected {
                        p id="custom-error" class=(EXPENSE_TEXT_STYLE)
                        {
                            "Enter both dates as dd-mm-yyyy between "
                            (YearWindow::ANALYSIS.min_year) " and " (YearWindow::ANALYSIS.max_year)
                            ", with From on or before To."
                        }
                    }

                    div class="w-full mb-4"
                    {
                        label for="from" class=(FORM_LABEL_STYLE) { "From" }
                        input
                            type="text"
                            id="from"
                            name="from"
                            placeholder="dd-mm-yyyy"
                            value=[query.from.as_deref()]
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div class="w-full mb-4"
                    {
                        label for="to" class=(FORM_LABEL_STYLE) { "To" }
                        input
                            type="text"
                            id="to"
                            name="to"
                            placeholder="dd-mm-yyyy"
                            value=[query.to.as_deref()]
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Apply" }

                    p class="mt-4" { (link(&all_time_url, "All time")) }

                    @if let Some(dates) = custom_form.transaction_dates {
                        p id="transaction-dates" class="mt-2 text-sm"
                        {
                            "Transactions run from " (format_date(dates.start))
                            " to " (format_date(dates.end)) "."
                        }
                    }
                }
            }
        }
    );

    base("Analysis", &content)
}

/// The JSON body returned by the period API.
#[derive(Debug, Serialize)]
struct PeriodResponse {
    params: QueryParams,
    label: String,
    totals: PeriodTotals,
}

/// Get the totals for the period given by its canonical query parameters.
///
/// Responds with 400 Bad Request if the parameters do not describe a period
/// the analysis page could select.
pub async fn get_period_api(
    State(state): State<AnalysisPageState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, Error> {
    let Some(period) = query.period(YearWindow::ANALYSIS) else {
        tracing::debug!("Rejecting invalid period query {query:?}");
        return Err(Error::InvalidPeriod);
    };
    let params = QueryParams::new(period);
    let date_range = totals_date_range(period)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let totals = get_period_totals(date_range, &connection)
        .inspect_err(|error| tracing::error!("could not get totals for {period:?}: {error}"))?;

    Ok(Json(PeriodResponse {
        params,
        label: params.label(),
        totals,
    })
    .into_response())
}
