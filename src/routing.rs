//! Application router configuration.

use axum::{Router, response::Redirect, routing::get};

use crate::{
    AppState,
    analysis_page::{get_analysis_page, get_period_api},
    calendar_page::get_calendar_page,
    day_page::get_day_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    settings_page::{get_settings_api, get_settings_page, update_settings_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::CALENDAR_VIEW, get(get_calendar_page))
        .route(endpoints::DAY_VIEW, get(get_day_page))
        .route(endpoints::ANALYSIS_VIEW, get(get_analysis_page))
        .route(
            endpoints::SETTINGS_VIEW,
            get(get_settings_page).post(update_settings_endpoint),
        )
        .route(endpoints::SETTINGS_API, get(get_settings_api))
        .route(endpoints::PERIOD_API, get(get_period_api))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        )
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the calendar page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::CALENDAR_VIEW)
}
