//! The form for choosing how amounts and times are displayed.

use std::sync::{Arc, Mutex};

use axum::{
    Form, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    format::{format_clock_time, format_currency},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        base,
    },
    navigation::NavBar,
    settings::{
        DecimalFormat, NumberFormat, SettingsCache, TimeFormat, UserFormatSettings,
        load_user_settings, update_user_settings,
    },
    timezone::current_local_date_time,
};

/// The state needed for the settings page and API.
#[derive(Debug, Clone)]
pub struct SettingsPageState {
    /// The database connection for reading and saving settings.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The user's format settings.
    pub settings_cache: Arc<SettingsCache>,
}

impl FromRef<AppState> for SettingsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            settings_cache: state.settings_cache.clone(),
        }
    }
}

fn get_settings(state: &SettingsPageState) -> Result<UserFormatSettings, Error> {
    let now = current_local_date_time(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    load_user_settings(&state.settings_cache, &connection, now)
        .inspect_err(|error| tracing::error!("could not load format settings: {error}"))
}

/// Display the settings form filled in with the current settings.
pub async fn get_settings_page(State(state): State<SettingsPageState>) -> Result<Response, Error> {
    let settings = get_settings(&state)?;

    Ok(settings_view(&settings).into_response())
}

/// Get the current settings as JSON.
pub async fn get_settings_api(State(state): State<SettingsPageState>) -> Result<Response, Error> {
    let settings = get_settings(&state)?;

    Ok(Json(settings).into_response())
}

/// Save the submitted settings and send the client back to the settings page.
pub async fn update_settings_endpoint(
    State(state): State<SettingsPageState>,
    Form(form): Form<UserFormatSettings>,
) -> Result<Response, Error> {
    let settings = form.normalized();
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    update_user_settings(&settings, &state.settings_cache, &connection)
        .inspect_err(|error| tracing::error!("could not save format settings: {error}"))
        .map_err(|_| Error::SettingsSaveError)?;

    Ok((
        HxRedirect(endpoints::SETTINGS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response())
}

fn select_field(
    name: &str,
    label: &str,
    options: impl IntoIterator<Item = (u8, &'static str)>,
    selected: u8,
) -> Markup {
    html!(
        div class="w-full mb-4"
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }
            select id=(name) name=(name) class=(FORM_TEXT_INPUT_STYLE)
            {
                @for (code, option_label) in options {
                    option value=(code) selected[code == selected] { (option_label) }
                }
            }
        }
    )
}

fn settings_view(settings: &UserFormatSettings) -> Markup {
    let nav_bar = NavBar::new(endpoints::SETTINGS_VIEW).into_html();
    let amount_preview = format_currency(1_234_567.5, Some(settings));
    let time_preview = format_clock_time(time::macros::time!(13:05), Some(settings));

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h2 class="text-xl font-semibold mb-4" { "Display settings" }

            form hx-post=(endpoints::SETTINGS_VIEW) class="w-full"
            {
                (select_field(
                    "timeFormat",
                    "Time format",
                    TimeFormat::ALL.map(|format| (format.code(), format.label())),
                    settings.time_format.code(),
                ))
                (select_field(
                    "decimalFormat",
                    "Decimal places",
                    DecimalFormat::ALL.map(|format| (format.code(), format.label())),
                    settings.decimal_format.code(),
                ))
                (select_field(
                    "numberFormat",
                    "Digit grouping",
                    NumberFormat::ALL.map(|format| (format.code(), format.label())),
                    settings.number_format.code(),
                ))

                div class="w-full mb-4"
                {
                    label for="currencyCode" class=(FORM_LABEL_STYLE) { "Currency" }
                    input
                        type="text"
                        id="currencyCode"
                        name="currencyCode"
                        value=(settings.currency_code)
                        maxlength="3"
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
            }

            p id="preview" class="mt-4 text-sm"
            {
                "Preview: " (amount_preview) " at " (time_preview)
            }
        }
    );

    base("Settings", &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode};
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        endpoints,
        settings::{
            DecimalFormat, NumberFormat, SettingsCache, TimeFormat, UserFormatSettings,
            get_user_settings,
        },
        test_utils::{
            assert_content_type, assert_selected_option, assert_status_ok,
            assert_text_input_with_value, assert_valid_html, get_header, must_get_form,
            must_select_text, parse_html_document,
        },
    };

    use super::{
        SettingsPageState, get_settings_api, get_settings_page, update_settings_endpoint,
    };

    fn get_test_state() -> SettingsPageState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        SettingsPageState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
            settings_cache: Arc::new(SettingsCache::default()),
        }
    }

    #[tokio::test]
    async fn shows_default_settings() {
        let response = get_settings_page(State(get_test_state())).await.unwrap();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_eq!(form.value().attr("hx-post"), Some(endpoints::SETTINGS_VIEW));
        assert_selected_option(&form, "timeFormat", "1");
        assert_selected_option(&form, "decimalFormat", "1");
        assert_selected_option(&form, "numberFormat", "1");
        assert_text_input_with_value(&form, "currencyCode", "USD");
        assert_eq!(
            must_select_text(&html, "#preview"),
            "Preview: $1,234,567.50 at 1:05 PM"
        );
    }

    #[tokio::test]
    async fn saving_redirects_and_updates_page() {
        let state = get_test_state();
        // Fill the cache so the update has something to invalidate.
        get_settings_page(State(state.clone())).await.unwrap();

        let response = update_settings_endpoint(
            State(state.clone()),
            Form(UserFormatSettings {
                time_format: TimeFormat::TwentyFourHour,
                decimal_format: DecimalFormat::TwoDecimals,
                number_format: NumberFormat::Lakh,
                currency_code: " inr ".to_owned(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            get_header(&response, HX_REDIRECT.as_str()),
            endpoints::SETTINGS_VIEW
        );

        let want = UserFormatSettings {
            time_format: TimeFormat::TwentyFourHour,
            decimal_format: DecimalFormat::TwoDecimals,
            number_format: NumberFormat::Lakh,
            currency_code: "INR".to_owned(),
        };
        let saved = get_user_settings(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(saved, Some(want.clone()));

        let html = parse_html_document(get_settings_page(State(state)).await.unwrap()).await;
        let form = must_get_form(&html);
        assert_selected_option(&form, "timeFormat", &want.time_format.code().to_string());
        assert_selected_option(&form, "decimalFormat", &want.decimal_format.code().to_string());
        assert_selected_option(&form, "numberFormat", &want.number_format.code().to_string());
        assert_text_input_with_value(&form, "currencyCode", "INR");
        assert_eq!(
            must_select_text(&html, "#preview"),
            "Preview: ₹12,34,567.50 at 13:05"
        );
    }

    #[test]
    fn form_accepts_numeric_codes() {
        let form: UserFormatSettings =
            serde_urlencoded::from_str("timeFormat=2&decimalFormat=9&numberFormat=3&currencyCode=eur")
                .unwrap();

        assert_eq!(
            form.normalized(),
            UserFormatSettings {
                time_format: TimeFormat::TwentyFourHour,
                decimal_format: DecimalFormat::default(),
                number_format: NumberFormat::Plain,
                currency_code: "EUR".to_owned(),
            }
        );
    }

    #[tokio::test]
    async fn api_returns_settings_as_json() {
        let response = get_settings_api(State(get_test_state())).await.unwrap();

        assert_status_ok(&response);
        assert_content_type(&response, "application/json");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "timeFormat": 1,
                "decimalFormat": 1,
                "numberFormat": 1,
                "currencyCode": "USD",
            })
        );
    }
}
