//! ExpenseTrace is a personal finance tracker.
//!
//! The library holds the date and period rules shared by every view:
//!
//! - [period] resolves the analysis tabs into canonical query parameters,
//! - [calendar] builds month grids annotated with daily totals,
//! - [day_navigator] steps through single days and keeps URLs deep-linkable,
//! - [format] renders amounts and times according to the user's [settings].
//!
//! It also provides a small server that renders HTML pages over a SQLite
//! database, see [build_router].

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod analysis_page;
mod app_state;
pub mod calendar;
mod calendar_page;
pub mod day_navigator;
mod day_page;
mod database_id;
mod db;
mod endpoints;
pub mod format;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
pub mod period;
mod routing;
pub mod settings;
mod settings_page;
pub mod summary;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::{AppState, MissingTimePolicy};
pub use database_id::DatabaseId;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;

use crate::{internal_server_error::InternalServerError, not_found::get_404_not_found_response};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Could not acquire the lock on the cached user settings.
    #[error("could not acquire the settings cache lock")]
    CacheLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while saving the user's format settings.
    #[error("failed to save format settings")]
    SettingsSaveError,

    /// The requested period is malformed, outside the selectable years or
    /// has no date range.
    #[error("the requested period is not valid")]
    InvalidPeriod,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidPeriod => (StatusCode::BAD_REQUEST, "invalid period").into_response(),
            Error::SettingsSaveError => InternalServerError::new(
                "Save Failed",
                "Failed to save your format settings. Please try again.",
            )
            .into_response(),
            Error::InvalidTimezoneError(timezone) => {
                InternalServerError::invalid_timezone(&timezone).into_response()
            }
            Error::DatabaseLockError | Error::CacheLockError => {
                InternalServerError::default().into_response()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}
