//! The endpoint URIs.

/// The root route which redirects to the calendar.
pub const ROOT: &str = "/";
/// The month calendar.
pub const CALENDAR_VIEW: &str = "/calendar";
/// The summary of a single day.
pub const DAY_VIEW: &str = "/day";
/// Income and expense totals for a week, month, year or custom range.
pub const ANALYSIS_VIEW: &str = "/analysis";
/// The format settings form.
pub const SETTINGS_VIEW: &str = "/settings";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";

/// The user's format settings as JSON.
pub const SETTINGS_API: &str = "/api/settings";
/// Totals for a period given by its canonical query parameters, as JSON.
pub const PERIOD_API: &str = "/api/period";
