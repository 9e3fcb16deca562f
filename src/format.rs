//! Display formatting for amounts, times and dates.
//!
//! Every function here is total: absent settings fall back to
//! [UserFormatSettings::default] and out-of-range inputs are wrapped or
//! passed through rather than rejected.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};
use time::{Date, Time, macros::format_description};

use crate::settings::{DecimalFormat, NumberFormat, TimeFormat, UserFormatSettings};

/// Decimal places used by [format_percentage] callers that have no preference.
pub const DEFAULT_PERCENTAGE_DECIMALS: usize = 1;

/// Symbol used for currency codes missing from [CURRENCY_SYMBOLS].
pub const FALLBACK_CURRENCY_SYMBOL: &str = "$";

/// Lakh grouping only applies from one lakh upwards.
const LAKH: f64 = 100_000.0;

/// The most decimal places any [DecimalFormat] asks for.
const MAX_DECIMAL_PLACES: u8 = 2;

const CURRENCY_SYMBOLS: &[(&str, &str)] = &[
    ("USD", "$"),
    ("EUR", "€"),
    ("GBP", "£"),
    ("INR", "₹"),
    ("JPY", "¥"),
    ("CNY", "¥"),
    ("KRW", "₩"),
    ("RUB", "₽"),
    ("NGN", "₦"),
    ("PKR", "₨"),
    ("BDT", "৳"),
    ("LKR", "Rs"),
    ("NPR", "Rs"),
    ("AUD", "A$"),
    ("CAD", "C$"),
    ("NZD", "NZ$"),
    ("SGD", "S$"),
    ("HKD", "HK$"),
    ("BRL", "R$"),
    ("ZAR", "R"),
    ("CHF", "CHF "),
    ("AED", "AED "),
];

/// What [format_date_time] shows when no time of day was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingTime {
    /// Show the date on its own.
    Omit,
    /// Show this clock time instead, typically the current local time.
    Clock(Time),
}

fn settings_or_default(settings: Option<&UserFormatSettings>) -> &UserFormatSettings {
    static DEFAULT_SETTINGS: OnceLock<UserFormatSettings> = OnceLock::new();

    settings.unwrap_or_else(|| DEFAULT_SETTINGS.get_or_init(UserFormatSettings::default))
}

/// The symbol for `currency_code`, matched case-insensitively.
pub fn currency_symbol(currency_code: &str) -> &'static str {
    CURRENCY_SYMBOLS
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(currency_code))
        .map_or(FALLBACK_CURRENCY_SYMBOL, |(_, symbol)| *symbol)
}

/// Format `amount` as money, e.g. "$1,234.50" or "₹15,00,000".
///
/// The symbol is always a prefix. Negative amounts are rendered as
/// "-$12.00". Non-finite amounts are rendered as zero.
pub fn format_currency(amount: f64, settings: Option<&UserFormatSettings>) -> String {
    let settings = settings_or_default(settings);
    let amount = finite_or_zero(amount);
    let symbol = currency_symbol(&settings.currency_code);
    let places = decimal_places(amount.abs(), settings.decimal_format);
    let rounded = round_to_places(amount.abs(), places);

    let digits = match settings.number_format {
        NumberFormat::Lakh if rounded >= LAKH => lakh_digits(rounded, places),
        policy => numfmt_digits(rounded, places, policy),
    };
    let sign = if amount < 0.0 && rounded > 0.0 { "-" } else { "" };

    format!("{sign}{symbol}{digits}")
}

fn finite_or_zero(amount: f64) -> f64 {
    if amount.is_finite() {
        amount
    } else {
        tracing::warn!("cannot format non-finite amount {amount}, using zero");
        0.0
    }
}

fn decimal_places(magnitude: f64, policy: DecimalFormat) -> u8 {
    match policy {
        DecimalFormat::Readable if magnitude.fract() == 0.0 => 0,
        DecimalFormat::Readable => 2,
        DecimalFormat::Whole => 0,
        DecimalFormat::OneDecimal => 1,
        DecimalFormat::TwoDecimals => 2,
    }
}

fn round_to_places(magnitude: f64, places: u8) -> f64 {
    let scale = 10_f64.powi(i32::from(places));

    (magnitude * scale).round() / scale
}

/// Formatters for 0 to [MAX_DECIMAL_PLACES] decimal places, indexed by the
/// number of places.
fn number_formatters(policy: NumberFormat) -> &'static [Formatter] {
    static GROUPED: OnceLock<Vec<Formatter>> = OnceLock::new();
    static PLAIN: OnceLock<Vec<Formatter>> = OnceLock::new();

    match policy {
        NumberFormat::Western | NumberFormat::Lakh => {
            GROUPED.get_or_init(|| build_number_formatters(Some(',')))
        }
        NumberFormat::Plain => PLAIN.get_or_init(|| build_number_formatters(None)),
    }
}

fn build_number_formatters(separator: Option<char>) -> Vec<Formatter> {
    (0..=MAX_DECIMAL_PLACES)
        .map_while(|places| {
            let formatter = Formatter::new().precision(Precision::Decimals(places));

            match separator {
                Some(separator) => formatter
                    .separator(separator)
                    .inspect_err(|error| {
                        tracing::error!("could not create number formatter: {error:?}")
                    })
                    .ok(),
                None => Some(formatter),
            }
        })
        .collect()
}

/// The digits of `rounded` with exactly `places` decimals.
fn numfmt_digits(rounded: f64, places: u8, policy: NumberFormat) -> String {
    match number_formatters(policy).get(usize::from(places)) {
        Some(formatter) => pad_decimals(&formatter.fmt_string(rounded), places),
        None => {
            let places = usize::from(places);
            format!("{rounded:.places$}")
        }
    }
}

/// numfmt drops trailing zeros, e.g. "12.30" comes out as "12.3" and zero
/// as "0", so the fraction is padded back out to `places` digits.
fn pad_decimals(digits: &str, places: u8) -> String {
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if places == 0 {
        return whole.to_owned();
    }

    let fraction: String = fraction
        .chars()
        .chain(std::iter::repeat('0'))
        .take(usize::from(places))
        .collect();

    format!("{whole}.{fraction}")
}

/// South Asian grouping: the last three digits, then pairs, e.g. "12,34,567".
fn lakh_digits(rounded: f64, places: u8) -> String {
    let places = usize::from(places);
    let fixed = format!("{rounded:.places$}");
    let (whole, fraction) = match fixed.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let (head, tail) = whole.split_at(whole.len().saturating_sub(3));
    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    groups.push(tail);
    let grouped = groups.join(",");

    match fraction {
        Some(fraction) => format!("{grouped}.{fraction}"),
        None => grouped,
    }
}

/// Format a time of day, e.g. "1:05 PM" or "13:05".
///
/// Hours wrap at 24 and minutes at 60.
pub fn format_time(hour: u8, minute: u8, settings: Option<&UserFormatSettings>) -> String {
    let time = Time::from_hms(hour % 24, minute % 60, 0).unwrap_or(Time::MIDNIGHT);

    format_clock_time(time, settings)
}

/// Format `time` with the user's clock style.
pub fn format_clock_time(time: Time, settings: Option<&UserFormatSettings>) -> String {
    let formatted = match settings_or_default(settings).time_format {
        TimeFormat::TwentyFourHour => time.format(format_description!("[hour]:[minute]")),
        TimeFormat::TwelveHour => time.format(format_description!(
            "[hour repr:12 padding:none]:[minute] [period]"
        )),
    };

    formatted.unwrap_or_else(|error| {
        tracing::warn!("could not format time {time}: {error}");
        format!("{:02}:{:02}", time.hour(), time.minute())
    })
}

/// Format a calendar date for display, e.g. "Jan 5, 2024".
pub fn format_date(date: Date) -> String {
    date.format(format_description!(
        "[month repr:short] [day padding:none], [year]"
    ))
    .unwrap_or_else(|error| {
        tracing::warn!("could not format date {date}: {error}");
        date.to_string()
    })
}

/// Format a date with an optional time of day, e.g. "Jan 5, 2024, 1:05 PM".
///
/// When `time` is `None`, `missing_time` decides whether a substitute clock
/// time is shown or the date is shown on its own.
pub fn format_date_time(
    date: Date,
    time: Option<Time>,
    settings: Option<&UserFormatSettings>,
    missing_time: MissingTime,
) -> String {
    let time = time.or(match missing_time {
        MissingTime::Clock(now) => Some(now),
        MissingTime::Omit => None,
    });

    match time {
        Some(time) => format!(
            "{}, {}",
            format_date(date),
            format_clock_time(time, settings)
        ),
        None => format_date(date),
    }
}

/// Format large amounts with a magnitude suffix, e.g. "$1.5M".
///
/// Amounts under one thousand are formatted with [format_currency].
pub fn format_compact_number(amount: f64, settings: Option<&UserFormatSettings>) -> String {
    const SCALES: [(f64, &str); 3] = [(1e3, "K"), (1e6, "M"), (1e9, "B")];

    let settings = settings_or_default(settings);
    let amount = finite_or_zero(amount);
    let magnitude = amount.abs();

    // Pick the largest scale that fits, moving up one more when rounding to
    // one decimal would print "1000.0" with the smaller suffix.
    let Some(mut scale) = SCALES.iter().rposition(|(divisor, _)| magnitude >= *divisor) else {
        return format_currency(amount, Some(settings));
    };
    if scale + 1 < SCALES.len() && round_to_places(magnitude / SCALES[scale].0, 1) >= 1000.0 {
        scale += 1;
    }
    let (divisor, suffix) = SCALES[scale];

    let sign = if amount < 0.0 { "-" } else { "" };
    let symbol = currency_symbol(&settings.currency_code);

    format!("{sign}{symbol}{:.1}{suffix}", magnitude / divisor)
}

/// Format `value` as a percentage with `decimals` decimal places, e.g. "12.5%".
pub fn format_percentage(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}%")
}

#[cfg(test)]
mod tests {
    use time::macros::{date, time};

    use crate::settings::{DecimalFormat, NumberFormat, TimeFormat, UserFormatSettings};

    use super::{
        DEFAULT_PERCENTAGE_DECIMALS, MissingTime, currency_symbol, format_compact_number,
        format_currency, format_date, format_date_time, format_percentage, format_time,
    };

    fn settings(
        decimal_format: DecimalFormat,
        number_format: NumberFormat,
        currency_code: &str,
    ) -> UserFormatSettings {
        UserFormatSettings {
            decimal_format,
            number_format,
            currency_code: currency_code.to_owned(),
            ..Default::default()
        }
    }

    fn with_time_format(time_format: TimeFormat) -> UserFormatSettings {
        UserFormatSettings {
            time_format,
            ..Default::default()
        }
    }

    #[test]
    fn two_decimals_with_thousands_grouping() {
        let settings = settings(DecimalFormat::TwoDecimals, NumberFormat::Western, "USD");

        assert_eq!(format_currency(1234.5, Some(&settings)), "$1,234.50");
    }

    #[test]
    fn lakh_grouping_from_one_lakh() {
        let settings = settings(DecimalFormat::Readable, NumberFormat::Lakh, "INR");

        assert_eq!(format_currency(1_500_000.0, Some(&settings)), "₹15,00,000");
        assert_eq!(format_currency(100_000.0, Some(&settings)), "₹1,00,000");
        assert_eq!(format_currency(123_456_789.0, Some(&settings)), "₹12,34,56,789");
    }

    #[test]
    fn lakh_grouping_below_one_lakh_uses_thousands() {
        let settings = settings(DecimalFormat::Readable, NumberFormat::Lakh, "INR");

        assert_eq!(format_currency(99_999.0, Some(&settings)), "₹99,999");
        assert_eq!(format_currency(1_234.0, Some(&settings)), "₹1,234");
    }

    #[test]
    fn plain_numbers_are_not_grouped() {
        let settings = settings(DecimalFormat::TwoDecimals, NumberFormat::Plain, "EUR");

        assert_eq!(format_currency(1_234_567.891, Some(&settings)), "€1234567.89");
    }

    #[test]
    fn readable_decimals_depend_on_fraction() {
        let settings = settings(DecimalFormat::Readable, NumberFormat::Western, "USD");

        assert_eq!(format_currency(1234.0, Some(&settings)), "$1,234");
        assert_eq!(format_currency(1234.5, Some(&settings)), "$1,234.50");
        assert_eq!(format_currency(0.0, Some(&settings)), "$0");
    }

    #[test]
    fn fixed_decimal_policies() {
        let whole = settings(DecimalFormat::Whole, NumberFormat::Western, "USD");
        let one = settings(DecimalFormat::OneDecimal, NumberFormat::Western, "USD");

        assert_eq!(format_currency(1234.56, Some(&whole)), "$1,235");
        assert_eq!(format_currency(1234.56, Some(&one)), "$1,234.6");
        assert_eq!(format_currency(12.0, Some(&one)), "$12.0");
    }

    #[test]
    fn negative_amounts_put_sign_before_symbol() {
        let settings = settings(DecimalFormat::TwoDecimals, NumberFormat::Western, "GBP");

        assert_eq!(format_currency(-2500.25, Some(&settings)), "-£2,500.25");
    }

    #[test]
    fn negative_amounts_that_round_to_zero_have_no_sign() {
        let settings = settings(DecimalFormat::Whole, NumberFormat::Western, "USD");

        assert_eq!(format_currency(-0.2, Some(&settings)), "$0");
    }

    #[test]
    fn lakh_grouping_applies_when_rounding_reaches_one_lakh() {
        let settings = settings(DecimalFormat::Whole, NumberFormat::Lakh, "INR");

        assert_eq!(format_currency(99_999.6, Some(&settings)), "₹1,00,000");
        assert_eq!(format_currency(99_999.4, Some(&settings)), "₹99,999");
    }

    #[test]
    fn rounding_carries_into_thousands_group() {
        let settings = settings(DecimalFormat::TwoDecimals, NumberFormat::Western, "USD");

        assert_eq!(format_currency(999.999, Some(&settings)), "$1,000.00");
        assert_eq!(format_currency(0.0, Some(&settings)), "$0.00");
        assert_eq!(format_currency(0.1, Some(&settings)), "$0.10");
    }

    #[test]
    fn non_finite_amounts_format_as_zero() {
        let settings = settings(DecimalFormat::TwoDecimals, NumberFormat::Western, "USD");

        assert_eq!(format_currency(f64::NAN, Some(&settings)), "$0.00");
        assert_eq!(format_currency(f64::INFINITY, Some(&settings)), "$0.00");
        assert_eq!(format_compact_number(f64::NEG_INFINITY, Some(&settings)), "$0.00");
    }

    #[test]
    fn unknown_currency_uses_dollar_sign() {
        assert_eq!(currency_symbol("XYZ"), "$");
        assert_eq!(currency_symbol("inr"), "₹");

        let settings = settings(DecimalFormat::Readable, NumberFormat::Western, "XYZ");
        assert_eq!(format_currency(10.0, Some(&settings)), "$10");
    }

    #[test]
    fn missing_settings_use_defaults() {
        assert_eq!(format_currency(1234.5, None), "$1,234.50");
        assert_eq!(format_time(13, 0, None), "1:00 PM");
    }

    #[test]
    fn twelve_hour_clock() {
        let settings = with_time_format(TimeFormat::TwelveHour);

        assert_eq!(format_time(0, 5, Some(&settings)), "12:05 AM");
        assert_eq!(format_time(12, 0, Some(&settings)), "12:00 PM");
        assert_eq!(format_time(13, 0, Some(&settings)), "1:00 PM");
        assert_eq!(format_time(23, 59, Some(&settings)), "11:59 PM");
    }

    #[test]
    fn twenty_four_hour_clock() {
        let settings = with_time_format(TimeFormat::TwentyFourHour);

        assert_eq!(format_time(13, 0, Some(&settings)), "13:00");
        assert_eq!(format_time(0, 5, Some(&settings)), "00:05");
    }

    #[test]
    fn out_of_range_time_wraps() {
        let settings = with_time_format(TimeFormat::TwentyFourHour);

        assert_eq!(format_time(25, 61, Some(&settings)), "01:01");
    }

    #[test]
    fn formats_dates() {
        assert_eq!(format_date(date!(2024 - 01 - 05)), "Jan 5, 2024");
        assert_eq!(format_date(date!(2023 - 12 - 31)), "Dec 31, 2023");
    }

    #[test]
    fn date_time_uses_recorded_time() {
        let settings = with_time_format(TimeFormat::TwentyFourHour);

        let formatted = format_date_time(
            date!(2024 - 01 - 05),
            Some(time!(18:30)),
            Some(&settings),
            MissingTime::Clock(time!(09:00)),
        );

        assert_eq!(formatted, "Jan 5, 2024, 18:30");
    }

    #[test]
    fn date_time_without_time_follows_missing_time_policy() {
        let date = date!(2024 - 01 - 05);

        assert_eq!(
            format_date_time(date, None, None, MissingTime::Omit),
            "Jan 5, 2024"
        );
        assert_eq!(
            format_date_time(date, None, None, MissingTime::Clock(time!(09:15))),
            "Jan 5, 2024, 9:15 AM"
        );
    }

    #[test]
    fn compact_numbers_use_suffixes() {
        assert_eq!(format_compact_number(2_500_000_000.0, None), "$2.5B");
        assert_eq!(format_compact_number(1_500_000.0, None), "$1.5M");
        assert_eq!(format_compact_number(1_000.0, None), "$1.0K");
        assert_eq!(format_compact_number(-12_300.0, None), "-$12.3K");
    }

    #[test]
    fn compact_numbers_move_up_a_suffix_when_rounding_reaches_one_thousand() {
        assert_eq!(format_compact_number(999_999.0, None), "$1.0M");
        assert_eq!(format_compact_number(-999_960.0, None), "-$1.0M");
        assert_eq!(format_compact_number(999_940.0, None), "$999.9K");
        assert_eq!(format_compact_number(999_999_999.0, None), "$1.0B");
    }

    #[test]
    fn compact_numbers_below_one_thousand_are_currency() {
        let settings = settings(DecimalFormat::TwoDecimals, NumberFormat::Western, "EUR");

        assert_eq!(format_compact_number(999.0, Some(&settings)), "€999.00");
    }

    #[test]
    fn formats_percentages() {
        assert_eq!(format_percentage(12.345, DEFAULT_PERCENTAGE_DECIMALS), "12.3%");
        assert_eq!(format_percentage(50.0, 0), "50%");
        assert_eq!(format_percentage(-4.25, 2), "-4.25%");
    }
}
