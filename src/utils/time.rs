use crate::config::{Config, DEFAULT_DATE_FORMAT};
use crate::error::{config_error, AppResult};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use std::fmt::Write;

/// How event dates are shown to the user
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySettings {
    pub timezone: Tz,
    pub date_format: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl DisplaySettings {
    pub fn from_config(config: &Config) -> AppResult<Self> {
        check_date_format(&config.date_format)?;
        Ok(Self {
            timezone: config.tz()?,
            date_format: config.date_format.clone(),
        })
    }
}

/// Reject strftime strings chrono cannot render
pub fn check_date_format(format: &str) -> AppResult<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(config_error(&format!("Invalid date format: {}", format)));
    }
    Ok(())
}

/// Parse a stored event date into wall-clock time in `tz`.
///
/// Accepts RFC 3339 timestamps (converted into `tz`), naive date-times
/// (already local) and plain `YYYY-MM-DD` dates (midnight).
pub fn parse_event_datetime(raw: &str, tz: Tz) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&tz).naive_local());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Whether a date string can be displayed at all
pub fn is_valid_event_date(raw: &str) -> bool {
    parse_event_datetime(raw, Tz::UTC).is_some()
}

/// Format the calendar date of a stored event date, or `None` when unparseable
pub fn format_event_date(raw: &str, settings: &DisplaySettings) -> Option<String> {
    let date = parse_event_datetime(raw, settings.timezone)?.date();

    let mut out = String::new();
    if write!(out, "{}", date.format(&settings.date_format)).is_err() {
        out.clear();
        write!(out, "{}", date.format(DEFAULT_DATE_FORMAT)).ok()?;
    }
    Some(out)
}

/// Current time as stored in `createdAt`
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
