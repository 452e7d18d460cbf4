use chrono::{NaiveDate, NaiveTime};

use crate::error::{AppError, AppResult};
use crate::model::{VitalField, Vitals};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Range check in form order; the first offending field is reported.
pub fn check_vitals(v: &Vitals) -> AppResult<()> {
    for field in VitalField::ALL {
        check_vital(field, v.get(field))?;
    }
    Ok(())
}

pub fn check_vital(field: VitalField, value: f64) -> AppResult<()> {
    let (min, max) = field.range();
    // NaN fails `contains`, so unparseable input lands here too.
    if !(min..=max).contains(&value) {
        return Err(AppError::OutOfRange { field, min, max });
    }
    Ok(())
}

pub fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| AppError::InvalidDate(raw.to_string()))
}

/// "HH:MM" for the daily input window.
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

/// Trimmed, non-empty text or `RequiredFieldMissing(field)`.
pub fn required_text(value: Option<&str>, field: &str) -> AppResult<String> {
    match value.map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(AppError::required(field)),
    }
}

pub fn confirm_password(password: &str, confirmation: &str) -> AppResult<()> {
    if password != confirmation {
        return Err(AppError::PasswordMismatch);
    }
    Ok(())
}
