//! Request parameter readers. Form fields report `required_field_missing`,
//! protocol fields report `bad_params`.

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::model::VitalField;
use crate::validate;
use crate::view::{SortDir, ViewQuery};

pub fn opt_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

pub fn str_or_empty<'a>(params: &'a Value, key: &str) -> &'a str {
    opt_str(params, key).unwrap_or("")
}

pub fn get_required_str(params: &Value, key: &str) -> AppResult<String> {
    opt_str(params, key)
        .map(|s| s.to_string())
        .ok_or_else(|| AppError::BadParams(format!("missing params.{}", key)))
}

/// Trimmed, non-empty form text.
pub fn form_text(params: &Value, key: &str) -> AppResult<String> {
    validate::required_text(opt_str(params, key), key)
}

/// Explicit `tanggal`, else the local calendar day.
pub fn date_or_today(params: &Value, key: &str) -> AppResult<NaiveDate> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(chrono::Local::now().date_naive()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(chrono::Local::now().date_naive()),
        Some(Value::String(s)) => validate::parse_date(s),
        Some(other) => Err(AppError::InvalidDate(other.to_string())),
    }
}

/// Number or numeric string. Text that is not a number comes back as NaN and
/// fails the range check.
pub fn vital(params: &Value, field: VitalField) -> AppResult<f64> {
    match params.get(field.as_str()) {
        None | Some(Value::Null) => Err(AppError::required(field.as_str())),
        Some(Value::String(s)) if s.trim().is_empty() => Err(AppError::required(field.as_str())),
        Some(Value::String(s)) => Ok(s.trim().parse::<f64>().unwrap_or(f64::NAN)),
        Some(v) => Ok(v.as_f64().unwrap_or(f64::NAN)),
    }
}

pub fn opt_year(params: &Value, key: &str) -> AppResult<Option<i32>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if crate::view::is_no_filter(s) => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| AppError::BadParams(format!("{} must be a year", key))),
        Some(v) => v
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| AppError::BadParams(format!("{} must be a year", key))),
    }
}

/// `search`, `sortBy`, `sortDir` plus the screen's categorical filter key.
pub fn view_query(params: &Value, filter_key: &str) -> AppResult<ViewQuery> {
    let sort = match opt_str(params, "sortBy") {
        Some(col) if !col.is_empty() => Some((
            col.to_string(),
            SortDir::parse(str_or_empty(params, "sortDir"))?,
        )),
        _ => None,
    };
    Ok(ViewQuery {
        filter: opt_str(params, filter_key).map(|v| (filter_key.to_string(), v.to_string())),
        search: str_or_empty(params, "search").to_string(),
        sort,
    })
}
