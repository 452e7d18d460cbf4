use crate::auth;
use crate::error::{AppError, AppResult};
use crate::export;
use crate::ipc::error::respond;
use crate::ipc::handlers::{own_student_id, scoped_records};
use crate::ipc::params::{date_or_today, get_required_str, opt_str, opt_year};
use crate::ipc::types::{AppState, Request};
use crate::model::{Identity, Role};
use crate::summary;
use crate::view::is_no_filter;
use serde_json::json;
use std::path::PathBuf;

fn handle_dashboard_summary(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let who = auth::require(
        state.session.as_ref(),
        &[Role::Student, Role::Teacher, Role::Admin],
    )?;
    let today = date_or_today(&req.params, "tanggal")?;
    let body = match who {
        Identity::Student { .. } => {
            let student_id = own_student_id(&state.store, who)?;
            serde_json::to_value(summary::student_summary(&state.store, &student_id, today))
        }
        Identity::Teacher { class_label, .. } => {
            serde_json::to_value(summary::class_summary(&state.store, class_label, today))
        }
        Identity::Admin { .. } => {
            serde_json::to_value(summary::admin_summary(&state.store, today))
        }
    }
    .map_err(anyhow::Error::from)?;
    Ok(json!({
        "role": who.role(),
        "tanggal": today,
        "summary": body,
    }))
}

/// Class to report on: teachers are pinned to their own class, admins may pick
/// one or leave it open.
fn report_class<'a>(who: &'a Identity, requested: Option<&'a str>) -> Option<&'a str> {
    match who {
        Identity::Teacher { class_label, .. } => Some(class_label.as_str()),
        _ => requested.filter(|k| !is_no_filter(k)),
    }
}

fn handle_monthly(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let who = auth::require(state.session.as_ref(), &[Role::Teacher, Role::Admin])?;
    let class_label = report_class(who, opt_str(&req.params, "kelas"));
    let year = opt_year(&req.params, "tahun")?;
    let rows = state.store.monthly_reports(class_label, year);
    Ok(json!({
        "rows": rows,
        "total": rows.len(),
        "kelas": class_label,
        "tahun": year,
    }))
}

fn handle_export_bundle(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let who = auth::require(state.session.as_ref(), &[Role::Teacher, Role::Admin])?;
    let out_path = PathBuf::from(get_required_str(&req.params, "outPath")?);
    let class_label = report_class(who, None);
    let scope = class_label.unwrap_or("all").to_string();

    let records = scoped_records(&state.store, who)
        .into_iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(anyhow::Error::from)?;
    let reports = state
        .store
        .monthly_reports(class_label, None)
        .into_iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(anyhow::Error::from)?;

    let summary = export::export_report_bundle(&out_path, &scope, &records, &reports)
        .map_err(|e| AppError::Storage(format!("{e:#}")))?;
    tracing::info!(
        out = %out_path.to_string_lossy(),
        scope = %scope,
        records = summary.record_count,
        "report bundle exported"
    );
    Ok(json!({
        "outPath": out_path.to_string_lossy(),
        "bundleFormat": summary.bundle_format,
        "entryCount": summary.entry_count,
        "recordCount": summary.record_count,
        "scope": scope,
    }))
}

fn handle_verify_bundle(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    auth::require(state.session.as_ref(), &[Role::Teacher, Role::Admin])?;
    let in_path = PathBuf::from(get_required_str(&req.params, "inPath")?);
    let summary = export::verify_report_bundle(&in_path)
        .map_err(|e| AppError::BadParams(format!("{e:#}")))?;
    Ok(json!({
        "valid": true,
        "bundleFormat": summary.bundle_format,
        "scope": summary.scope,
        "recordCount": summary.record_count,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "dashboard.summary" => handle_dashboard_summary(state, req),
        "reports.monthly" => handle_monthly(state, req),
        "reports.exportBundle" => handle_export_bundle(state, req),
        "reports.verifyBundle" => handle_verify_bundle(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
