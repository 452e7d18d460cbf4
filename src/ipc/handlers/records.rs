use crate::auth;
use crate::error::{AppError, AppResult};
use crate::ipc::error::respond;
use crate::ipc::handlers::{own_student_id, scoped_records};
use crate::ipc::params::{date_or_today, get_required_str, str_or_empty, view_query, vital};
use crate::ipc::types::{AppState, Request};
use crate::model::{Role, VitalField, Vitals};
use crate::store::Upsert;
use crate::view::apply_view;
use serde_json::json;

fn handle_list(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let who = auth::require(
        state.session.as_ref(),
        &[Role::Student, Role::Teacher, Role::Admin],
    )?;
    let base = scoped_records(&state.store, who);
    let base_total = base.len();
    let rows = apply_view(base, &view_query(&req.params, "status")?)?;
    Ok(json!({
        "rows": rows,
        "total": rows.len(),
        "baseTotal": base_total,
    }))
}

fn handle_today(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let who = auth::require(state.session.as_ref(), &[Role::Student])?;
    let student_id = own_student_id(&state.store, who)?;
    let date = date_or_today(&req.params, "tanggal")?;
    Ok(json!({
        "tanggal": date,
        "record": state.store.record_for_day(&student_id, date),
    }))
}

fn handle_upsert_daily(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let who = auth::require(state.session.as_ref(), &[Role::Student])?;
    let student_id = own_student_id(&state.store, who)?;
    let date = date_or_today(&req.params, "tanggal")?;
    let vitals = Vitals {
        temperature_c: vital(&req.params, VitalField::Temperature)?,
        weight_kg: vital(&req.params, VitalField::Weight)?,
        height_cm: vital(&req.params, VitalField::Height)?,
    };
    let complaint = str_or_empty(&req.params, "keluhan").trim().to_string();

    let (outcome, record) = state.store.upsert_daily_record(
        &student_id,
        date,
        vitals,
        &complaint,
        chrono::Utc::now(),
    )?;
    tracing::info!(
        student = %student_id,
        tanggal = %date,
        record = %record.id,
        created = outcome == Upsert::Created,
        "daily check-in saved"
    );
    Ok(json!({
        "record": record,
        "created": outcome == Upsert::Created,
    }))
}

fn handle_by_student(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let who = auth::require(
        state.session.as_ref(),
        &[Role::Student, Role::Teacher, Role::Admin],
    )?;
    let student_id = get_required_str(&req.params, "studentId")?;
    match who.role() {
        Role::Student => {
            if own_student_id(&state.store, who)? != student_id {
                return Err(AppError::Forbidden("students only see their own records".into()));
            }
        }
        Role::Teacher => {
            let student = state
                .store
                .student(&student_id)
                .ok_or_else(|| AppError::not_found("student", student_id.as_str()))?;
            auth::require_class_access(who, &student.class_label)?;
        }
        Role::Admin => {}
    }
    let rows = state.store.records_by_student(&student_id);
    Ok(json!({ "rows": rows, "total": rows.len() }))
}

fn handle_respond(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let who = auth::require(state.session.as_ref(), &[Role::Teacher])?;
    let record_id = get_required_str(&req.params, "recordId")?;
    let class_label = state
        .store
        .record(&record_id)
        .map(|r| r.class_label.clone())
        .ok_or_else(|| AppError::not_found("record", record_id.as_str()))?;
    auth::require_class_access(who, &class_label)?;
    let teacher = who.username().to_string();

    let record = state
        .store
        .respond_to_record(&record_id, str_or_empty(&req.params, "tanggapan"))?;
    tracing::info!(record = %record.id, teacher = %teacher, "response recorded");
    Ok(json!({ "record": record }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "records.list" => handle_list(state, req),
        "records.today" => handle_today(state, req),
        "records.upsertDaily" => handle_upsert_daily(state, req),
        "records.byStudent" => handle_by_student(state, req),
        "records.respond" => handle_respond(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
