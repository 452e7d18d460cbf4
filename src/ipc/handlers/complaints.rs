use crate::auth;
use crate::error::AppResult;
use crate::ipc::error::respond;
use crate::ipc::handlers::{own_student_id, scoped_records};
use crate::ipc::params::{date_or_today, str_or_empty, view_query};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use crate::store::Upsert;
use crate::view::apply_view;
use serde_json::json;

fn handle_list(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let who = auth::require(
        state.session.as_ref(),
        &[Role::Student, Role::Teacher, Role::Admin],
    )?;
    let base: Vec<_> = scoped_records(&state.store, who)
        .into_iter()
        .filter(|r| r.has_complaint())
        .collect();
    let base_total = base.len();
    let rows = apply_view(base, &view_query(&req.params, "status")?)?;
    Ok(json!({
        "rows": rows,
        "total": rows.len(),
        "baseTotal": base_total,
    }))
}

fn handle_submit(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let who = auth::require(state.session.as_ref(), &[Role::Student])?;
    let student_id = own_student_id(&state.store, who)?;
    let date = date_or_today(&req.params, "tanggal")?;
    let text = str_or_empty(&req.params, "keluhan").trim().to_string();

    let (outcome, record) =
        state
            .store
            .submit_complaint(&student_id, date, &text, chrono::Utc::now())?;
    tracing::info!(
        student = %student_id,
        tanggal = %date,
        record = %record.id,
        "complaint submitted"
    );
    Ok(json!({
        "record": record,
        "created": outcome == Upsert::Created,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "complaints.list" => handle_list(state, req),
        "complaints.submit" => handle_submit(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
