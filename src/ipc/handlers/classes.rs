use crate::auth;
use crate::error::AppResult;
use crate::ipc::error::respond;
use crate::ipc::params::{get_required_str, str_or_empty};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use serde_json::json;

fn handle_classes_list(state: &mut AppState) -> AppResult<serde_json::Value> {
    auth::require(
        state.session.as_ref(),
        &[Role::Student, Role::Teacher, Role::Admin],
    )?;
    let classes = state.store.classes();
    Ok(json!({ "rows": classes, "total": classes.len() }))
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    auth::require(state.session.as_ref(), &[Role::Admin])?;
    let class = state.store.create_class(
        str_or_empty(&req.params, "nama"),
        str_or_empty(&req.params, "tingkat"),
    )?;
    tracing::info!(class = %class.name, id = %class.id, "class created");
    Ok(json!({ "class": class }))
}

fn handle_classes_toggle(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    auth::require(state.session.as_ref(), &[Role::Admin])?;
    let class_id = get_required_str(&req.params, "classId")?;
    let class = state.store.toggle_class(&class_id)?;
    tracing::info!(class = %class.name, aktif = class.active, "class toggled");
    Ok(json!({ "class": class }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "classes.list" => handle_classes_list(state),
        "classes.create" => handle_classes_create(state, req),
        "classes.toggle" => handle_classes_toggle(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
