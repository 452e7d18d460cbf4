use crate::auth;
use crate::error::AppResult;
use crate::ipc::error::respond;
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use serde_json::json;

/// Read-only. Nothing in the daemon creates notifications yet; only the seeded
/// ones are listed.
fn handle_list(state: &mut AppState) -> AppResult<serde_json::Value> {
    let who = auth::require(
        state.session.as_ref(),
        &[Role::Student, Role::Teacher, Role::Admin],
    )?;
    let rows = match state.store.directory_id(who) {
        Some(id) => state.store.notifications_for(who.role(), id),
        None => Vec::new(),
    };
    let unread = rows.iter().filter(|n| !n.read).count();
    Ok(json!({
        "rows": rows,
        "total": rows.len(),
        "unread": unread,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "notifications.list" => handle_list(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
