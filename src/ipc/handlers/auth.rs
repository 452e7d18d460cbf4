use crate::auth::{self, resolve_route};
use crate::db;
use crate::error::{AppError, AppResult};
use crate::ipc::error::respond;
use crate::ipc::params::{get_required_str, str_or_empty};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use serde_json::json;

const ANY_ROLE: &[Role] = &[Role::Student, Role::Teacher, Role::Admin];

fn handle_login(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let username = str_or_empty(&req.params, "username");
    let password = str_or_empty(&req.params, "password");

    let identity = match auth::authenticate(state.store.accounts(), username, password) {
        Ok(v) => v,
        Err(e) => {
            if matches!(e, AppError::InvalidCredentials) {
                tracing::warn!(username, "login rejected");
            }
            return Err(e);
        }
    };

    if let Some(conn) = state.db.as_ref() {
        db::session_save(conn, &identity)?;
    }
    tracing::info!(username, role = identity.role().as_str(), "login");

    let redirect = identity.role().landing_path();
    state.session = Some(identity);
    Ok(json!({
        "user": state.session,
        "redirect": redirect,
    }))
}

fn handle_logout(state: &mut AppState) -> AppResult<serde_json::Value> {
    let who = auth::require(state.session.as_ref(), ANY_ROLE)?;
    tracing::info!(username = who.username(), "logout");
    if let Some(conn) = state.db.as_ref() {
        db::session_clear(conn)?;
    }
    state.session = None;
    Ok(json!({ "redirect": "/login" }))
}

fn handle_session(state: &mut AppState) -> AppResult<serde_json::Value> {
    Ok(json!({ "user": state.session }))
}

fn handle_change_password(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let who = auth::require(state.session.as_ref(), ANY_ROLE)?;
    let username = who.username().to_string();
    state.store.change_password(
        &username,
        str_or_empty(&req.params, "oldPassword"),
        str_or_empty(&req.params, "newPassword"),
        str_or_empty(&req.params, "confirmPassword"),
    )?;
    tracing::info!(username = %username, "password changed");
    Ok(json!({ "ok": true }))
}

fn handle_nav_resolve(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let path = get_required_str(&req.params, "path")?;
    let route = resolve_route(&path, state.session.as_ref());
    Ok(serde_json::to_value(route).map_err(anyhow::Error::from)?)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "auth.login" => handle_login(state, req),
        "auth.logout" => handle_logout(state),
        "auth.session" => handle_session(state),
        "auth.changePassword" => handle_change_password(state, req),
        "nav.resolve" => handle_nav_resolve(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
