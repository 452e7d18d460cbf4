use crate::error::{AppError, AppResult};
use crate::ipc::error::respond;
use crate::ipc::params::get_required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState) -> AppResult<serde_json::Value> {
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
        "authenticated": state.session.is_some(),
    }))
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let path = PathBuf::from(get_required_str(&req.params, "path")?);
    state
        .open_workspace(&path)
        .map_err(|e| AppError::Storage(format!("failed to open workspace: {e:#}")))?;
    tracing::info!(workspace = %path.to_string_lossy(), restored = state.session.is_some(), "workspace selected");
    Ok(json!({
        "workspacePath": path.to_string_lossy(),
        "user": state.session,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "health" => handle_health(state),
        "workspace.select" => handle_workspace_select(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
