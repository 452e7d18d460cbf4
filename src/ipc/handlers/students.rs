use crate::auth;
use crate::error::{AppError, AppResult};
use crate::ipc::error::respond;
use crate::ipc::params::{form_text, get_required_str, opt_str, view_query};
use crate::ipc::types::{AppState, Request};
use crate::model::{Gender, Identity, Role};
use crate::store::NewUser;
use crate::validate;
use crate::view::apply_view;
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let who = auth::require(state.session.as_ref(), &[Role::Teacher, Role::Admin])?;
    let base = match who {
        Identity::Teacher { class_label, .. } => state.store.students_by_class(class_label),
        _ => state.store.all_students(),
    };
    let base_total = base.len();
    let rows = apply_view(base, &view_query(&req.params, "kelas")?)?;
    Ok(json!({
        "rows": rows,
        "total": rows.len(),
        "baseTotal": base_total,
        "kelasOptions": state.store.class_labels(),
    }))
}

fn handle_teachers_list(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    auth::require(state.session.as_ref(), &[Role::Admin])?;
    let base = state.store.all_teachers();
    let base_total = base.len();
    let rows = apply_view(base, &view_query(&req.params, "kelas")?)?;
    Ok(json!({
        "rows": rows,
        "total": rows.len(),
        "baseTotal": base_total,
        "kelasOptions": state.store.class_labels(),
    }))
}

fn parse_role(params: &serde_json::Value) -> AppResult<Role> {
    let raw = get_required_str(params, "role")?;
    Role::parse(&raw).ok_or_else(|| AppError::BadParams(format!("unknown role: {}", raw)))
}

fn parse_gender(params: &serde_json::Value) -> AppResult<Gender> {
    match opt_str(params, "jenisKelamin") {
        None => Ok(Gender::L),
        Some(s) => Gender::parse(s)
            .ok_or_else(|| AppError::BadParams("jenisKelamin must be L or P".into())),
    }
}

fn optional_text(params: &serde_json::Value, key: &str) -> String {
    opt_str(params, key).unwrap_or("").trim().to_string()
}

/// Reads the add-user form for `role`: required fields in form order, then the
/// password confirmation.
fn parse_new_user(params: &serde_json::Value, role: Role) -> AppResult<NewUser> {
    let user = match role {
        Role::Student => {
            let name = form_text(params, "nama")?;
            let nis = form_text(params, "nis")?;
            let class_label = form_text(params, "kelas")?;
            let username = form_text(params, "username")?;
            let password = form_text(params, "password")?;
            let birth_date = match opt_str(params, "tanggalLahir").map(str::trim) {
                Some(s) if !s.is_empty() => Some(validate::parse_date(s)?),
                _ => None,
            };
            NewUser::Student {
                name,
                nis,
                class_label,
                gender: parse_gender(params)?,
                birth_date,
                address: optional_text(params, "alamat"),
                parent_name: optional_text(params, "namaOrangTua"),
                parent_phone: optional_text(params, "teleponOrangTua"),
                username,
                password,
            }
        }
        Role::Teacher => {
            let name = form_text(params, "nama")?;
            let nip = form_text(params, "nip")?;
            let class_label = form_text(params, "kelas")?;
            let username = form_text(params, "username")?;
            let password = form_text(params, "password")?;
            NewUser::Teacher {
                name,
                nip,
                class_label,
                gender: parse_gender(params)?,
                phone: optional_text(params, "telepon"),
                address: optional_text(params, "alamat"),
                username,
                password,
            }
        }
        Role::Admin => NewUser::Admin {
            name: form_text(params, "nama")?,
            username: form_text(params, "username")?,
            password: form_text(params, "password")?,
        },
    };

    let password = match &user {
        NewUser::Student { password, .. }
        | NewUser::Teacher { password, .. }
        | NewUser::Admin { password, .. } => password,
    };
    validate::confirm_password(password, opt_str(params, "konfirmasiPassword").unwrap_or(""))?;
    Ok(user)
}

fn handle_users_create(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    auth::require(state.session.as_ref(), &[Role::Admin])?;
    let role = parse_role(&req.params)?;
    let user = parse_new_user(&req.params, role)?;
    let identity = state.store.create_user(user)?;
    tracing::info!(
        username = identity.username(),
        role = role.as_str(),
        "user created"
    );
    Ok(json!({ "user": identity }))
}

fn handle_users_delete(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    auth::require(state.session.as_ref(), &[Role::Admin])?;
    let role = parse_role(&req.params)?;
    let id = get_required_str(&req.params, "id")?;
    let username = state.store.delete_user(role, &id)?;
    let credentials_retained = state.store.has_account(&username);
    if credentials_retained {
        // Only the directory entry goes; the login table is left untouched.
        tracing::warn!(
            username = %username,
            role = role.as_str(),
            "user removed from directory; login credentials still active"
        );
    } else {
        tracing::info!(username = %username, role = role.as_str(), "user removed");
    }
    Ok(json!({
        "deleted": true,
        "credentialsRetained": credentials_retained,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => handle_students_list(state, req),
        "teachers.list" => handle_teachers_list(state, req),
        "users.create" => handle_users_create(state, req),
        "users.delete" => handle_users_delete(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
