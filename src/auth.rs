use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::model::{Account, Identity, Role};

/// Linear scan; the first exact (username, password) match wins.
pub fn authenticate(accounts: &[Account], username: &str, password: &str) -> AppResult<Identity> {
    if username.trim().is_empty() {
        return Err(AppError::required("username"));
    }
    if password.is_empty() {
        return Err(AppError::required("password"));
    }
    accounts
        .iter()
        .find(|a| a.identity.username() == username && a.password == password)
        .map(|a| a.identity.clone())
        .ok_or(AppError::InvalidCredentials)
}

/// Session must exist and carry one of `roles`.
pub fn require<'a>(session: Option<&'a Identity>, roles: &[Role]) -> AppResult<&'a Identity> {
    let who = session.ok_or(AppError::NotAuthenticated)?;
    if roles.contains(&who.role()) {
        Ok(who)
    } else {
        Err(AppError::Forbidden(format!(
            "role {} cannot perform this action",
            who.role().as_str()
        )))
    }
}

/// Teacher and student sessions are pinned to their class.
pub fn require_class_access(who: &Identity, class_label: &str) -> AppResult<()> {
    match who.class_label() {
        None => Ok(()),
        Some(own) if own == class_label => Ok(()),
        Some(_) => Err(AppError::Forbidden(format!("class {class_label} is not yours"))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Route {
    Render { view: String },
    Redirect { to: String },
    NotFound,
}

fn views(role: Role) -> &'static [&'static str] {
    match role {
        Role::Student => &["dashboard", "input-kesehatan", "keluhan", "profil"],
        Role::Teacher => &["dashboard", "daftar-siswa", "keluhan", "laporan", "profil"],
        Role::Admin => &[
            "dashboard",
            "kelola-pengguna",
            "tambah-pengguna",
            "laporan",
            "pengaturan",
        ],
    }
}

pub fn resolve_route(path: &str, session: Option<&Identity>) -> Route {
    let trimmed = path.trim().trim_end_matches('/');
    let mut segments = trimmed.split('/').filter(|s| !s.is_empty());

    let first = match segments.next() {
        None => {
            return Route::Redirect {
                to: "/login".into(),
            }
        }
        Some(s) => s,
    };

    if first == "login" {
        return match segments.next() {
            None => Route::Render {
                view: "login".into(),
            },
            Some(_) => Route::NotFound,
        };
    }

    let role = match first {
        "siswa" => Role::Student,
        "guru" => Role::Teacher,
        "admin" => Role::Admin,
        _ => return Route::NotFound,
    };

    if session.map(Identity::role) != Some(role) {
        return Route::Redirect {
            to: "/login".into(),
        };
    }

    let rest: Vec<&str> = segments.collect();
    match rest.as_slice() {
        [] => Route::Redirect {
            to: role.landing_path(),
        },
        [view] if views(role).contains(view) => Route::Render {
            view: format!("{}/{}", role.as_str(), view),
        },
        _ => Route::NotFound,
    }
}
