use crate::auth;
use crate::config::AppSettings;
use crate::error::{AppError, AppResult};
use crate::ipc::error::respond;
use crate::ipc::params::get_required_str;
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use crate::validate::parse_clock;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy)]
enum SettingsSection {
    School,
    InputWindow,
    Notifications,
}

impl SettingsSection {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "sekolah" => Some(Self::School),
            "waktuInput" => Some(Self::InputWindow),
            "notifikasi" => Some(Self::Notifications),
            _ => None,
        }
    }
}

fn parse_bool(v: &Value, key: &str) -> Result<bool, String> {
    v.as_bool().ok_or_else(|| format!("{} must be boolean", key))
}

fn parse_string_max(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.len() > max_len {
        return Err(format!("{} length must be <= {}", key, max_len));
    }
    Ok(s.to_string())
}

fn parse_clock_field(v: &Value, key: &str) -> Result<String, String> {
    let s = parse_string_max(v, key, 5)?;
    if parse_clock(&s).is_none() {
        return Err(format!("{} must be HH:MM", key));
    }
    Ok(s)
}

/// Applies `patch` to a copy of the current settings; nothing is kept unless
/// every field validates.
fn apply_patch(
    current: &AppSettings,
    section: SettingsSection,
    patch: &serde_json::Map<String, Value>,
) -> Result<AppSettings, String> {
    let mut next = current.clone();
    for (k, v) in patch {
        match section {
            SettingsSection::School => {
                let school = &mut next.sekolah;
                match k.as_str() {
                    "namaSekolah" => school.nama_sekolah = parse_string_max(v, k, 120)?,
                    "alamatSekolah" => school.alamat_sekolah = parse_string_max(v, k, 240)?,
                    "teleponSekolah" => school.telepon_sekolah = parse_string_max(v, k, 32)?,
                    "emailSekolah" => {
                        let email = parse_string_max(v, k, 120)?;
                        if !email.is_empty() && !email.contains('@') {
                            return Err("emailSekolah must be an email address".into());
                        }
                        school.email_sekolah = email;
                    }
                    "tahunAjaran" => school.tahun_ajaran = parse_string_max(v, k, 16)?,
                    "semester" => {
                        let semester = parse_string_max(v, k, 16)?;
                        if semester != "Ganjil" && semester != "Genap" {
                            return Err("semester must be one of: Ganjil, Genap".into());
                        }
                        school.semester = semester;
                    }
                    _ => return Err(format!("unknown sekolah field: {}", k)),
                }
            }
            SettingsSection::InputWindow => match k.as_str() {
                "mulai" => next.waktu_input.mulai = parse_clock_field(v, k)?,
                "selesai" => next.waktu_input.selesai = parse_clock_field(v, k)?,
                _ => return Err(format!("unknown waktuInput field: {}", k)),
            },
            SettingsSection::Notifications => {
                let prefs = &mut next.notifikasi;
                match k.as_str() {
                    "guruKeluhan" => prefs.guru_keluhan = parse_bool(v, k)?,
                    "siswaResponse" => prefs.siswa_response = parse_bool(v, k)?,
                    "adminReport" => prefs.admin_report = parse_bool(v, k)?,
                    _ => return Err(format!("unknown notifikasi field: {}", k)),
                }
            }
        }
    }

    if let SettingsSection::InputWindow = section {
        let start = parse_clock(&next.waktu_input.mulai);
        let end = parse_clock(&next.waktu_input.selesai);
        if let (Some(s), Some(e)) = (start, end) {
            if s >= e {
                return Err("waktuInput.mulai must be before waktuInput.selesai".into());
            }
        }
    }
    Ok(next)
}

fn handle_settings_get(state: &mut AppState) -> AppResult<Value> {
    auth::require(state.session.as_ref(), &[Role::Admin])?;
    Ok(json!({ "settings": state.settings }))
}

fn handle_settings_update(state: &mut AppState, req: &Request) -> AppResult<Value> {
    auth::require(state.session.as_ref(), &[Role::Admin])?;
    let raw = get_required_str(&req.params, "section")?;
    let section = SettingsSection::parse(&raw)
        .ok_or_else(|| AppError::BadParams(format!("unknown settings section: {}", raw)))?;
    let patch = req
        .params
        .get("patch")
        .and_then(|v| v.as_object())
        .ok_or_else(|| AppError::BadParams("patch must be an object".into()))?;

    state.settings = apply_patch(&state.settings, section, patch).map_err(AppError::BadParams)?;
    tracing::info!(section = %raw, fields = patch.len(), "settings updated");
    Ok(json!({ "settings": state.settings }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "settings.get" => handle_settings_get(state),
        "settings.update" => handle_settings_update(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
