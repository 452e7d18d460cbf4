//! TOML configuration. The school-facing sections double as the in-memory
//! application settings served over `settings.get`, so every field reads both
//! the snake_case file key and the camelCase wire key.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sekolah: SchoolSettings,
    #[serde(default)]
    pub waktu_input: InputWindow,
    #[serde(default)]
    pub notifikasi: NotificationPrefs,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchoolSettings {
    #[serde(alias = "nama_sekolah")]
    pub nama_sekolah: String,
    #[serde(alias = "alamat_sekolah")]
    pub alamat_sekolah: String,
    #[serde(alias = "telepon_sekolah")]
    pub telepon_sekolah: String,
    #[serde(alias = "email_sekolah")]
    pub email_sekolah: String,
    #[serde(alias = "tahun_ajaran")]
    pub tahun_ajaran: String,
    pub semester: String,
}

impl Default for SchoolSettings {
    fn default() -> Self {
        Self {
            nama_sekolah: "SDN Contoh 01".into(),
            alamat_sekolah: "Jl. Pendidikan No. 123, Jakarta".into(),
            telepon_sekolah: "021-1234567".into(),
            email_sekolah: "sdn01@example.com".into(),
            tahun_ajaran: "2024/2025".into(),
            semester: "Genap".into(),
        }
    }
}

/// Daily check-in window, "HH:MM".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputWindow {
    pub mulai: String,
    pub selesai: String,
}

impl Default for InputWindow {
    fn default() -> Self {
        Self {
            mulai: "07:00".into(),
            selesai: "09:00".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationPrefs {
    #[serde(alias = "guru_keluhan")]
    pub guru_keluhan: bool,
    #[serde(alias = "siswa_response")]
    pub siswa_response: bool,
    #[serde(alias = "admin_report")]
    pub admin_report: bool,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            guru_keluhan: true,
            siswa_response: true,
            admin_report: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Artificial delay before each request reaches the store.
    pub latency_ms: u64,
    pub seed_records: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            latency_ms: 0,
            seed_records: true,
        }
    }
}

/// Editable application settings, as the admin settings screen sees them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub sekolah: SchoolSettings,
    pub waktu_input: InputWindow,
    pub notifikasi: NotificationPrefs,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.to_string_lossy()))?;
        let config: Self = toml::from_str(&content).context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let start = crate::validate::parse_clock(&self.waktu_input.mulai);
        let end = crate::validate::parse_clock(&self.waktu_input.selesai);
        match (start, end) {
            (Some(s), Some(e)) if s < e => Ok(()),
            (Some(_), Some(_)) => anyhow::bail!("waktu_input.mulai must be before waktu_input.selesai"),
            _ => anyhow::bail!("waktu_input times must be HH:MM"),
        }
    }

    pub fn app_settings(&self) -> AppSettings {
        AppSettings {
            sekolah: self.sekolah.clone(),
            waktu_input: self.waktu_input.clone(),
            notifikasi: self.notifikasi.clone(),
        }
    }
}
