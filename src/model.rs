//! Entity types. Wire names follow the dashboard's field names (`nama`, `kelas`,
//! `suhuTubuh`, ...) so the front end can bind rows without a mapping layer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "siswa")]
    Student,
    #[serde(rename = "guru")]
    Teacher,
    #[serde(rename = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "siswa",
            Self::Teacher => "guru",
            Self::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "siswa" | "student" => Some(Self::Student),
            "guru" | "teacher" => Some(Self::Teacher),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn landing_path(self) -> String {
        format!("/{}/dashboard", self.as_str())
    }
}

/// An authenticated principal. Each variant carries only the fields its role has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role")]
pub enum Identity {
    #[serde(rename = "siswa")]
    Student {
        id: String,
        #[serde(rename = "nama")]
        name: String,
        username: String,
        #[serde(rename = "kelas")]
        class_label: String,
        nis: String,
    },
    #[serde(rename = "guru")]
    Teacher {
        id: String,
        #[serde(rename = "nama")]
        name: String,
        username: String,
        #[serde(rename = "kelas")]
        class_label: String,
        nip: String,
    },
    #[serde(rename = "admin")]
    Admin {
        id: String,
        #[serde(rename = "nama")]
        name: String,
        username: String,
    },
}

impl Identity {
    pub fn username(&self) -> &str {
        match self {
            Self::Student { username, .. }
            | Self::Teacher { username, .. }
            | Self::Admin { username, .. } => username,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::Student { .. } => Role::Student,
            Self::Teacher { .. } => Role::Teacher,
            Self::Admin { .. } => Role::Admin,
        }
    }

    pub fn class_label(&self) -> Option<&str> {
        match self {
            Self::Student { class_label, .. } | Self::Teacher { class_label, .. } => {
                Some(class_label)
            }
            Self::Admin { .. } => None,
        }
    }
}

/// Auth-store entry. Passwords are plaintext, as in the demo data set.
#[derive(Debug, Clone)]
pub struct Account {
    pub identity: Identity,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    L,
    P,
}

impl Gender {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "L" | "l" => Some(Self::L),
            "P" | "p" => Some(Self::P),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub id: String,
    #[serde(rename = "nama")]
    pub name: String,
    pub nis: String,
    #[serde(rename = "kelas")]
    pub class_label: String,
    #[serde(rename = "jenisKelamin")]
    pub gender: Gender,
    #[serde(rename = "tanggalLahir")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "alamat")]
    pub address: String,
    #[serde(rename = "namaOrangTua")]
    pub parent_name: String,
    #[serde(rename = "teleponOrangTua")]
    pub parent_phone: String,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct Teacher {
    pub id: String,
    #[serde(rename = "nama")]
    pub name: String,
    pub nip: String,
    #[serde(rename = "kelas")]
    pub class_label: String,
    #[serde(rename = "jenisKelamin")]
    pub gender: Gender,
    #[serde(rename = "telepon")]
    pub phone: String,
    #[serde(rename = "alamat")]
    pub address: String,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct Admin {
    pub id: String,
    #[serde(rename = "nama")]
    pub name: String,
    pub username: String,
    pub role: Role,
}

/// The three self-reported measurements, keyed by their form field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VitalField {
    Temperature,
    Weight,
    Height,
}

impl VitalField {
    pub const ALL: [VitalField; 3] = [Self::Temperature, Self::Weight, Self::Height];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "suhuTubuh",
            Self::Weight => "beratBadan",
            Self::Height => "tinggiBadan",
        }
    }

    /// Inclusive accepted domain.
    pub fn range(self) -> (f64, f64) {
        match self {
            Self::Temperature => (35.0, 42.0),
            Self::Weight => (20.0, 100.0),
            Self::Height => (100.0, 200.0),
        }
    }
}

impl fmt::Display for VitalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vitals {
    #[serde(rename = "suhuTubuh")]
    pub temperature_c: f64,
    #[serde(rename = "beratBadan")]
    pub weight_kg: f64,
    #[serde(rename = "tinggiBadan")]
    pub height_cm: f64,
}

impl Vitals {
    /// Values the complaint form fills in when no check-in exists for the day.
    pub const COMPLAINT_DEFAULT: Vitals = Vitals {
        temperature_c: 36.8,
        weight_kg: 35.0,
        height_cm: 140.0,
    };

    pub fn get(&self, field: VitalField) -> f64 {
        match field {
            VitalField::Temperature => self.temperature_c,
            VitalField::Weight => self.weight_kg,
            VitalField::Height => self.height_cm,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    #[serde(rename = "belum_ditanggapi")]
    Unanswered,
    #[serde(rename = "sudah_ditanggapi")]
    Answered,
}

impl ResponseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unanswered => "belum_ditanggapi",
            Self::Answered => "sudah_ditanggapi",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthRecord {
    pub id: String,
    #[serde(rename = "siswaId")]
    pub student_id: String,
    #[serde(rename = "namaSiswa")]
    pub student_name: String,
    #[serde(rename = "kelas")]
    pub class_label: String,
    #[serde(rename = "tanggal")]
    pub date: NaiveDate,
    #[serde(flatten)]
    pub vitals: Vitals,
    #[serde(rename = "keluhan")]
    pub complaint: String,
    #[serde(rename = "tanggapanGuru", skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub status: ResponseStatus,
    pub timestamp: DateTime<Utc>,
}

impl HealthRecord {
    pub fn has_complaint(&self) -> bool {
        !self.complaint.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationKind {
    #[serde(rename = "keluhan")]
    Complaint,
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "pengumuman")]
    Announcement,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Directory ids are per role, so the owner is (role, user_id).
    #[serde(skip)]
    pub recipient_role: Role,
    #[serde(rename = "judul")]
    pub title: String,
    #[serde(rename = "pesan")]
    pub message: String,
    #[serde(rename = "dibaca")]
    pub read: bool,
    #[serde(rename = "tanggal")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "tipe")]
    pub kind: NotificationKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub id: String,
    #[serde(rename = "bulan")]
    pub month: String,
    #[serde(rename = "tahun")]
    pub year: i32,
    #[serde(rename = "kelas")]
    pub class_label: String,
    #[serde(rename = "jumlahSiswa")]
    pub student_count: u32,
    #[serde(rename = "jumlahKeluhan")]
    pub complaint_count: u32,
    #[serde(rename = "persentaseKehadiran")]
    pub attendance_percent: f64,
    #[serde(rename = "masalahUmum")]
    pub common_issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassSetting {
    pub id: String,
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "tingkat")]
    pub grade: String,
    #[serde(rename = "aktif")]
    pub active: bool,
}
