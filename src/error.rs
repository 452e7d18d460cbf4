//! Domain error taxonomy shared by the store, the auth gate and the IPC layer.

use serde_json::{json, Value};
use thiserror::Error;

use crate::model::VitalField;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("username atau password salah")]
    InvalidCredentials,

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: VitalField, min: f64, max: f64 },

    #[error("tanggapan tidak boleh kosong")]
    EmptyResponse,

    #[error("keluhan tidak boleh kosong")]
    EmptyComplaint,

    #[error("password dan konfirmasi password tidak cocok")]
    PasswordMismatch,

    #[error("missing required field: {0}")]
    RequiredFieldMissing(String),

    #[error("password lama tidak sesuai")]
    IncorrectPassword,

    #[error("username already in use: {0}")]
    UsernameTaken(String),

    #[error("login required")]
    NotAuthenticated,

    #[error("not allowed: {0}")]
    Forbidden(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("{0}")]
    BadParams(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl AppError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn required(field: impl Into<String>) -> Self {
        Self::RequiredFieldMissing(field.into())
    }

    /// Stable IPC error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::OutOfRange { .. } => "out_of_range",
            Self::EmptyResponse => "empty_response",
            Self::EmptyComplaint => "empty_complaint",
            Self::PasswordMismatch => "password_mismatch",
            Self::RequiredFieldMissing(_) => "required_field_missing",
            Self::IncorrectPassword => "incorrect_password",
            Self::UsernameTaken(_) => "username_taken",
            Self::NotAuthenticated => "not_authenticated",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::InvalidDate(_) => "invalid_date",
            Self::UnknownField(_) => "unknown_field",
            Self::BadParams(_) => "bad_params",
            Self::Storage(_) => "storage_failed",
        }
    }

    pub fn details(&self) -> Option<Value> {
        match self {
            Self::OutOfRange { field, min, max } => Some(json!({
                "field": field.as_str(),
                "min": min,
                "max": max,
            })),
            Self::RequiredFieldMissing(field) | Self::UnknownField(field) => {
                Some(json!({ "field": field }))
            }
            Self::NotFound { kind, id } => Some(json!({ "kind": kind, "id": id })),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        Self::Storage(format!("{e:#}"))
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
