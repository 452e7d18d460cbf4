use serde_json::json;

use crate::error::AppResult;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Envelope for a handler outcome.
pub fn respond(id: &str, result: AppResult<serde_json::Value>) -> serde_json::Value {
    match result {
        Ok(v) => ok(id, v),
        Err(e) => err(id, e.code(), e.to_string(), e.details()),
    }
}
