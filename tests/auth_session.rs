use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar(args: &[&str]) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_kesehatand");
    let mut child = Command::new(exe)
        .args(args)
        .env_remove("KESEHATAN_LATENCY_MS")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn kesehatand");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or(serde_json::Value::Null)
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

fn temp_dir(prefix: &str) -> std::path::PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

#[test]
fn demo_accounts_land_on_their_dashboards() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);

    for (i, (user, pass, role)) in [
        ("siswa", "siswa123", "siswa"),
        ("guru", "guru123", "guru"),
        ("admin", "admin123", "admin"),
    ]
    .iter()
    .enumerate()
    {
        let res = request_ok(
            &mut stdin,
            &mut reader,
            &format!("login-{}", i),
            "auth.login",
            json!({ "username": user, "password": pass }),
        );
        assert_eq!(res["user"]["role"], *role);
        assert_eq!(res["user"]["username"], *user);
        assert!(res["user"].get("password").is_none());
        assert_eq!(res["redirect"], format!("/{}/dashboard", role));
    }

    let bad = request(
        &mut stdin,
        &mut reader,
        "bad",
        "auth.login",
        json!({ "username": "guru", "password": "siswa123" }),
    );
    assert_eq!(error_code(&bad), "invalid_credentials");
    assert!(bad["error"].get("details").is_none());

    let empty = request(
        &mut stdin,
        &mut reader,
        "empty",
        "auth.login",
        json!({ "username": "guru", "password": "" }),
    );
    assert_eq!(error_code(&empty), "required_field_missing");
    assert_eq!(empty["error"]["details"]["field"], "password");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn session_survives_restart_and_clears_on_logout() {
    let workspace = temp_dir("kesehatand-session");
    let ws = workspace.to_string_lossy().to_string();

    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar(&["--workspace", &ws]);
        request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "auth.login",
            json!({ "username": "guru", "password": "guru123" }),
        );
        drop(stdin);
        let _ = child.wait();
    }

    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);
        let before = request_ok(&mut stdin, &mut reader, "1", "auth.session", json!({}));
        assert!(before["user"].is_null());
        let selected = request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "workspace.select",
            json!({ "path": ws }),
        );
        assert_eq!(selected["user"]["username"], "guru");
        assert_eq!(selected["user"]["kelas"], "6A");

        let out = request_ok(&mut stdin, &mut reader, "3", "auth.logout", json!({}));
        assert_eq!(out["redirect"], "/login");
        drop(stdin);
        let _ = child.wait();
    }

    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar(&["--workspace", &ws]);
        let session = request_ok(&mut stdin, &mut reader, "1", "auth.session", json!({}));
        assert!(session["user"].is_null());
        drop(stdin);
        let _ = child.wait();
    }

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn selecting_a_workspace_keeps_the_live_session() {
    let workspace = temp_dir("kesehatand-select-live");
    let ws = workspace.to_string_lossy().to_string();

    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);
        request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "auth.login",
            json!({ "username": "guru", "password": "guru123" }),
        );
        let selected = request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "workspace.select",
            json!({ "path": ws }),
        );
        assert_eq!(selected["user"]["username"], "guru");

        let session = request_ok(&mut stdin, &mut reader, "3", "auth.session", json!({}));
        assert_eq!(session["user"]["username"], "guru");
        let rows = request_ok(&mut stdin, &mut reader, "4", "records.list", json!({}));
        assert_eq!(rows["baseTotal"], 3);
        drop(stdin);
        let _ = child.wait();
    }

    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar(&["--workspace", &ws]);
        let session = request_ok(&mut stdin, &mut reader, "1", "auth.session", json!({}));
        assert_eq!(session["user"]["username"], "guru");
        assert_eq!(session["user"]["role"], "guru");
        drop(stdin);
        let _ = child.wait();
    }

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn navigation_follows_session_role() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);

    let r = request_ok(&mut stdin, &mut reader, "1", "nav.resolve", json!({ "path": "/guru/laporan" }));
    assert_eq!(r, json!({ "action": "redirect", "to": "/login" }));

    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "auth.login",
        json!({ "username": "guru", "password": "guru123" }),
    );
    let r = request_ok(&mut stdin, &mut reader, "3", "nav.resolve", json!({ "path": "/guru/laporan" }));
    assert_eq!(r, json!({ "action": "render", "view": "guru/laporan" }));
    let r = request_ok(&mut stdin, &mut reader, "4", "nav.resolve", json!({ "path": "/guru" }));
    assert_eq!(r, json!({ "action": "redirect", "to": "/guru/dashboard" }));
    let r = request_ok(&mut stdin, &mut reader, "5", "nav.resolve", json!({ "path": "/admin/dashboard" }));
    assert_eq!(r["to"], "/login");
    let r = request_ok(&mut stdin, &mut reader, "6", "nav.resolve", json!({ "path": "/guru/pengaturan" }));
    assert_eq!(r, json!({ "action": "notFound" }));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn change_password_validates_then_applies() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "username": "guru", "password": "guru123" }),
    );

    let r = request(
        &mut stdin,
        &mut reader,
        "2",
        "auth.changePassword",
        json!({ "oldPassword": "salah", "newPassword": "baru456", "confirmPassword": "baru456" }),
    );
    assert_eq!(error_code(&r), "incorrect_password");

    let r = request(
        &mut stdin,
        &mut reader,
        "3",
        "auth.changePassword",
        json!({ "oldPassword": "guru123", "newPassword": "baru456", "confirmPassword": "baru457" }),
    );
    assert_eq!(error_code(&r), "password_mismatch");

    let r = request(
        &mut stdin,
        &mut reader,
        "4",
        "auth.changePassword",
        json!({ "oldPassword": "guru123", "newPassword": "" , "confirmPassword": "" }),
    );
    assert_eq!(error_code(&r), "required_field_missing");

    request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "auth.changePassword",
        json!({ "oldPassword": "guru123", "newPassword": "baru456", "confirmPassword": "baru456" }),
    );
    request_ok(&mut stdin, &mut reader, "6", "auth.logout", json!({}));

    let old = request(
        &mut stdin,
        &mut reader,
        "7",
        "auth.login",
        json!({ "username": "guru", "password": "guru123" }),
    );
    assert_eq!(error_code(&old), "invalid_credentials");
    request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "auth.login",
        json!({ "username": "guru", "password": "baru456" }),
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn roles_are_enforced() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "username": "siswa", "password": "siswa123" }),
    );
    for (i, method) in ["students.list", "teachers.list", "settings.get", "records.respond"]
        .iter()
        .enumerate()
    {
        let r = request(&mut stdin, &mut reader, &i.to_string(), method, json!({}));
        assert_eq!(error_code(&r), "forbidden", "{}", method);
    }
    drop(stdin);
    let _ = child.wait();
}
