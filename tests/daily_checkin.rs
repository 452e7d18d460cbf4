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

fn login(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    username: &str,
    password: &str,
) {
    request_ok(
        stdin,
        reader,
        id,
        "auth.login",
        json!({ "username": username, "password": password }),
    );
}

#[test]
fn budi_checks_in_and_teacher_responds() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&["--no-seed-records"]);
    login(&mut stdin, &mut reader, "1", "siswa", "siswa123");

    let saved = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "records.upsertDaily",
        json!({
            "tanggal": "2025-06-10",
            "suhuTubuh": 36.8,
            "beratBadan": 35.5,
            "tinggiBadan": 145.0,
            "keluhan": "pusing"
        }),
    );
    assert_eq!(saved["created"], true);
    let record_id = saved["record"]["id"].as_str().expect("record id").to_string();

    let mine = request_ok(&mut stdin, &mut reader, "3", "records.byStudent", json!({ "studentId": "1" }));
    let rows = mine["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["tanggal"], "2025-06-10");
    assert_eq!(rows[0]["suhuTubuh"], 36.8);
    assert_eq!(rows[0]["namaSiswa"], "Budi Santoso");
    assert_eq!(rows[0]["kelas"], "6A");
    assert_eq!(rows[0]["status"], "belum_ditanggapi");
    assert!(rows[0].get("tanggapanGuru").is_none());

    request_ok(&mut stdin, &mut reader, "4", "auth.logout", json!({}));
    login(&mut stdin, &mut reader, "5", "guru", "guru123");

    let empty = request(
        &mut stdin,
        &mut reader,
        "6",
        "records.respond",
        json!({ "recordId": record_id, "tanggapan": "   " }),
    );
    assert_eq!(error_code(&empty), "empty_response");

    let answered = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "records.respond",
        json!({ "recordId": record_id, "tanggapan": "istirahat" }),
    );
    assert_eq!(answered["record"]["status"], "sudah_ditanggapi");
    assert_eq!(answered["record"]["tanggapanGuru"], "istirahat");
    assert_eq!(answered["record"]["suhuTubuh"], 36.8);

    let again = request_ok(&mut stdin, &mut reader, "8", "records.byStudent", json!({ "studentId": "1" }));
    assert_eq!(again["rows"][0]["id"], record_id.as_str());
    assert_eq!(again["rows"][0]["status"], "sudah_ditanggapi");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn out_of_range_temperature_changes_nothing() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);
    login(&mut stdin, &mut reader, "1", "siswa", "siswa123");

    let before = request_ok(&mut stdin, &mut reader, "2", "records.list", json!({}));
    let r = request(
        &mut stdin,
        &mut reader,
        "3",
        "records.upsertDaily",
        json!({
            "tanggal": "2025-06-10",
            "suhuTubuh": 43.0,
            "beratBadan": 35.5,
            "tinggiBadan": 145.0,
            "keluhan": "demam"
        }),
    );
    assert_eq!(error_code(&r), "out_of_range");
    assert_eq!(r["error"]["details"]["field"], "suhuTubuh");
    assert_eq!(r["error"]["details"]["min"], 35.0);
    assert_eq!(r["error"]["details"]["max"], 42.0);

    let after = request_ok(&mut stdin, &mut reader, "4", "records.list", json!({}));
    assert_eq!(before, after);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn second_checkin_same_day_updates_in_place() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);
    login(&mut stdin, &mut reader, "1", "siswa", "siswa123");

    // Seed record 1 is Budi's answered check-in for this date.
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "records.upsertDaily",
        json!({
            "tanggal": "2025-06-10",
            "suhuTubuh": "37.0",
            "beratBadan": "35.6",
            "tinggiBadan": "145",
        }),
    );
    assert_eq!(updated["created"], false);
    assert_eq!(updated["record"]["id"], "1");
    assert_eq!(updated["record"]["suhuTubuh"], 37.0);
    assert_eq!(updated["record"]["keluhan"], "");
    assert_eq!(updated["record"]["status"], "sudah_ditanggapi");
    assert!(updated["record"]["tanggapanGuru"].is_string());

    let list = request_ok(&mut stdin, &mut reader, "3", "records.list", json!({}));
    let same_day = list["rows"]
        .as_array()
        .expect("rows")
        .iter()
        .filter(|r| r["tanggal"] == "2025-06-10")
        .count();
    assert_eq!(same_day, 1);
    assert_eq!(list["total"], 2);

    let today = request_ok(&mut stdin, &mut reader, "4", "records.today", json!({ "tanggal": "2025-06-10" }));
    assert_eq!(today["record"]["id"], "1");
    let none = request_ok(&mut stdin, &mut reader, "5", "records.today", json!({ "tanggal": "2025-06-11" }));
    assert!(none["record"].is_null());

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn form_values_are_validated_field_by_field() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&["--no-seed-records"]);
    login(&mut stdin, &mut reader, "1", "siswa", "siswa123");

    let missing = request(
        &mut stdin,
        &mut reader,
        "2",
        "records.upsertDaily",
        json!({ "tanggal": "2025-06-12", "suhuTubuh": 36.5, "tinggiBadan": 145 }),
    );
    assert_eq!(error_code(&missing), "required_field_missing");
    assert_eq!(missing["error"]["details"]["field"], "beratBadan");

    let junk = request(
        &mut stdin,
        &mut reader,
        "3",
        "records.upsertDaily",
        json!({ "tanggal": "2025-06-12", "suhuTubuh": 36.5, "beratBadan": 35, "tinggiBadan": "tinggi" }),
    );
    assert_eq!(error_code(&junk), "out_of_range");
    assert_eq!(junk["error"]["details"]["field"], "tinggiBadan");

    let bad_date = request(
        &mut stdin,
        &mut reader,
        "4",
        "records.upsertDaily",
        json!({ "tanggal": "12/06/2025", "suhuTubuh": 36.5, "beratBadan": 35, "tinggiBadan": 145 }),
    );
    assert_eq!(error_code(&bad_date), "invalid_date");

    let list = request_ok(&mut stdin, &mut reader, "5", "records.list", json!({}));
    assert_eq!(list["total"], 0);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn complaint_submission_reopens_and_teacher_scope_holds() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);
    login(&mut stdin, &mut reader, "1", "siswa", "siswa123");

    let empty = request(
        &mut stdin,
        &mut reader,
        "2",
        "complaints.submit",
        json!({ "keluhan": "  ", "tanggal": "2025-06-10" }),
    );
    assert_eq!(error_code(&empty), "empty_complaint");

    let reopened = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "complaints.submit",
        json!({ "keluhan": "batuk lagi", "tanggal": "2025-06-10" }),
    );
    assert_eq!(reopened["created"], false);
    assert_eq!(reopened["record"]["status"], "belum_ditanggapi");
    assert!(reopened["record"].get("tanggapanGuru").is_none());

    let fresh = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "complaints.submit",
        json!({ "keluhan": "pilek", "tanggal": "2025-06-11" }),
    );
    assert_eq!(fresh["created"], true);
    assert_eq!(fresh["record"]["suhuTubuh"], 36.8);
    assert_eq!(fresh["record"]["beratBadan"], 35.0);
    assert_eq!(fresh["record"]["tinggiBadan"], 140.0);

    request_ok(&mut stdin, &mut reader, "5", "auth.logout", json!({}));
    login(&mut stdin, &mut reader, "6", "guru", "guru123");

    // Record 4 belongs to Doni in 6B.
    let other_class = request(
        &mut stdin,
        &mut reader,
        "7",
        "records.respond",
        json!({ "recordId": "4", "tanggapan": "minum obat" }),
    );
    assert_eq!(error_code(&other_class), "forbidden");

    let missing = request(
        &mut stdin,
        &mut reader,
        "8",
        "records.respond",
        json!({ "recordId": "nope", "tanggapan": "x" }),
    );
    assert_eq!(error_code(&missing), "not_found");

    drop(stdin);
    let _ = child.wait();
}
