use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value.get("error").cloned().unwrap_or_else(|| json!({}))
}

fn course(id: &str, credits: f64, percentage: f64) -> serde_json::Value {
    json!({
        "courseId": id,
        "courseName": id,
        "creditHours": credits,
        "percentage": percentage
    })
}

#[test]
fn semester_gpa_matches_credit_weighted_points() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let r = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "gpa.semester",
        json!({ "courses": [course("A", 3.0, 95.0), course("B", 4.0, 85.0)], "gpaScale": 4 }),
    );
    assert_eq!(r["totalCredits"].as_f64(), Some(7.0));
    assert_eq!(r["totalPoints"].as_f64(), Some(24.0));
    assert_eq!(r["cgpa"].as_f64(), Some(3.43));
    assert!(r.get("semesterGPA").is_none());

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "gpa.semester",
        json!({ "courses": [] }),
    );
    assert_eq!(r["cgpa"].as_f64(), Some(0.0));
    assert_eq!(r["totalCredits"].as_f64(), Some(0.0));

    let _ = child.kill();
}

#[test]
fn cumulative_excludes_current_semester_unless_asked() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let semesters = json!([
        { "semesterId": "S1", "semesterName": "Fall 2025", "courses": [course("A", 3.0, 95.0)] },
        {
            "semesterId": "S2",
            "semesterName": "Spring 2026",
            "courses": [course("B", 3.0, 85.0), course("C", 1.0, 50.0)]
        }
    ]);

    let excluded = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "gpa.cumulative",
        json!({ "semesters": semesters, "options": { "gpaScale": 4, "retakePolicy": "best" } }),
    );
    assert_eq!(excluded["totalCredits"].as_f64(), Some(3.0));
    assert_eq!(excluded["totalPoints"].as_f64(), Some(12.0));
    assert_eq!(excluded["cgpa"].as_f64(), Some(4.0));
    assert!(excluded.get("semesterGPA").is_none());
    assert!(excluded.get("semesterCredits").is_none());

    let included = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "gpa.cumulative",
        json!({
            "semesters": semesters,
            "options": { "gpaScale": 4, "retakePolicy": "best", "includeCurrentSemester": true }
        }),
    );
    assert_eq!(included["totalCredits"].as_f64(), Some(7.0));
    assert_eq!(included["cgpa"].as_f64(), Some(3.0));
    assert_eq!(included["semesterGPA"].as_f64(), Some(2.25));
    assert_eq!(included["semesterCredits"].as_f64(), Some(4.0));

    let _ = child.kill();
}

#[test]
fn cumulative_resolves_retakes_per_policy() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let semesters = json!([
        {
            "semesterId": "S1",
            "semesterName": "Fall 2025",
            "courses": [
                {
                    "courseId": "M", "courseName": "Mechanics", "creditHours": 3,
                    "percentage": 55, "attemptNumber": 1
                },
                {
                    "courseId": "M", "courseName": "Mechanics", "creditHours": 3,
                    "percentage": 88, "attemptNumber": 2, "isRetake": true
                },
                course("E", 2.0, 93.0)
            ]
        },
        { "semesterId": "S2", "semesterName": "Spring 2026", "courses": [] }
    ]);

    let best = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "gpa.cumulative",
        json!({ "semesters": semesters, "options": { "retakePolicy": "best" } }),
    );
    assert_eq!(best["totalCredits"].as_f64(), Some(5.0));
    assert_eq!(best["cgpa"].as_f64(), Some(3.58));

    let average = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "gpa.cumulative",
        json!({ "semesters": semesters, "options": { "retakePolicy": "average" } }),
    );
    assert_eq!(average["cgpa"].as_f64(), Some(2.62));

    let latest = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "gpa.cumulative",
        json!({ "semesters": semesters, "options": { "retakePolicy": "latest" } }),
    );
    assert_eq!(latest["cgpa"].as_f64(), Some(3.58));

    let _ = child.kill();
}

#[test]
fn transcript_rows_track_running_cgpa() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let t = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "gpa.transcript",
        json!({
            "semesters": [
                {
                    "semesterId": "S1",
                    "semesterName": "Fall 2025",
                    "courses": [course("A", 3.0, 95.0)]
                },
                {
                    "semesterId": "S2",
                    "semesterName": "Spring 2026",
                    "courses": [course("B", 3.0, 85.0)]
                }
            ],
            "options": { "includeCurrentSemester": true }
        }),
    );
    let rows = t["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["gpa"].as_f64(), Some(4.0));
    assert_eq!(rows[1]["gpa"].as_f64(), Some(3.0));
    assert_eq!(rows[1]["cumulativeGpa"].as_f64(), Some(3.5));
    assert_eq!(rows[1]["inProgress"], true);
    assert_eq!(t["summary"]["cgpa"].as_f64(), Some(3.5));
    assert_eq!(t["classification"]["classification"], "First Class");
    assert_eq!(t["classification"]["latinHonors"], "Cum Laude");

    let _ = child.kill();
}

#[test]
fn classification_and_target_projection() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let c = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "gpa.classify",
        json!({ "gpa": 3.5, "scale": 4 }),
    );
    assert_eq!(c, json!({ "classification": "First Class", "latinHonors": "Cum Laude" }));

    let c = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "gpa.classify",
        json!({ "gpa": 1.9, "scale": 4 }),
    );
    assert_eq!(c, json!({ "classification": "Below Standard" }));

    let c = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "gpa.classify",
        json!({ "gpa": 4.6, "scale": 5 }),
    );
    assert_eq!(c["latinHonors"], "Summa Cum Laude");

    let p = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "gpa.requiredForTarget",
        json!({
            "currentCgpa": 3.0,
            "currentCredits": 60,
            "targetCgpa": 3.5,
            "remainingCredits": 20
        }),
    );
    assert!(p["requiredGpa"].is_null());
    assert_eq!(p["achievable"], false);

    let p = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "gpa.requiredForTarget",
        json!({
            "currentCgpa": 3.0,
            "currentCredits": 60,
            "targetCgpa": 3.2,
            "remainingCredits": 30
        }),
    );
    assert_eq!(p["requiredGpa"].as_f64(), Some(3.6));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "gpa.requiredForTarget",
        json!({
            "currentCgpa": 3.0,
            "currentCredits": 60,
            "targetCgpa": 3.2,
            "remainingCredits": 0
        }),
    );
    assert_eq!(e["code"], "bad_params");

    let _ = child.kill();
}

#[test]
fn invalid_courses_are_rejected_before_aggregation() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let e = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "gpa.semester",
        json!({ "courses": [course("A", 3.0, 90.0), course("B", 0.0, 80.0)] }),
    );
    assert_eq!(e["code"], "invalid_argument");
    assert_eq!(e["details"]["index"], 1);
    assert_eq!(e["details"]["courseId"], "B");

    let e = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "gpa.cumulative",
        json!({
            "semesters": [
                { "semesterId": "S1", "semesterName": "x", "courses": [course("A", -1.0, 90.0)] }
            ]
        }),
    );
    assert_eq!(e["code"], "invalid_argument");

    let e = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "gpa.semester",
        json!({ "courses": [course("A", 3.0, 90.0)], "gpaScale": 10 }),
    );
    assert_eq!(e["code"], "bad_params");

    let _ = child.kill();
}

fn pass_fail_table() -> serde_json::Value {
    json!([
        { "grade": "P", "minScore": 50, "maxScore": 100, "gpa4": 4.0, "gpa5": 5.0 },
        { "grade": "F", "minScore": 0, "maxScore": 49.99, "gpa4": 0.0, "gpa5": 0.0 }
    ])
}

#[test]
fn per_call_boundaries_reach_gpa_aggregation() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let semesters = json!([
        { "semesterId": "S1", "semesterName": "Fall 2025", "courses": [course("A", 3.0, 70.0)] }
    ]);

    let default_table = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "gpa.cumulative",
        json!({ "semesters": semesters, "options": { "includeCurrentSemester": true } }),
    );
    assert_eq!(default_table["cgpa"].as_f64(), Some(1.7));

    let custom = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "gpa.cumulative",
        json!({
            "semesters": semesters,
            "options": { "includeCurrentSemester": true, "boundaries": pass_fail_table() }
        }),
    );
    assert_eq!(custom["cgpa"].as_f64(), Some(4.0));
    assert_eq!(custom["totalPoints"].as_f64(), Some(12.0));

    let semester = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "gpa.semester",
        json!({
            "courses": [course("A", 3.0, 70.0)],
            "options": { "boundaries": pass_fail_table(), "gpaScale": 5 }
        }),
    );
    assert_eq!(semester["cgpa"].as_f64(), Some(5.0));

    let transcript = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "gpa.transcript",
        json!({
            "semesters": semesters,
            "options": { "includeCurrentSemester": true, "boundaries": pass_fail_table() }
        }),
    );
    assert_eq!(transcript["rows"][0]["gpa"].as_f64(), Some(4.0));
    assert_eq!(transcript["classification"]["latinHonors"], "Summa Cum Laude");

    let e = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "gpa.cumulative",
        json!({
            "semesters": semesters,
            "options": {
                "boundaries": [
                    { "grade": "P", "minScore": 60, "maxScore": 100, "gpa4": 4, "gpa5": 5 },
                    { "grade": "F", "minScore": 0, "maxScore": 50, "gpa4": 0, "gpa5": 0 }
                ]
            }
        }),
    );
    assert_eq!(e["code"], "invalid_argument");

    let _ = child.kill();
}

#[test]
fn exam_weights_in_options_are_checked_but_do_not_change_totals() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let semesters = json!([
        { "semesterId": "S1", "semesterName": "Fall 2025", "courses": [course("A", 3.0, 95.0)] }
    ]);

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "gpa.cumulative",
        json!({
            "semesters": semesters,
            "options": { "includeCurrentSemester": true, "weights": { "midterm": 40, "final": 60 } }
        }),
    );
    assert_eq!(r["cgpa"].as_f64(), Some(4.0));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "gpa.cumulative",
        json!({ "semesters": semesters, "options": { "weights": "heavy" } }),
    );
    assert_eq!(e["code"], "bad_params");

    let _ = child.kill();
}
