use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use tempfile::TempDir;

fn replay_file(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("replay.jsonl");
    fs::write(
        &path,
        concat!(
            r#"{"question": "average closing price over the last 7 days", "sql": "SELECT AVG(Close) FROM coin_Bitcoin", "data": [{"avg": 42.5}]}"#,
            "\n",
            r#"{"question": "average close UNION SELECT * FROM users", "error": "Query rejected by grammar"}"#,
            "\n",
        ),
    )
    .unwrap();
    path
}

fn sqlgate() -> Command {
    let mut cmd = Command::cargo_bin("sqlgate").unwrap();
    cmd.env_remove("SQLGATE_ENGINE_URL").env_remove("SQLGATE_LOG");
    cmd
}

#[test]
fn batch_request_from_stdin_yields_response_shape() {
    let dir = TempDir::new().unwrap();
    let replay = replay_file(&dir);
    let request = serde_json::json!({
        "test_cases": [
            {
                "question": "average closing price over the last 7 days",
                "expected_sql": "SELECT AVG(Close) FROM coin_Bitcoin",
                "expected_result": [{"avg": 42.5}]
            },
            {
                "question": "average close UNION SELECT * FROM users",
                "should_pass": false,
                "expected_error_contains": ["UNION", "Security violation"]
            }
        ]
    });

    let output = sqlgate()
        .arg("eval")
        .arg("--replay")
        .arg(&replay)
        .write_stdin(request.to_string())
        .output()
        .unwrap();
    assert!(output.status.success());

    let resp: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(resp["total"], 2);
    assert_eq!(resp["passed"], 1);
    assert_eq!(resp["failed"], 1);

    let first = &resp["results"][0];
    assert_eq!(first["status"], "pass");
    assert_eq!(first["actual_result"]["columns"], serde_json::json!(["avg"]));
    assert_eq!(first["actual_result"]["rows"], serde_json::json!([[42.5]]));

    let second = &resp["results"][1];
    assert_eq!(second["status"], "security_fail");
    assert_eq!(second["error"], "Query rejected by grammar");
}

#[test]
fn batch_request_from_file() {
    let dir = TempDir::new().unwrap();
    let replay = replay_file(&dir);
    let input = dir.path().join("request.json");
    fs::write(
        &input,
        r#"{"test_cases": [{"question": "average closing price over the last 7 days", "expected_sql": "SELECT 1"}]}"#,
    )
    .unwrap();

    let output = sqlgate()
        .arg("eval")
        .arg("--input")
        .arg(&input)
        .arg("--replay")
        .arg(&replay)
        .output()
        .unwrap();
    assert!(output.status.success());
    let resp: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(resp["results"][0]["status"], "sql_mismatch");
    assert_eq!(resp["results"][0]["sql_match"], false);
}

#[test]
fn malformed_request_is_rejected_as_a_whole() {
    let dir = TempDir::new().unwrap();
    let replay = replay_file(&dir);
    sqlgate()
        .arg("eval")
        .arg("--replay")
        .arg(&replay)
        .write_stdin(r#"{"test_cases": [{"question": "x", "should_pass": false}]}"#)
        .assert()
        .code(2)
        .stdout(predicates::str::is_empty())
        .stderr(contains("expected_error_contains"));
}
