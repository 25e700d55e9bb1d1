mod common;

use common::{Storage, run_command};

#[test]
fn key_prints_canonical_key() {
    let output = run_command(&[
        "key",
        "GET",
        "/api/orders?requestDTO.status=Active&requestDTO.type=A%20B",
    ]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "get.api-orders-status-active-type-a-b"
    );
}

#[test]
fn key_rejects_blank_method() {
    let output = run_command(&["key", " ", "/x"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn endpoints_lists_fixtures_as_json() {
    let storage = Storage::new();
    storage.write_fixture("get.api-users.success.json", r#"{"status": 200, "response": []}"#);
    storage.write_fixture("get.api-users.empty.json", r#"{"response": []}"#);
    storage.write_config(r#"{"get.api-users": {"empty": true}}"#);

    let mut args = vec!["endpoints".to_string()];
    args.extend(storage.args());
    args.extend(["--use-case".to_string(), "empty".to_string()]);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = run_command(&args);
    assert!(
        output.status.success(),
        "endpoints failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!({
            "get.api-users": {
                "useCases": {"empty": {"response": []}},
                "activeUseCase": "empty"
            }
        })
    );
}

#[test]
fn endpoints_does_not_create_storage() {
    let storage = Storage::new();
    let mut args = vec!["endpoints".to_string()];
    args.extend(storage.args());
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = run_command(&args);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "{}");
    assert!(!storage.mocks_dir().exists());
    assert!(!storage.config_file().exists());
}

#[test]
fn version_json() {
    let output = run_command(&["version", "--format", "json"]);
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["name"], "mockstage");
}

#[test]
fn completions_bash() {
    let output = run_command(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("mockstage"));
}

#[test]
fn serve_rejects_unbindable_address() {
    let storage = Storage::new();
    let mut args = vec!["serve".to_string(), "--bind".to_string(), "not a host".to_string()];
    args.extend(storage.args());
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = run_command(&args);
    assert_eq!(output.status.code(), Some(4));
}
