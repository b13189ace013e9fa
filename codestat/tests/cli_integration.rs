//! Integration tests for codestat CLI

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::{tempdir, TempDir};

fn run_codestat(args: &[&str]) -> (String, String, bool) {
    let mut cmd_args = vec!["run", "-q", "-p", "codestat", "--"];
    cmd_args.extend(args);

    let output = Command::new("cargo")
        .args(&cmd_args)
        .current_dir(env!("CARGO_MANIFEST_DIR").to_string() + "/..")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();

    (stdout, stderr, success)
}

/// Two directories: d1/a.py (10 code, 2 comments, 1 blank) and d2/b.py (5 code)
fn fixture() -> TempDir {
    let dir = tempdir().unwrap();
    let d1 = dir.path().join("d1");
    let d2 = dir.path().join("d2");
    fs::create_dir_all(&d1).unwrap();
    fs::create_dir_all(&d2).unwrap();

    let mut a = String::from("# header\n\n");
    for i in 0..10 {
        a.push_str(&format!("v{i} = {i}\n"));
    }
    a.push_str("# trailer\n");
    fs::write(d1.join("a.py"), a).unwrap();

    let b: String = (0..5).map(|i| format!("print({i})\n")).collect();
    fs::write(d2.join("b.py"), b).unwrap();
    fs::write(d2.join("README.unknown"), "not counted\n").unwrap();

    dir
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_cli_help() {
    let (stdout, _, success) = run_codestat(&["--help"]);

    assert!(success);
    assert!(stdout.contains("codestat"));
    assert!(stdout.contains("--include"));
    assert!(stdout.contains("--exclude"));
    assert!(stdout.contains("--types"));
    assert!(stdout.contains("--threads"));
    assert!(stdout.contains("--by-file"));
    assert!(stdout.contains("--output"));
}

#[test]
fn test_cli_version() {
    let (stdout, _, success) = run_codestat(&["--version"]);

    assert!(success);
    assert!(stdout.contains("codestat"));
}

#[test]
fn test_table_output() {
    let dir = fixture();
    let (stdout, _, success) = run_codestat(&[path_str(dir.path())]);

    assert!(success);
    assert!(stdout.contains("Type"));
    assert!(stdout.contains("Code"));
    assert!(stdout.contains("Comments"));
    assert!(stdout.contains("Blanks"));
    assert!(stdout.contains("Python"));
    assert!(stdout.contains("Total"));
}

#[test]
fn test_json_output_counts() {
    let dir = fixture();
    let d1 = dir.path().join("d1");
    let d2 = dir.path().join("d2");
    let (stdout, _, success) =
        run_codestat(&[path_str(&d1), path_str(&d2), "--output", "json"]);

    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("Invalid JSON output");

    assert_eq!(parsed["outcome"], "Completed");
    let files = parsed["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);

    let a = files
        .iter()
        .find(|f| f["path"].as_str().unwrap().ends_with("a.py"))
        .unwrap();
    assert_eq!(a["code_type"], "Python");
    assert_eq!(a["counts"]["code"], 10);
    assert_eq!(a["counts"]["comments"], 2);
    assert_eq!(a["counts"]["blanks"], 1);

    let b = files
        .iter()
        .find(|f| f["path"].as_str().unwrap().ends_with("b.py"))
        .unwrap();
    assert_eq!(b["counts"]["code"], 5);
    assert_eq!(b["counts"]["comments"], 0);

    assert_eq!(parsed["totals"]["file_count"], 2);
    assert_eq!(parsed["totals"]["counts"]["code"], 15);
}

#[test]
fn test_overlapping_paths_count_once() {
    let dir = fixture();
    let d1 = dir.path().join("d1");
    let (stdout, _, success) = run_codestat(&[
        path_str(dir.path()),
        path_str(&d1),
        "--output",
        "json",
    ]);

    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["totals"]["file_count"], 2);
}

#[test]
fn test_by_file_output() {
    let dir = fixture();
    let (stdout, _, success) = run_codestat(&[path_str(dir.path()), "--by-file"]);

    assert!(success);
    assert!(stdout.contains("File"));
    assert!(stdout.contains("d1/a.py"));
    assert!(stdout.contains("d2/b.py"));
    assert!(stdout.contains("Total (2 files)"));
}

#[test]
fn test_exclude_filter() {
    let dir = fixture();
    let (stdout, _, success) = run_codestat(&[
        path_str(dir.path()),
        "--exclude",
        "**/d2/**",
        "--output",
        "json",
    ]);

    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["totals"]["file_count"], 1);
    assert_eq!(parsed["totals"]["counts"]["code"], 10);
}

#[test]
fn test_custom_types_file() {
    let dir = fixture();
    let types = dir.path().join("types.json");
    fs::write(
        &types,
        r##"{"unknown": {"name": "Notes", "line_comments": ["#"]}}"##,
    )
    .unwrap();

    let (stdout, _, success) = run_codestat(&[
        path_str(dir.path()),
        "--types",
        path_str(&types),
        "-j",
        "2",
        "--output",
        "json",
    ]);

    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let files = parsed["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["code_type"], "Notes");
}

#[test]
fn test_huge_thread_count_does_not_overflow() {
    let dir = fixture();
    let (stdout, stderr, success) = run_codestat(&[
        path_str(dir.path()),
        "-j",
        "18446744073709551615",
        "--output",
        "json",
    ]);

    assert!(success, "stderr: {stderr}");
    assert!(!stderr.contains("panicked"));
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["totals"]["file_count"], 2);
}

#[test]
fn test_undecodable_file_is_reported() {
    let dir = fixture();
    fs::write(dir.path().join("broken.py"), b"x = 1\n\xff\xfe\n").unwrap();

    let (stdout, _, success) = run_codestat(&[path_str(dir.path()), "--output", "json"]);

    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["totals"]["file_count"], 2);
    assert_eq!(parsed["totals"]["failure_count"], 1);
    let failures = parsed["failures"].as_array().unwrap();
    assert!(failures[0]["path"].as_str().unwrap().ends_with("broken.py"));
}

#[test]
fn test_invalid_path() {
    let (_, stderr, success) = run_codestat(&["/nonexistent/path"]);

    assert!(!success);
    assert!(stderr.contains("Error:"));
}

#[test]
fn test_invalid_glob() {
    let (_, stderr, success) = run_codestat(&[".", "--include", "[invalid"]);

    assert!(!success);
    assert!(stderr.contains("Error:"));
}
