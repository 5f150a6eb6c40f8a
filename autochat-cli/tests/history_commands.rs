use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn write_config(dir: &Path) {
    let config = config_json(dir);
    std::fs::write(dir.join("config.json"), config).unwrap();
}

// Forward slashes keep the JSON valid on Windows paths.
fn config_json(dir: &Path) -> String {
    let root = dir.display().to_string().replace('\\', "/");
    format!(
        r#"{{"storage": {{"dir": "{root}/data"}}, "logging": {{"dir": "{root}/logs"}}}}"#
    )
}

fn autochat(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_autochat"))
        .arg("--config-dir")
        .arg(dir)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run autochat")
}

fn seed_history(dir: &Path) {
    let data = dir.join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(
        data.join("local_storage.json"),
        r#"{"allChatSessions": [
            [{"text": "Why is my check engine light on?", "sender": "user", "isImage": false},
             {"text": "It could be the **oxygen sensor**.", "sender": "bot", "isImage": false}],
            [],
            [{"text": "data:image/jpeg;base64,AAAA", "sender": "user", "isImage": true}]
        ]}"#,
    )
    .unwrap();
}

#[test]
fn test_history_list_skips_empty_sessions() {
    let temp_dir = TempDir::new().unwrap();
    write_config(temp_dir.path());
    seed_history(temp_dir.path());

    let output = autochat(temp_dir.path(), &["history", "list"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Session 1: Why is my check engine light o..."));
    assert!(!stdout.contains("Session 2:"));
    assert!(stdout.contains("Session 3: data:image/jpeg;base64,AAAA..."));
}

#[test]
fn test_history_show_prints_messages() {
    let temp_dir = TempDir::new().unwrap();
    write_config(temp_dir.path());
    seed_history(temp_dir.path());

    let output = autochat(temp_dir.path(), &["history", "show", "1"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Why is my check engine light on?"));
    assert!(stdout.contains("It could be the **oxygen sensor**."));

    let image = autochat(temp_dir.path(), &["history", "show", "3"]);
    assert!(String::from_utf8_lossy(&image.stdout).contains("[image, 4 base64 chars]"));
}

#[test]
fn test_history_show_missing_session_fails() {
    let temp_dir = TempDir::new().unwrap();
    write_config(temp_dir.path());

    let output = autochat(temp_dir.path(), &["history", "show", "5"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Session 5 not found"));
}

#[test]
fn test_send_without_api_key_fails_before_storing() {
    let temp_dir = TempDir::new().unwrap();
    write_config(temp_dir.path());

    let output = Command::new(env!("CARGO_BIN_EXE_autochat"))
        .arg("--config-dir")
        .arg(temp_dir.path())
        .args(["send", "--message", "hello"])
        .env_remove("GEMINI_API_KEY")
        .env_remove("GOOGLE_API_KEY")
        .env_remove("AUTOCHAT__PROVIDER__API_KEY")
        .output()
        .expect("failed to run autochat");

    assert!(!output.status.success());
    assert!(!temp_dir.path().join("data/local_storage.json").exists());
}

#[test]
fn test_status_loads_config_per_command() {
    let temp_dir = TempDir::new().unwrap();
    write_config(temp_dir.path());
    seed_history(temp_dir.path());

    let output = autochat(temp_dir.path(), &["status"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Sessions: 3 (2 with messages)"));
    assert!(temp_dir.path().join("logs").exists());
}
