//! CLI integration tests for propedit
//!
//! These tests run the binary against real files and check both the
//! command output and the exact text written back.

use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const SAMPLE: &str = "# Database settings\ndb.url=jdbc:h2:mem\ndb.user = admin\n\n# Build\nbuild.number=41\n";

/// Get a command instance for the propedit binary, isolated in `dir`
fn propedit_cmd(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("propedit"));
    cmd.current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .env("HOME", dir.path());
    cmd
}

/// Create a temporary directory holding `app.properties`
fn setup_file(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.properties");
    fs::write(&path, content).unwrap();
    (dir, path)
}

/// File content without the leading date-stamp comment
fn body(path: &PathBuf) -> String {
    let content = fs::read_to_string(path).unwrap();
    let (stamp, rest) = content.split_once('\n').unwrap();
    assert!(stamp.starts_with('#'), "missing date stamp: {}", stamp);
    rest.to_string()
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_get_prints_value() {
    let (dir, path) = setup_file(SAMPLE);

    propedit_cmd(&dir)
        .args(["get"])
        .arg(&path)
        .arg("db.user")
        .assert()
        .success()
        .stdout("admin\n");
}

#[test]
fn test_get_missing_key_fails() {
    let (dir, path) = setup_file(SAMPLE);

    propedit_cmd(&dir)
        .arg("get")
        .arg(&path)
        .arg("nope")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Key 'nope' not found"));
}

#[test]
fn test_get_missing_file_fails() {
    let dir = TempDir::new().unwrap();

    propedit_cmd(&dir)
        .args(["get", "missing.properties", "a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Property file not found"));
}

#[test]
fn test_list_in_file_order() {
    let (dir, path) = setup_file(SAMPLE);

    propedit_cmd(&dir)
        .arg("list")
        .arg(&path)
        .assert()
        .success()
        .stdout("db.url=jdbc:h2:mem\ndb.user=admin\nbuild.number=41\n");
}

#[test]
fn test_list_json() {
    let (dir, path) = setup_file(SAMPLE);

    let output = propedit_cmd(&dir)
        .args(["--format", "json", "list"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let items: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[1]["key"], "db.user");
    assert_eq!(items[1]["value"], "admin");
}

#[test]
fn test_lines_listing() {
    let (dir, path) = setup_file(SAMPLE);

    propedit_cmd(&dir)
        .arg("lines")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("-- logical lines --\n"))
        .stdout(predicate::str::contains("comment: \"# Build\""))
        .stdout(predicate::str::contains("blank:   \"\""));
}

// =============================================================================
// Write Tests
// =============================================================================

#[test]
fn test_set_updates_in_place() {
    let (dir, path) = setup_file(SAMPLE);

    propedit_cmd(&dir)
        .arg("set")
        .arg(&path)
        .args(["db.user", "root"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set db.user"));

    assert_eq!(
        body(&path),
        "# Database settings\ndb.url=jdbc:h2:mem\ndb.user=root\n\n# Build\nbuild.number=41\n"
    );
}

#[test]
fn test_set_new_key_is_appended() {
    let (dir, path) = setup_file(SAMPLE);

    propedit_cmd(&dir)
        .arg("set")
        .arg(&path)
        .args(["greeting", "hello world"])
        .assert()
        .success();

    assert!(body(&path).ends_with("build.number=41\n\ngreeting=hello world\n"));
}

#[test]
fn test_set_creates_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("new.properties");

    propedit_cmd(&dir)
        .arg("set")
        .arg(&path)
        .args(["a key", "v"])
        .args(["--comment", "Generated"])
        .assert()
        .success();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("#Generated\n#"));
    assert!(content.ends_with("\na\\ key=v\n"));
}

#[test]
fn test_del_keeps_comments_by_default() {
    let (dir, path) = setup_file(SAMPLE);

    propedit_cmd(&dir)
        .arg("del")
        .arg(&path)
        .arg("build.number")
        .assert()
        .success();

    assert_eq!(
        body(&path),
        "# Database settings\ndb.url=jdbc:h2:mem\ndb.user = admin\n\n# Build\n"
    );
}

#[test]
fn test_del_remove_comments() {
    let (dir, path) = setup_file(SAMPLE);

    propedit_cmd(&dir)
        .arg("del")
        .arg(&path)
        .arg("build.number")
        .arg("--remove-comments")
        .assert()
        .success();

    assert_eq!(
        body(&path),
        "# Database settings\ndb.url=jdbc:h2:mem\ndb.user = admin\n\n"
    );
}

#[test]
fn test_del_missing_key_leaves_file() {
    let (dir, path) = setup_file(SAMPLE);

    propedit_cmd(&dir)
        .arg("del")
        .arg(&path)
        .arg("nope")
        .assert()
        .success()
        .stdout(predicate::str::contains("not present"));

    assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);
}

// =============================================================================
// Typed Edit Tests
// =============================================================================

#[test]
fn test_edit_int_increment() {
    let (dir, path) = setup_file(SAMPLE);

    propedit_cmd(&dir)
        .arg("edit")
        .arg(&path)
        .arg("build.number")
        .args(["--type", "int", "--operation", "+", "--value", "1"])
        .assert()
        .success()
        .stdout("build.number=42\n");

    assert!(body(&path).ends_with("# Build\nbuild.number=42\n"));
}

#[test]
fn test_edit_int_decrement_with_default() {
    let (dir, path) = setup_file(SAMPLE);

    propedit_cmd(&dir)
        .arg("edit")
        .arg(&path)
        .arg("counter")
        .args(["-t", "int", "-o", "-", "--default", "10", "--value", "3"])
        .assert()
        .success()
        .stdout("counter=7\n");
}

#[test]
fn test_edit_date_with_pattern() {
    let (dir, path) = setup_file(SAMPLE);

    propedit_cmd(&dir)
        .arg("edit")
        .arg(&path)
        .arg("release.date")
        .args(["-t", "date", "--value", "2024/01/31", "--pattern", "yyyy/MM/dd"])
        .assert()
        .success()
        .stdout("release.date=2024/01/31\n");

    propedit_cmd(&dir)
        .arg("edit")
        .arg(&path)
        .arg("release.date")
        .args(["-t", "date", "-o", "+", "--value", "1", "--unit", "month"])
        .args(["--pattern", "yyyy/MM/dd"])
        .assert()
        .success()
        .stdout("release.date=2024/02/29\n");
}

#[test]
fn test_edit_date_now() {
    let (dir, path) = setup_file(SAMPLE);

    propedit_cmd(&dir)
        .arg("edit")
        .arg(&path)
        .arg("built.at")
        .args(["-t", "date", "--value", "now", "--pattern", "yyyy-MM-dd"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^built\.at=\d{4}-\d{2}-\d{2}\n$").unwrap());
}

#[test]
fn test_edit_string_decrement_fails() {
    let (dir, path) = setup_file(SAMPLE);

    propedit_cmd(&dir)
        .arg("edit")
        .arg(&path)
        .arg("db.user")
        .args(["-o", "-", "--value", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "- is not supported for string properties (key: db.user)",
        ));

    // Nothing is written on failure
    assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);
}

#[test]
fn test_edit_rejects_unknown_type() {
    let (dir, path) = setup_file(SAMPLE);

    propedit_cmd(&dir)
        .arg("edit")
        .arg(&path)
        .arg("db.user")
        .args(["--type", "float", "--value", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown type 'float'"));
}

#[test]
fn test_apply_entries_file() {
    let (dir, path) = setup_file(SAMPLE);
    let entries = dir.path().join("entries.toml");
    fs::write(
        &entries,
        r#"
[[entry]]
key = "build.number"
type = "int"
operation = "+"
value = "1"

[[entry]]
key = "db.url"
operation = "del"

[[entry]]
key = "db.user"
operation = "+"
value = "_ro"
"#,
    )
    .unwrap();

    propedit_cmd(&dir)
        .arg("apply")
        .arg(&path)
        .arg(&entries)
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 3 entries"));

    assert_eq!(
        body(&path),
        "# Database settings\ndb.user=admin_ro\n\n# Build\nbuild.number=42\n"
    );
}

#[test]
fn test_apply_missing_value_fails() {
    let (dir, path) = setup_file(SAMPLE);
    let entries = dir.path().join("entries.toml");
    fs::write(&entries, "[[entry]]\nkey = \"x\"\n").unwrap();

    propedit_cmd(&dir)
        .arg("apply")
        .arg(&path)
        .arg(&entries)
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be specified (key: x)"));
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_init_config_and_header() {
    let (dir, path) = setup_file(SAMPLE);

    propedit_cmd(&dir)
        .arg("init-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("propedit.toml"));

    // Second run refuses to overwrite
    propedit_cmd(&dir).arg("init-config").assert().failure();

    fs::write(
        dir.path().join("propedit.toml"),
        "[store]\nremove_comments = true\nheader = \"Managed\"\n",
    )
    .unwrap();

    propedit_cmd(&dir)
        .arg("del")
        .arg(&path)
        .arg("build.number")
        .assert()
        .success();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("#Managed\n#"));
    assert!(!content.contains("# Build"));
}

#[test]
fn test_keep_comments_flag_overrides_config() {
    let (dir, path) = setup_file(SAMPLE);
    fs::write(
        dir.path().join("propedit.toml"),
        "[store]\nremove_comments = true\n",
    )
    .unwrap();

    propedit_cmd(&dir)
        .arg("del")
        .arg(&path)
        .arg("build.number")
        .arg("--keep-comments")
        .assert()
        .success();

    assert!(body(&path).ends_with("\n# Build\n"));
}

#[test]
fn test_invalid_config_fails() {
    let (dir, path) = setup_file(SAMPLE);
    fs::write(dir.path().join("propedit.toml"), "[edit]\nint_pattern = \"abc\"\n").unwrap();

    propedit_cmd(&dir)
        .arg("get")
        .arg(&path)
        .arg("db.user")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse project config"));
}

#[test]
fn test_verbose_goes_to_stderr() {
    let (dir, path) = setup_file(SAMPLE);

    propedit_cmd(&dir)
        .arg("--verbose")
        .arg("get")
        .arg(&path)
        .arg("db.url")
        .assert()
        .success()
        .stdout("jdbc:h2:mem\n")
        .stderr(predicate::str::contains("[verbose"));
}
