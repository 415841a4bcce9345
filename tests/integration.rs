use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn audit_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("audit");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/audit.sqlite"

[batch]
chunk_size = 5
freshness_days = 7
"#,
        root.display()
    );

    let config_path = config_dir.join("audit.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_audit(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = audit_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run audit binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_audit(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_audit(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_audit(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_factor_add_and_list() {
    let (_tmp, config_path) = setup_test_env();

    run_audit(&config_path, &["init"]);
    let (stdout, stderr, success) = run_audit(
        &config_path,
        &[
            "factor",
            "add",
            "seo_clarity",
            "--label",
            "SEO clarity",
            "--description",
            "How clearly the page signals its topic",
        ],
    );
    assert!(success, "factor add failed: stdout={}, stderr={}", stdout, stderr);

    let (stdout, _, success) = run_audit(&config_path, &["factor", "list"]);
    assert!(success);
    assert!(stdout.contains("seo_clarity"));
    assert!(stdout.contains("quantitative"));
}

#[test]
fn test_factor_add_qualitative_with_options() {
    let (_tmp, config_path) = setup_test_env();

    run_audit(&config_path, &["init"]);
    let (stdout, stderr, success) = run_audit(
        &config_path,
        &[
            "factor",
            "add",
            "funnel_stage",
            "--label",
            "Funnel stage",
            "--kind",
            "qualitative",
            "--option",
            "Awareness",
            "--option",
            "Consideration",
            "--option",
            "Decision",
            "--option",
            "Retention",
        ],
    );
    assert!(success, "factor add failed: stdout={}, stderr={}", stdout, stderr);

    let (stdout, _, _) = run_audit(&config_path, &["factor", "list"]);
    assert!(stdout.contains("Awareness, Consideration, Decision, Retention"));
}

#[test]
fn test_factor_qualitative_requires_two_options() {
    let (_tmp, config_path) = setup_test_env();

    run_audit(&config_path, &["init"]);
    let (_, stderr, success) = run_audit(
        &config_path,
        &[
            "factor",
            "add",
            "funnel_stage",
            "--label",
            "Funnel stage",
            "--kind",
            "qualitative",
            "--option",
            "OnlyOne",
        ],
    );
    assert!(!success, "single-option qualitative factor should fail");
    assert!(stderr.contains("at least 2 options"), "got: {}", stderr);
}

#[test]
fn test_factor_add_duplicate_rejected() {
    let (_tmp, config_path) = setup_test_env();

    run_audit(&config_path, &["init"]);
    run_audit(
        &config_path,
        &["factor", "add", "seo_clarity", "--label", "SEO clarity"],
    );
    let (_, stderr, success) = run_audit(
        &config_path,
        &["factor", "add", "seo_clarity", "--label", "Again"],
    );
    assert!(!success, "duplicate factor id should fail");
    assert!(stderr.contains("already exists"), "got: {}", stderr);
}

#[test]
fn test_factor_bad_machine_name_rejected() {
    let (_tmp, config_path) = setup_test_env();

    run_audit(&config_path, &["init"]);
    let (_, stderr, success) = run_audit(
        &config_path,
        &["factor", "add", "Not-A-Machine-Name", "--label", "Bad"],
    );
    assert!(!success);
    assert!(stderr.contains("machine name"), "got: {}", stderr);
}

#[test]
fn test_factor_set_and_delete() {
    let (_tmp, config_path) = setup_test_env();

    run_audit(&config_path, &["init"]);
    run_audit(
        &config_path,
        &["factor", "add", "tone_fit", "--label", "Tone fit"],
    );

    let (_, _, success) = run_audit(
        &config_path,
        &["factor", "set", "tone_fit", "--label", "Brand tone fit", "--disable"],
    );
    assert!(success, "factor set failed");

    let (stdout, _, _) = run_audit(&config_path, &["factor", "list"]);
    assert!(stdout.contains("Brand tone fit"));
    assert!(stdout.contains("false"));

    let (stdout, _, success) = run_audit(&config_path, &["factor", "delete", "tone_fit"]);
    assert!(success);
    assert!(stdout.contains("deleted factor"));

    let (stdout, _, _) = run_audit(&config_path, &["factor", "list"]);
    assert!(stdout.contains("No factors defined."));
}

#[test]
fn test_content_add_list_show() {
    let (_tmp, config_path) = setup_test_env();

    run_audit(&config_path, &["init"]);
    let (stdout, stderr, success) = run_audit(
        &config_path,
        &[
            "content",
            "add",
            "article",
            "--id",
            "a1",
            "--title",
            "Pricing guide",
            "--body",
            "<p>Compare our <b>plans</b>.</p>",
        ],
    );
    assert!(success, "content add failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("registered article:a1"));

    let (stdout, _, _) = run_audit(&config_path, &["content", "list"]);
    assert!(stdout.contains("a1"));
    assert!(stdout.contains("Pricing guide"));

    let (stdout, _, success) = run_audit(&config_path, &["content", "show", "article", "a1"]);
    assert!(success);
    // Body renders as plain text, markup stripped
    assert!(stdout.contains("Compare our plans."));
    assert!(!stdout.contains("<p>"));
}

#[test]
fn test_content_revision_bumps_on_edit() {
    let (_tmp, config_path) = setup_test_env();

    run_audit(&config_path, &["init"]);
    run_audit(
        &config_path,
        &["content", "add", "article", "--id", "a1", "--title", "T", "--body", "one"],
    );
    run_audit(
        &config_path,
        &["content", "add", "article", "--id", "a1", "--title", "T", "--body", "two"],
    );

    let (stdout, _, _) = run_audit(&config_path, &["content", "show", "article", "a1"]);
    assert!(stdout.contains("revision: 2"), "got: {}", stdout);
}

#[test]
fn test_content_remove() {
    let (_tmp, config_path) = setup_test_env();

    run_audit(&config_path, &["init"]);
    run_audit(
        &config_path,
        &["content", "add", "article", "--id", "a1", "--title", "T", "--body", "b"],
    );

    let (_, _, success) = run_audit(&config_path, &["content", "remove", "article", "a1"]);
    assert!(success);

    let (stdout, _, _) = run_audit(&config_path, &["content", "list"]);
    assert!(stdout.contains("No content items registered."));
}

#[test]
fn test_show_without_provider_reports_status() {
    let (_tmp, config_path) = setup_test_env();

    run_audit(&config_path, &["init"]);
    run_audit(
        &config_path,
        &["factor", "add", "seo_clarity", "--label", "SEO clarity"],
    );
    run_audit(
        &config_path,
        &["content", "add", "article", "--id", "a1", "--title", "T", "--body", "Some text."],
    );

    let (stdout, _, success) = run_audit(&config_path, &["show", "article", "a1"]);
    assert!(success, "show should succeed as an informational status");
    assert!(
        stdout.contains("No chat AI provider is configured"),
        "got: {}",
        stdout
    );
}

#[test]
fn test_show_without_factors_reports_status() {
    let (_tmp, config_path) = setup_test_env();

    run_audit(&config_path, &["init"]);
    run_audit(
        &config_path,
        &["content", "add", "article", "--id", "a1", "--title", "T", "--body", "Some text."],
    );

    let (stdout, _, success) = run_audit(&config_path, &["show", "article", "a1"]);
    assert!(success);
    assert!(
        stdout.contains("No audit factors are currently enabled."),
        "got: {}",
        stdout
    );
}

#[test]
fn test_show_missing_item_fails() {
    let (_tmp, config_path) = setup_test_env();

    run_audit(&config_path, &["init"]);
    let (_, stderr, success) = run_audit(&config_path, &["show", "article", "nope"]);
    assert!(!success);
    assert!(stderr.contains("not found"), "got: {}", stderr);
}

#[test]
fn test_batch_without_provider_warns_and_continues() {
    let (_tmp, config_path) = setup_test_env();

    run_audit(&config_path, &["init"]);
    run_audit(
        &config_path,
        &["factor", "add", "seo_clarity", "--label", "SEO clarity"],
    );
    for id in ["a1", "a2", "a3"] {
        run_audit(
            &config_path,
            &["content", "add", "article", "--id", id, "--title", "T", "--body", "text"],
        );
    }

    let (stdout, stderr, success) = run_audit(&config_path, &["batch"]);
    assert!(success, "batch failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("processed: 3"));
    assert!(stdout.contains("errors: 0"));
    assert!(stdout.contains("ok"));
    assert!(stderr.contains("no chat AI provider is configured"));
}

#[test]
fn test_batch_empty_is_ok() {
    let (_tmp, config_path) = setup_test_env();

    run_audit(&config_path, &["init"]);
    let (stdout, _, success) = run_audit(&config_path, &["batch"]);
    assert!(success);
    assert!(stdout.contains("nothing to analyze"));
}

#[test]
fn test_batch_limit() {
    let (_tmp, config_path) = setup_test_env();

    run_audit(&config_path, &["init"]);
    run_audit(
        &config_path,
        &["factor", "add", "seo_clarity", "--label", "SEO clarity"],
    );
    for id in ["a1", "a2", "a3"] {
        run_audit(
            &config_path,
            &["content", "add", "article", "--id", id, "--title", "T", "--body", "text"],
        );
    }

    let (stdout, _, success) = run_audit(&config_path, &["batch", "--limit", "1"]);
    assert!(success);
    assert!(stdout.contains("candidates: 1"), "got: {}", stdout);
}

#[test]
fn test_clear_reports_deleted_rows() {
    let (_tmp, config_path) = setup_test_env();

    run_audit(&config_path, &["init"]);
    let (stdout, _, success) = run_audit(&config_path, &["clear", "article", "a1"]);
    assert!(success);
    assert!(stdout.contains("cleared 0 cached score(s)"));
}

#[test]
fn test_unknown_provider_rejected() {
    let (tmp, _) = setup_test_env();
    let root = tmp.path();

    let config_content = format!(
        r#"[db]
path = "{}/data/audit.sqlite"

[ai]
provider = "oracle"
model = "delphi-1"
"#,
        root.display()
    );
    let config_path = root.join("config").join("bad.toml");
    fs::write(&config_path, config_content).unwrap();

    let (_, stderr, success) = run_audit(&config_path, &["init"]);
    assert!(!success, "unknown provider should fail config validation");
    assert!(stderr.contains("Unknown AI provider"), "got: {}", stderr);
}

#[test]
fn test_enabled_provider_requires_model() {
    let (tmp, _) = setup_test_env();
    let root = tmp.path();

    let config_content = format!(
        r#"[db]
path = "{}/data/audit.sqlite"

[ai]
provider = "openai"
"#,
        root.display()
    );
    let config_path = root.join("config").join("nomodel.toml");
    fs::write(&config_path, config_content).unwrap();

    let (_, stderr, success) = run_audit(&config_path, &["init"]);
    assert!(!success);
    assert!(stderr.contains("ai.model must be specified"), "got: {}", stderr);
}
