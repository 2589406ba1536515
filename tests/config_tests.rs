//! Configuration system tests
//!
//! Tests configuration loading, validation, and environment overrides

mod common;

use std::fs;
use std::path::PathBuf;

use common::TestEnv;
use predicates::prelude::*;

/// Test fixture for configuration testing
struct ConfigFixture {
    env: TestEnv,
    config_path: PathBuf,
}

impl ConfigFixture {
    fn new() -> Self {
        let env = TestEnv::new();
        let config_path = env.home().join("config.toml");
        Self { env, config_path }
    }

    fn write_config(&self, content: &str) {
        fs::write(&self.config_path, content).unwrap();
    }

    fn path(&self) -> &str {
        self.config_path.to_str().unwrap()
    }

    /// `gpt-studio <args> --config <fixture>`
    fn run(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.env
            .cmd()
            .args(args)
            .arg("--config")
            .arg(self.path())
            .assert()
    }
}

// ─────────────────────────────────────────────────────────────────
// Valid Configuration Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_empty_config_uses_defaults() {
    let fixture = ConfigFixture::new();
    fixture.write_config("");

    fixture
        .run(&["config", "validate"])
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_full_config() {
    let fixture = ConfigFixture::new();
    fixture.write_config(
        r#"
[openai]
base_url = "http://localhost:11434/v1"
api_key = ""
model = "llama3"
max_tokens = 512
temperature = 0.2
timeout_secs = 10

[storage]
data_dir = "/tmp/gpt-studio"
persona_dir = "/tmp/gpt-studio/personas"
credentials_file = "/tmp/gpt-studio/credentials"

[sharing]
base_url = "https://studio.example.com"

[logging]
level = "debug"
max_file_size_mb = 50
max_files = 3
json_format = true
"#,
    );

    fixture.run(&["config", "validate"]).success();

    fixture
        .run(&["config", "show"])
        .success()
        .stdout(predicate::str::contains("model = \"llama3\""))
        .stdout(predicate::str::contains("https://studio.example.com"))
        .stdout(predicate::str::contains("json_format = true"));
}

#[test]
fn test_generated_config_is_valid() {
    let env = TestEnv::new();
    let path = env.home().join("generated.toml");

    env.cmd()
        .args(["config", "init", "-p", path.to_str().unwrap()])
        .assert()
        .success();

    env.cmd()
        .args(["config", "validate", "--config", path.to_str().unwrap()])
        .assert()
        .success();
}

// ─────────────────────────────────────────────────────────────────
// Invalid Configuration Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_invalid_base_url() {
    let fixture = ConfigFixture::new();
    fixture.write_config(
        r#"
[openai]
base_url = "ftp://models.example.com"
"#,
    );

    fixture
        .run(&["config", "validate"])
        .failure()
        .code(10)
        .stderr(predicate::str::contains("E102"))
        .stderr(predicate::str::contains("http:// or https://"));
}

#[test]
fn test_invalid_temperature() {
    let fixture = ConfigFixture::new();
    fixture.write_config(
        r#"
[openai]
temperature = 3.5
"#,
    );

    fixture
        .run(&["config", "validate"])
        .failure()
        .stderr(predicate::str::contains("temperature"));
}

#[test]
fn test_zero_timeout() {
    let fixture = ConfigFixture::new();
    fixture.write_config(
        r#"
[openai]
timeout_secs = 0
"#,
    );

    fixture.run(&["config", "validate"]).failure();
}

#[test]
fn test_invalid_log_level() {
    let fixture = ConfigFixture::new();
    fixture.write_config(
        r#"
[logging]
level = "invalid_level"
"#,
    );

    fixture
        .run(&["config", "validate"])
        .failure()
        .stderr(predicate::str::contains("Invalid log level"));
}

#[test]
fn test_malformed_toml() {
    let fixture = ConfigFixture::new();
    fixture.write_config(
        r#"
[openai
model = "gpt-4"
"#,
    );

    fixture
        .run(&["config", "validate"])
        .failure()
        .code(10)
        .stderr(predicate::str::contains("E101"));
}

// ─────────────────────────────────────────────────────────────────
// Environment Override Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_env_overrides_file() {
    let fixture = ConfigFixture::new();
    fixture.write_config(
        r#"
[openai]
model = "from-file"
"#,
    );

    fixture
        .env
        .cmd()
        .env("GPT_STUDIO_OPENAI_MODEL", "from-env")
        .args(["config", "show", "--config", fixture.path()])
        .assert()
        .success()
        .stdout(predicate::str::contains("model = \"from-env\""));
}

#[test]
fn test_config_file_via_env_var() {
    let fixture = ConfigFixture::new();
    fixture.write_config(
        r#"
[sharing]
base_url = "https://share.example.org"
"#,
    );

    fixture
        .env
        .cmd()
        .env("GPT_STUDIO_CONFIG", fixture.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://share.example.org"));
}

#[test]
fn test_config_in_working_directory_is_found() {
    let env = TestEnv::new();
    env.write_file(
        "gpt-studio.toml",
        "[sharing]\nbase_url = \"https://cwd.example.org\"\n",
    );

    env.cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://cwd.example.org"));
}

#[test]
fn test_storage_paths_from_file() {
    let fixture = ConfigFixture::new();
    let persona_dir = fixture.env.home().join("custom-personas");
    fixture.write_config(&format!(
        "[storage]\npersona_dir = \"{}\"\n",
        persona_dir.display()
    ));

    fixture
        .env
        .cmd()
        .env_remove("GPT_STUDIO_DATA_DIR")
        .args(["persona", "new", "Writer", "-i", "Write.", "--config", fixture.path()])
        .assert()
        .success();

    let entries: Vec<_> = fs::read_dir(&persona_dir).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_share_link_uses_configured_base() {
    let fixture = ConfigFixture::new();
    fixture.write_config("[sharing]\nbase_url = \"https://studio.example.com/\"\n");

    let id = fixture.env.create_persona(&["Writer", "-i", "Write."]);

    fixture
        .run(&["persona", "share", &id])
        .success()
        .stdout(predicate::str::contains(format!(
            "https://studio.example.com/gpt/{}",
            id
        )));
}
