//! Integration tests for the layered configuration loader

use super::test_utils::{env_lock, EnvState};
use persona_sim::config::{global_config_path, ConfigLoader, WORKING_CONFIG_FILE};
use persona_sim::generation::RetryPolicy;
use std::time::Duration;
use tempfile::TempDir;

const ENV_KEYS: &[&str] = &[
    "XDG_CONFIG_HOME",
    "PERSONA_SIM_ENDPOINT__URL",
    "PERSONA_SIM_RETRY__ATTEMPT_TIMEOUT_MS",
];

fn write_global(xdg: &TempDir, contents: &str) {
    let dir = xdg.path().join("persona-sim");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), contents).unwrap();
}

#[test]
fn test_global_file_follows_xdg_config_home() {
    let _lock = env_lock();
    let _env = EnvState::capture(ENV_KEYS);
    let xdg = TempDir::new().unwrap();
    std::env::set_var("XDG_CONFIG_HOME", xdg.path());

    assert_eq!(
        global_config_path().unwrap(),
        xdg.path().join("persona-sim").join("config.toml")
    );
}

#[test]
fn test_working_directory_file_overrides_global() {
    let _lock = env_lock();
    let _env = EnvState::capture(ENV_KEYS);
    let xdg = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    std::env::set_var("XDG_CONFIG_HOME", xdg.path());

    write_global(
        &xdg,
        r#"
[endpoint]
url = "http://global.example/api/generate-persona"

[retry]
backoff_ms = 500
"#,
    );
    std::fs::write(
        work.path().join(WORKING_CONFIG_FILE),
        r#"
[endpoint]
url = "http://local.example/api/generate-persona"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load(work.path()).unwrap();
    assert_eq!(config.endpoint.url, "http://local.example/api/generate-persona");
    assert_eq!(config.retry.backoff_ms, 500, "global value survives when not overridden");
    assert!(config.validate().is_ok());
}

#[test]
fn test_explicit_file_replaces_discovered_files() {
    let _lock = env_lock();
    let _env = EnvState::capture(ENV_KEYS);
    let xdg = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    std::env::set_var("XDG_CONFIG_HOME", xdg.path());
    write_global(&xdg, "[retry]\nbackoff_ms = 500\n");

    let explicit = work.path().join("custom.toml");
    std::fs::write(&explicit, "[retry]\nmax_attempts = 4\n").unwrap();

    let config = ConfigLoader::load_from_file(&explicit).unwrap();
    assert_eq!(config.retry.max_attempts, 4);
    assert_eq!(config.retry.backoff_ms, 250, "global file is not consulted");
}

#[test]
fn test_environment_overrides_reach_retry_policy() {
    let _lock = env_lock();
    let _env = EnvState::capture(ENV_KEYS);
    let xdg = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    std::env::set_var("XDG_CONFIG_HOME", xdg.path());
    std::env::set_var("PERSONA_SIM_RETRY__ATTEMPT_TIMEOUT_MS", "5000");
    std::env::set_var("PERSONA_SIM_ENDPOINT__URL", "http://env.example/generate");

    let config = ConfigLoader::load(work.path()).unwrap();
    assert_eq!(config.endpoint.url, "http://env.example/generate");

    let policy = RetryPolicy::from(&config.retry);
    assert_eq!(policy.attempt_timeout, Duration::from_secs(5));
    assert_eq!(policy.max_attempts, 2);
}

#[test]
fn test_invalid_values_fail_validation() {
    let _lock = env_lock();
    let _env = EnvState::capture(ENV_KEYS);
    let xdg = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    std::env::set_var("XDG_CONFIG_HOME", xdg.path());
    std::fs::write(
        work.path().join(WORKING_CONFIG_FILE),
        "[endpoint]\nurl = \"not a url\"\n\n[retry]\nmax_attempts = 0\n",
    )
    .unwrap();

    let errors = ConfigLoader::load(work.path()).unwrap().validate().unwrap_err();
    assert_eq!(errors.len(), 2);
}
