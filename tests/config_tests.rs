//! Unit tests for fleet configuration validation.

use fleetprov::config::{ConfigError, DEFAULT_SSH_PORT, FleetConfig, SUPERUSER};
use rstest::*;

#[fixture]
fn valid_config() -> FleetConfig {
    FleetConfig {
        user: String::from(SUPERUSER),
        password: String::from("secret"),
        identity_file: None,
        port: DEFAULT_SSH_PORT,
        hostnames: vec![String::from("node1.example.com"), String::from("node2.example.com")],
        cm_host: Some(String::from("cm.example.com")),
        debug_mode: false,
        mysql_cm_dbs_password: Some(String::from("cm-db-secret")),
        files_dir: String::from("files"),
    }
}

#[rstest]
fn valid_config_passes_validation(valid_config: FleetConfig) {
    valid_config
        .validate()
        .unwrap_or_else(|err| panic!("valid config should pass: {err}"));
}

/// Verifies that validation produces actionable errors mentioning both the
/// environment variable and configuration file for each required field.
#[rstest]
#[case::user(|cfg: &mut FleetConfig| cfg.user.clear(), "FLEETPROV_USER", "user")]
#[case::password(|cfg: &mut FleetConfig| cfg.password.clear(), "FLEETPROV_PASSWORD", "password")]
#[case::empty_fleet(|cfg: &mut FleetConfig| cfg.hostnames.clear(), "FLEETPROV_HOSTNAMES", "hostnames")]
#[case::blank_host(
    |cfg: &mut FleetConfig| cfg.hostnames.push(String::from("  ")),
    "FLEETPROV_HOSTNAMES",
    "hostnames"
)]
#[case::files_dir(|cfg: &mut FleetConfig| cfg.files_dir.clear(), "FLEETPROV_FILES_DIR", "files_dir")]
fn validation_errors_are_actionable(
    mut valid_config: FleetConfig,
    #[case] mutate: fn(&mut FleetConfig),
    #[case] env_var: &str,
    #[case] toml_key: &str,
) {
    mutate(&mut valid_config);

    let error = valid_config.validate().expect_err("validation should fail");
    let ConfigError::MissingField(ref message) = error else {
        panic!("expected MissingField error, got {error:?}");
    };
    assert!(message.contains(env_var), "error should mention env var {env_var}: {message}");
    assert!(message.contains("fleetprov.toml"), "error should mention config file: {message}");
    assert!(message.contains(toml_key), "error should mention TOML key {toml_key}: {message}");
}

#[rstest]
fn identity_file_replaces_password(mut valid_config: FleetConfig) {
    valid_config.password.clear();
    valid_config.identity_file = Some(String::from("/root/.ssh/id_ed25519"));

    valid_config
        .validate()
        .unwrap_or_else(|err| panic!("identity file should satisfy credentials: {err}"));
}

#[rstest]
fn target_for_applies_fleet_defaults(mut valid_config: FleetConfig) {
    valid_config.port = 2222;

    let target = valid_config.target_for("node2.example.com");

    assert_eq!(target.hostname, "node2.example.com");
    assert_eq!(target.port, 2222);
    assert_eq!(target.credentials.user, SUPERUSER);
    assert_eq!(target.credentials.password, "secret");
}

#[rstest]
fn identity_file_tilde_is_expanded(mut valid_config: FleetConfig) {
    valid_config.identity_file = Some(String::from("~/.ssh/id_ed25519"));

    let credentials = valid_config.credentials();

    let path = credentials
        .identity_file
        .unwrap_or_else(|| panic!("identity file should be kept"));
    assert!(path.ends_with("/.ssh/id_ed25519"), "unexpected path: {path}");
    if std::env::var_os("HOME").is_some() {
        assert!(!path.starts_with('~'), "tilde should be expanded: {path}");
    }
}

#[rstest]
fn role_lookups_require_their_fields(mut valid_config: FleetConfig) {
    assert_eq!(valid_config.require_cm_host(), Ok("cm.example.com"));
    assert_eq!(valid_config.require_cm_database_password(), Ok("cm-db-secret"));

    valid_config.cm_host = None;
    valid_config.mysql_cm_dbs_password = Some(String::from(" "));

    let cm_err = valid_config.require_cm_host().expect_err("cm host is absent");
    assert!(cm_err.to_string().contains("FLEETPROV_CM_HOST"), "unexpected error: {cm_err}");
    let secret_err = valid_config
        .require_cm_database_password()
        .expect_err("blank secret is rejected");
    assert!(
        secret_err.to_string().contains("FLEETPROV_MYSQL_CM_DBS_PASSWORD"),
        "unexpected error: {secret_err}"
    );
}
