//! Behavioural smoke tests for the CLI entrypoint.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn isolated_home() -> TempDir {
    TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"))
}

#[test]
fn cli_without_arguments_prints_usage() {
    let mut cmd = cargo_bin_cmd!("fleetprov");
    cmd.assert()
        .failure()
        .code(2)
        .stdout("")
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_lists_subcommands() {
    let mut cmd = cargo_bin_cmd!("fleetprov");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("provision"));
}

#[test]
fn provision_help_lists_recipes() {
    let mut cmd = cargo_bin_cmd!("fleetprov");
    cmd.args(["provision", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hugepage"))
        .stdout(predicate::str::contains("my-cnf"))
        .stdout(predicate::str::contains("cloudera-manager"));
}

#[test]
fn check_without_fleet_reports_configuration_error() {
    let home = isolated_home();
    let mut cmd = cargo_bin_cmd!("fleetprov");
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("FLEETPROV_CONFIG_PATH")
        .env_remove("FLEETPROV_HOSTNAMES")
        .env("FLEETPROV_PASSWORD", "secret")
        .arg("check")
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn check_rejects_non_root_user_before_connecting() {
    let home = isolated_home();
    let mut cmd = cargo_bin_cmd!("fleetprov");
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("FLEETPROV_CONFIG_PATH")
        .env("FLEETPROV_USER", "deploy")
        .env("FLEETPROV_PASSWORD", "secret")
        .args(["check", "--host", "unroutable.invalid"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("must connect as root"));
}

#[test]
fn unknown_mysql_role_is_rejected_by_parser() {
    let mut cmd = cargo_bin_cmd!("fleetprov");
    cmd.args(["provision", "my-cnf", "replica"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("replica"));
}
