//! BDD scenarios for idempotent provisioning.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ProvisionContext, provision_context};

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Skip installing a package that is already present"
)]
fn scenario_skip_installed(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Install a missing package"
)]
fn scenario_install_missing(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Append a missing boot line"
)]
fn scenario_append_boot_line(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Keep an existing boot line"
)]
fn scenario_keep_boot_line(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Reject a non-root identity before any remote command"
)]
fn scenario_reject_non_root(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Fail when a started service is not running"
)]
fn scenario_service_not_running(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Fail the whole fleet when one host is unreachable"
)]
fn scenario_fleet_unreachable(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Role-based lookup is not implemented"
)]
fn scenario_role_lookup(provision_context: ProvisionContext) {
    drop(provision_context);
}
