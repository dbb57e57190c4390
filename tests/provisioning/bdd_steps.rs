//! BDD step definitions for idempotent provisioning.

use fleetprov::test_support::ScriptedShell;
use fleetprov::{AssetDir, ProvisionError, ProvisionFailure, Provisioner, Server};
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{FailureKind, ProvisionContext, ProvisionOutcome};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Provision(#[from] ProvisionError),
    #[error(transparent)]
    Failure(#[from] ProvisionFailure),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn connect(context: &ProvisionContext) -> Result<Server<ScriptedShell>, ProvisionError> {
    Ok(context.registry()?.connect(&context.hostname)?)
}

fn provisioner(server: &Server<ScriptedShell>) -> Provisioner<'_, ScriptedShell> {
    Provisioner::new(server, AssetDir::new("files"))
}

#[given("a host \"{host}\" in the fleet")]
fn host_in_fleet(mut provision_context: ProvisionContext, host: String) -> ProvisionContext {
    provision_context.config.hostnames = vec![host.clone()];
    provision_context.hostname = host;
    provision_context
}

#[given("the fleet \"{hosts}\"")]
fn fleet(mut provision_context: ProvisionContext, hosts: String) -> ProvisionContext {
    provision_context.config.hostnames = hosts.split(',').map(str::to_owned).collect();
    provision_context
}

#[given("the probe \"{command}\" reports \"{output}\"")]
fn probe_reports(provision_context: ProvisionContext, command: String, output: String) -> ProvisionContext {
    provision_context.shell().on(&command, &format!("{output}\n"));
    provision_context
}

#[given("the configured user is \"{user}\"")]
fn configured_user(mut provision_context: ProvisionContext, user: String) -> ProvisionContext {
    provision_context.config.user = user;
    provision_context
}

#[given("host \"{host}\" refuses connections")]
fn host_refuses(provision_context: ProvisionContext, host: String) -> ProvisionContext {
    provision_context.connector.refuse(&host);
    provision_context
}

fn install_times(
    provision_context: ProvisionContext,
    package: &str,
    times: usize,
) -> Result<ProvisionContext, StepError> {
    let server = connect(&provision_context)?;
    let mut results = Vec::with_capacity(times);
    for _ in 0..times {
        results.push(provisioner(&server).install(package, None)?);
    }
    drop(server);
    Ok(provision_context.with_outcome(ProvisionOutcome::Installed(results)))
}

#[when("I install package \"{package}\"")]
fn install_package(provision_context: ProvisionContext, package: String) -> Result<ProvisionContext, StepError> {
    install_times(provision_context, &package, 1)
}

#[when("the install of package \"{package}\" runs twice")]
fn install_package_twice(provision_context: ProvisionContext, package: String) -> Result<ProvisionContext, StepError> {
    install_times(provision_context, &package, 2)
}

#[when("I install \"{package}\" providing service \"{service}\"")]
fn install_with_service(
    provision_context: ProvisionContext,
    package: String,
    service: String,
) -> Result<ProvisionContext, StepError> {
    let server = connect(&provision_context)?;
    let outcome = match provisioner(&server).install_package(&package, Some(&service)) {
        Ok(report) => ProvisionOutcome::Report(report),
        Err(failure) => ProvisionOutcome::failed(&failure.error),
    };
    drop(server);
    Ok(provision_context.with_outcome(outcome))
}

#[when("I disable transparent huge pages")]
fn disable_hugepages(provision_context: ProvisionContext) -> Result<ProvisionContext, StepError> {
    let server = connect(&provision_context)?;
    let report = provisioner(&server).disable_transparent_hugepage()?;
    drop(server);
    Ok(provision_context.with_outcome(ProvisionOutcome::Report(report)))
}

#[when("I test the connection")]
fn test_connection(provision_context: ProvisionContext) -> Result<ProvisionContext, StepError> {
    let server = connect(&provision_context)?;
    let outcome = match server.test_connection() {
        Ok(()) => ProvisionOutcome::Connected(1),
        Err(err) => ProvisionOutcome::failed(&err),
    };
    drop(server);
    Ok(provision_context.with_outcome(outcome))
}

#[when("I connect to every host")]
fn connect_all(provision_context: ProvisionContext) -> Result<ProvisionContext, StepError> {
    let outcome = match provision_context.registry()?.all() {
        Ok(servers) => ProvisionOutcome::Connected(servers.len()),
        Err(err) => ProvisionOutcome::failed(&ProvisionError::from(err)),
    };
    Ok(provision_context.with_outcome(outcome))
}

#[when("I look up every host with role \"{role}\"")]
fn lookup_role(provision_context: ProvisionContext, role: String) -> Result<ProvisionContext, StepError> {
    let outcome = match provision_context.registry()?.all_with_role(&role) {
        Ok(servers) => ProvisionOutcome::Connected(servers.len()),
        Err(err) => ProvisionOutcome::failed(&err),
    };
    Ok(provision_context.with_outcome(outcome))
}

#[then("the install results are \"{results}\"")]
fn install_results(provision_context: &ProvisionContext, results: String) -> Result<(), StepError> {
    let expected: Vec<bool> = results
        .split(',')
        .map(|value| value == "true")
        .collect();
    match &provision_context.outcome {
        Some(ProvisionOutcome::Installed(actual)) if *actual == expected => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected install results {expected:?}, got {other:?}"
        ))),
    }
}

#[then("the command \"{command}\" was issued \"{count}\" times")]
fn command_issued(provision_context: &ProvisionContext, command: String, count: usize) -> Result<(), StepError> {
    let issued = provision_context
        .shell()
        .commands()
        .iter()
        .filter(|issued| **issued == command)
        .count();
    if issued == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected `{command}` {count} times, saw {issued}: {:?}",
            provision_context.shell().commands()
        )))
    }
}

#[then("no command containing \"{needle}\" was issued")]
fn no_command_containing(provision_context: &ProvisionContext, needle: String) -> Result<(), StepError> {
    let count = provision_context.shell().count(&needle);
    if count == 0 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no command containing `{needle}`, saw {count}"
        )))
    }
}

#[then("no remote command was issued")]
fn no_remote_command(provision_context: &ProvisionContext) -> Result<(), StepError> {
    let commands = provision_context.shell().commands();
    if commands.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no remote commands, saw {commands:?}"
        )))
    }
}

#[then("provisioning fails with a \"{kind}\" error")]
fn fails_with(provision_context: &ProvisionContext, kind: String) -> Result<(), StepError> {
    let expected = FailureKind::parse(&kind)
        .ok_or_else(|| StepError::Assertion(format!("unknown failure kind `{kind}`")))?;
    match &provision_context.outcome {
        Some(ProvisionOutcome::Failed { kind: actual, .. }) if *actual == expected => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected {expected:?} failure, got {other:?}"
        ))),
    }
}
