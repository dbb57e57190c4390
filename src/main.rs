//! Binary entry point for the `fleetprov` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use log::LevelFilter;
use shell_escape::unix::escape;
use thiserror::Error;

use fleetprov::server::require_superuser;
use fleetprov::{
    ConfigError, ConnectionError, Connector, FleetConfig, MysqlRole, ProvisionError, Provisioner,
    Recipe, Role, Server, ServerRegistry, StepOutcome, StepReport, TransportError,
};

mod cli;

use cli::{
    CheckCommand, Cli, Command, MyCnfRole, ProvisionCommand, RecipeCommand, RoleArg, RunCommand,
};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("provisioning failed: {0}")]
    Provision(#[from] ProvisionError),
    #[error("no host is configured for role `{0}`")]
    UnknownRole(String),
    #[error("failed to render report: {0}")]
    Report(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
    #[error("remote command terminated without an exit status")]
    MissingExitCode,
    #[error("invalid command argument: {0}")]
    InvalidCommand(String),
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    let exit_code = match dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_millis()
        .init();
}

fn dispatch(cli: Cli) -> Result<i32, CliError> {
    let mut config = FleetConfig::load_without_cli_args()?;
    if cli.verbose > 0 {
        config.debug_mode = true;
    }

    let mut stdout = io::stdout();
    match cli.command {
        Command::Check(args) => {
            check_fleet(&config, &args)?;
            let registry = ServerRegistry::with_ssh(config)?;
            check(&registry, &args, &mut stdout)
        }
        Command::Run(args) => {
            let registry = ServerRegistry::with_ssh(config)?;
            run_command(&registry, &args, &mut stdout)
        }
        Command::Provision(args) => {
            let registry = ServerRegistry::with_ssh(config)?;
            provision(&registry, &args, &mut stdout)
        }
    }
}

/// Rejects a non-root identity before any host is dialled. The identity is
/// fleet-wide, so one check covers every targeted host.
fn check_fleet(config: &FleetConfig, args: &CheckCommand) -> Result<(), CliError> {
    let hosts = args
        .host
        .clone()
        .unwrap_or_else(|| config.hostnames.join(", "));
    require_superuser(&hosts, &config.credentials())?;
    Ok(())
}

fn targets<C: Connector>(
    registry: &ServerRegistry<C>,
    host: Option<&str>,
) -> Result<Vec<Server<C::Shell>>, CliError> {
    match host {
        Some(hostname) => Ok(vec![registry.connect(hostname)?]),
        None => Ok(registry.all()?),
    }
}

fn check<C: Connector>(
    registry: &ServerRegistry<C>,
    args: &CheckCommand,
    mut out: impl Write,
) -> Result<i32, CliError> {
    for server in targets(registry, args.host.as_deref())? {
        server.test_connection()?;
        writeln!(out, "{}: ok", server.hostname())?;
    }
    Ok(0)
}

fn run_command<C: Connector>(
    registry: &ServerRegistry<C>,
    args: &RunCommand,
    mut out: impl Write,
) -> Result<i32, CliError> {
    validate_command_args(&args.command)?;
    let remote_command = render_remote_command(&args.command);

    let mut exit_code = None;
    for server in targets(registry, args.host.as_deref())? {
        let result = server.run(&remote_command)?;
        write!(out, "{}", result.output)?;
        exit_code = result.exit_code;
    }
    exit_code.ok_or(CliError::MissingExitCode)
}

fn provision<C: Connector>(
    registry: &ServerRegistry<C>,
    args: &ProvisionCommand,
    mut out: impl Write,
) -> Result<i32, CliError> {
    let servers = match args.role {
        Some(role) => {
            let identifier = role_of(role).identifier();
            let server = registry
                .find(identifier)?
                .ok_or_else(|| CliError::UnknownRole(identifier.to_owned()))?;
            vec![server]
        }
        None => targets(registry, args.host.as_deref())?,
    };

    let recipe = to_recipe(&args.recipe);
    let mut reports = Vec::new();
    for server in &servers {
        server.test_connection()?;
        let provisioner = Provisioner::from_config(server, registry.config());
        match provisioner.run(&recipe, registry.config()) {
            Ok(host_reports) => reports.extend(host_reports),
            Err(failure) => {
                // Show what ran before the failure, then surface the error.
                reports.extend(failure.reports);
                write_reports(&mut out, &reports, args.json)?;
                return Err(failure.error.into());
            }
        }
    }

    write_reports(&mut out, &reports, args.json)?;
    Ok(0)
}

fn write_reports(mut out: impl Write, reports: &[StepReport], json: bool) -> Result<(), CliError> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(reports)?)?;
    } else {
        write_summary(&mut out, reports)?;
    }
    Ok(())
}

fn write_summary(mut out: impl Write, reports: &[StepReport]) -> io::Result<()> {
    for report in reports {
        let outcome = match report.outcome {
            StepOutcome::Applied => "applied",
            StepOutcome::AlreadySatisfied => "already satisfied",
            StepOutcome::Failed => "failed",
        };
        writeln!(out, "{}: {}: {outcome}", report.host, report.name)?;
    }
    Ok(())
}

const fn role_of(role: RoleArg) -> Role {
    match role {
        RoleArg::Cm => Role::ClouderaManager,
    }
}

fn to_recipe(command: &RecipeCommand) -> Recipe {
    match command {
        RecipeCommand::Package { name, service } => Recipe::Package {
            name: name.clone(),
            service: service.clone(),
        },
        RecipeCommand::Swappiness { amount } => Recipe::Swappiness(*amount),
        RecipeCommand::Hugepage => Recipe::TransparentHugepage,
        RecipeCommand::MyCnf { role } => Recipe::MysqlConfig(match role {
            MyCnfRole::Master => MysqlRole::Master,
            MyCnfRole::Slave => MysqlRole::Slave,
        }),
        RecipeCommand::Jdk => Recipe::Jdk,
        RecipeCommand::Jdbc => Recipe::JdbcDriver,
        RecipeCommand::ClouderaManager => Recipe::ClouderaManager,
    }
}

fn render_remote_command(args: &[String]) -> String {
    args.iter()
        .map(|arg| escape(arg.as_str().into()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn validate_command_args(args: &[String]) -> Result<(), CliError> {
    for arg in args {
        if arg
            .chars()
            .any(|ch| matches!(ch, '\n' | '\r' | '\u{0000}'..='\u{001F}' | '\u{007F}'))
        {
            return Err(CliError::InvalidCommand(String::from(concat!(
                "command arguments must not contain control characters (ASCII ",
                "0x00-0x1F or 0x7F, e.g. newline, carriage return, tab, NUL)"
            ))));
        }
    }
    Ok(())
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
