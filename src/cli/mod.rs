//! Command-line interface definitions for the `fleetprov` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// Top-level CLI for the `fleetprov` binary.
#[derive(Debug, Parser)]
#[command(
    name = "fleetprov",
    about = "Idempotently provision a fixed fleet of hosts over SSH",
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// Increase log detail and echo remote command output (repeatable).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub(crate) verbose: u8,
    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub(crate) quiet: bool,
    /// Subcommand to run.
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Subcommands of `fleetprov`.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Verify every host is reachable as root and reports its own name.
    #[command(name = "check")]
    Check(CheckCommand),
    /// Run an ad-hoc command on fleet hosts.
    #[command(name = "run")]
    Run(RunCommand),
    /// Apply a provisioning recipe.
    #[command(name = "provision")]
    Provision(ProvisionCommand),
}

/// Arguments for `fleetprov check`.
#[derive(Debug, Args)]
pub(crate) struct CheckCommand {
    /// Check only this host instead of the whole fleet.
    #[arg(long, value_name = "HOST")]
    pub(crate) host: Option<String>,
}

/// Arguments for `fleetprov run`.
#[derive(Debug, Args)]
pub(crate) struct RunCommand {
    /// Run only on this host instead of the whole fleet.
    #[arg(long, value_name = "HOST")]
    pub(crate) host: Option<String>,
    /// Command to execute on the remote host (use -- to separate flags).
    #[arg(required = true, trailing_var_arg = true)]
    pub(crate) command: Vec<String>,
}

/// Arguments for `fleetprov provision`.
#[derive(Debug, Args)]
pub(crate) struct ProvisionCommand {
    /// Provision only this host.
    #[arg(long, value_name = "HOST", conflicts_with = "role")]
    pub(crate) host: Option<String>,
    /// Provision the host configured for this role.
    #[arg(long, value_enum, value_name = "ROLE")]
    pub(crate) role: Option<RoleArg>,
    /// Print step reports as JSON on stdout.
    #[arg(long)]
    pub(crate) json: bool,
    /// Recipe to apply.
    #[command(subcommand)]
    pub(crate) recipe: RecipeCommand,
}

/// Named roles accepted by `--role`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum RoleArg {
    /// The Cloudera Manager host.
    Cm,
}

/// Replication role for `my-cnf`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum MyCnfRole {
    /// Deploy the master configuration.
    Master,
    /// Deploy the slave configuration.
    Slave,
}

/// Recipes available to `fleetprov provision`.
#[derive(Debug, Subcommand)]
pub(crate) enum RecipeCommand {
    /// Install a package unless `rpm -q` reports it present.
    Package {
        /// Package name.
        name: String,
        /// Service to start, enable, and verify after installing.
        #[arg(long, value_name = "SERVICE")]
        service: Option<String>,
    },
    /// Set vm.swappiness.
    Swappiness {
        /// Desired value.
        #[arg(default_value_t = 1)]
        amount: u8,
    },
    /// Disable transparent huge pages now and at boot.
    Hugepage,
    /// Deploy /etc/my.cnf and restart MariaDB.
    MyCnf {
        /// Which configuration to deploy.
        #[arg(value_enum)]
        role: MyCnfRole,
    },
    /// Install the Oracle JDK 8 RPM.
    Jdk,
    /// Install the MySQL JDBC driver.
    Jdbc,
    /// Install and start Cloudera Manager.
    ClouderaManager,
}
