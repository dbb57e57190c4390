//! Provisioning recipes for fleet hosts.
//!
//! Every recipe is built from [`IdempotentStep`]s, so running one against a
//! host that is already configured only issues read-only probes. Recipes
//! that push local files resolve them through [`AssetDir`] before touching
//! the host.

use log::info;
use shell_escape::unix::escape;

use crate::assets::AssetDir;
use crate::config::FleetConfig;
use crate::error::ProvisionFailure;
use crate::server::Server;
use crate::service::{ServiceOperation, running_probe};
use crate::session::RemoteShell;
use crate::step::{IdempotentStep, Marker, Probe, StepReport};

mod cloudera;
mod java;
mod kernel;
mod mysql;

pub use cloudera::{
    CLOUDERA_MANAGER_REPO, CM_DB_PROPERTIES, CM_SERVER_SERVICE, cm_repository_step,
    prepare_database_step,
};
pub use java::{JDK_RPM, JDK_URL, JDBC_DRIVER_URL, jdbc_driver_step, jdk_step};
pub use kernel::{
    DEFAULT_SWAPPINESS, RC_LOCAL, THP_DEFRAG, THP_ENABLED, boot_line_step, hugepage_step,
    swappiness_step,
};
pub use mysql::{MY_CNF, MYSQL_SERVICE, MysqlRole, my_cnf_step};

/// Probe output that marks a package as missing.
pub const NOT_INSTALLED_MARKER: &str = "is not installed";

/// Builds the step that installs `package` and, when `service` is given,
/// starts it and verifies it is running.
#[must_use]
pub fn package_step(package: &str, service: Option<&str>) -> IdempotentStep {
    let package_arg = escape(package.into());
    let step = IdempotentStep::new(format!("install {package}"))
        .probe(Probe::absent(
            format!("rpm -q {package_arg}"),
            Marker::text(NOT_INSTALLED_MARKER),
        ))
        .run(format!("yum install -y {package_arg}"));
    let Some(name) = service else {
        return step;
    };
    step.service(name, ServiceOperation::StartAndEnable)
        .verify(running_probe(name), format!("{name} could not be started"))
}

/// A recipe selectable from the command line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Recipe {
    /// Install a package, optionally starting a service it provides.
    Package {
        /// Package name.
        name: String,
        /// Service to start and verify after installation.
        service: Option<String>,
    },
    /// Set `vm.swappiness`.
    Swappiness(u8),
    /// Disable transparent huge pages now and at boot.
    TransparentHugepage,
    /// Deploy `/etc/my.cnf` for the given replication role.
    MysqlConfig(MysqlRole),
    /// Install the Oracle JDK 8 RPM.
    Jdk,
    /// Install the MySQL JDBC driver.
    JdbcDriver,
    /// Install and start Cloudera Manager.
    ClouderaManager,
}

/// Applies recipes to one server.
#[derive(Debug)]
pub struct Provisioner<'a, S: RemoteShell> {
    server: &'a Server<S>,
    assets: AssetDir,
}

impl<'a, S: RemoteShell> Provisioner<'a, S> {
    /// Binds `server` and the directory holding uploaded files.
    #[must_use]
    pub const fn new(server: &'a Server<S>, assets: AssetDir) -> Self {
        Self { server, assets }
    }

    /// Uses the asset directory named by `config`.
    #[must_use]
    pub fn from_config(server: &'a Server<S>, config: &FleetConfig) -> Self {
        Self::new(server, AssetDir::new(config.files_dir.as_str()))
    }

    /// Server being provisioned.
    #[must_use]
    pub const fn server(&self) -> &'a Server<S> {
        self.server
    }

    /// Runs `recipe`, returning the report of every top-level step.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProvisionError`](crate::error::ProvisionError)
    /// raised by the recipe, along with the reports of the steps that ran
    /// before and including the failing one.
    pub fn run(&self, recipe: &Recipe, config: &FleetConfig) -> Result<Vec<StepReport>, ProvisionFailure> {
        match recipe {
            Recipe::Package { name, service } => self
                .install_package(name, service.as_deref())
                .map(|report| vec![report]),
            Recipe::Swappiness(amount) => self.set_swappiness(*amount).map(|report| vec![report]),
            Recipe::TransparentHugepage => self.disable_transparent_hugepage().map(|report| vec![report]),
            Recipe::MysqlConfig(role) => self.deploy_mysql_my_cnf(*role).map(|report| vec![report]),
            Recipe::Jdk => self.install_jdk().map(|report| vec![report]),
            Recipe::JdbcDriver => self.install_jdbc_driver().map(|report| vec![report]),
            Recipe::ClouderaManager => {
                let password = config.require_cm_database_password()?;
                self.install_cloudera_manager(password)
            }
        }
    }

    /// Installs `package` unless `rpm -q` shows it is present.
    ///
    /// # Errors
    ///
    /// Fails with a verification error when `service` does not report as
    /// running after installation.
    pub fn install_package(&self, package: &str, service: Option<&str>) -> Result<StepReport, ProvisionFailure> {
        info!("Checking if {package} is installed on {}", self.server.hostname());
        let report = self.server.apply(&package_step(package, service))?;
        if report.applied() {
            info!("{package} installation complete");
        } else {
            info!("{package} is already installed");
        }
        Ok(report)
    }

    /// Installs `package`, returning `true` when it was installed now and
    /// `false` when it was already present.
    ///
    /// # Errors
    ///
    /// See [`Self::install_package`].
    pub fn install(&self, package: &str, service: Option<&str>) -> Result<bool, ProvisionFailure> {
        self.install_package(package, service)
            .map(|report| report.applied())
    }

    /// Sets `vm.swappiness` to `amount` unless it already has that value.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn set_swappiness(&self, amount: u8) -> Result<StepReport, ProvisionFailure> {
        info!("Setting 'swappiness' to {amount}");
        self.server.apply(&swappiness_step(amount))
    }

    /// Disables transparent huge pages and persists the change in
    /// `rc.local`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn disable_transparent_hugepage(&self) -> Result<StepReport, ProvisionFailure> {
        self.server.apply(&hugepage_step())
    }

    /// Deploys the `my.cnf` for `role` and restarts MariaDB.
    ///
    /// # Errors
    ///
    /// Fails with [`AssetError`](crate::AssetError) when the local file is
    /// missing, before any remote command runs.
    pub fn deploy_mysql_my_cnf(&self, role: MysqlRole) -> Result<StepReport, ProvisionFailure> {
        let local = self.assets.resolve(role.config_file())?;
        self.server.apply(&my_cnf_step(&local))
    }

    /// Installs the JDK 8 RPM and its profile script.
    ///
    /// # Errors
    ///
    /// Fails with [`AssetError`](crate::AssetError) when `java.sh` is
    /// missing, before any remote command runs.
    pub fn install_jdk(&self) -> Result<StepReport, ProvisionFailure> {
        let profile = self.assets.resolve(java::JAVA_PROFILE_ASSET)?;
        self.server.apply(&jdk_step(&profile)?)
    }

    /// Installs the MySQL JDBC driver into `/usr/share/java`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn install_jdbc_driver(&self) -> Result<StepReport, ProvisionFailure> {
        self.server.apply(&jdbc_driver_step())
    }

    /// Installs Cloudera Manager, prepares its database, and starts the
    /// server.
    ///
    /// # Errors
    ///
    /// Fails with a verification error when the server does not report as
    /// running afterwards. The failure carries the reports of the
    /// stages that had already finished.
    pub fn install_cloudera_manager(&self, database_password: &str) -> Result<Vec<StepReport>, ProvisionFailure> {
        let stages = [
            package_step("yum-utils", None),
            cm_repository_step(),
            package_step("cloudera-manager-daemons", None),
            package_step("cloudera-manager-server", None),
            prepare_database_step(database_password),
            cloudera::cm_server_step(),
        ];
        let mut reports = Vec::with_capacity(stages.len());
        for stage in &stages {
            match self.server.apply(stage) {
                Ok(report) => reports.push(report),
                Err(failure) => return Err(failure.after(reports)),
            }
        }
        info!("Cloudera Manager is running on {}", self.server.hostname());
        Ok(reports)
    }
}
