//! Cloudera Manager server installation.

use shell_escape::unix::escape;

use crate::service::{ServiceOperation, running_probe};
use crate::step::{IdempotentStep, Marker, Probe};

/// Yum repository definition for Cloudera Manager 5.
pub const CLOUDERA_MANAGER_REPO: &str =
    "https://archive.cloudera.com/cm5/redhat/7/x86_64/cm/cloudera-manager.repo";
/// Cloudera Manager server unit.
pub const CM_SERVER_SERVICE: &str = "cloudera-scm-server";

/// Database settings written by the schema preparation script.
pub const CM_DB_PROPERTIES: &str = "/etc/cloudera-scm-server/db.properties";

const REPO_ID: &str = "cloudera-manager";
const PREPARE_DATABASE: &str = "/usr/share/cmf/schema/scm_prepare_database.sh";
const CM_DATABASE: &str = "cmserver";
const CM_DATABASE_USER: &str = "cmserver_user";

/// Registers the Cloudera Manager repository unless yum already lists it.
#[must_use]
pub fn cm_repository_step() -> IdempotentStep {
    IdempotentStep::new("register Cloudera Manager repository")
        .probe(Probe::present("yum repolist all", Marker::text(REPO_ID)))
        .run(format!("yum-config-manager --add-repo {CLOUDERA_MANAGER_REPO}"))
}

/// Points Cloudera Manager at its MySQL database unless `db.properties`
/// already names it.
#[must_use]
pub fn prepare_database_step(password: &str) -> IdempotentStep {
    IdempotentStep::new("prepare Cloudera Manager database")
        .probe(Probe::present(
            format!("cat {CM_DB_PROPERTIES}"),
            Marker::text(format!("com.cloudera.cmf.db.name={CM_DATABASE}")),
        ))
        .run(format!(
            "{PREPARE_DATABASE} mysql {CM_DATABASE} {CM_DATABASE_USER} {}",
            escape(password.into())
        ))
}

pub(super) fn cm_server_step() -> IdempotentStep {
    IdempotentStep::new(format!("start {CM_SERVER_SERVICE}"))
        .probe(running_probe(CM_SERVER_SERVICE))
        .service(CM_SERVER_SERVICE, ServiceOperation::StartAndEnable)
        .verify(
            running_probe(CM_SERVER_SERVICE),
            format!("{CM_SERVER_SERVICE} could not be started"),
        )
}
