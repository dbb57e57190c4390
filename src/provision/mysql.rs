//! MariaDB configuration deployment.

use std::fmt;
use std::str::FromStr;

use camino::Utf8Path;

use crate::service::ServiceOperation;
use crate::step::{IdempotentStep, Marker, Probe};

/// Deployed MariaDB configuration file.
pub const MY_CNF: &str = "/etc/my.cnf";
/// MariaDB service unit.
pub const MYSQL_SERVICE: &str = "mariadb";

const DEPLOYED_MARKER: &str = "MiddleManager";

/// Replication role selecting which `my.cnf` is deployed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MysqlRole {
    /// Replication master.
    Master,
    /// Replication slave.
    Slave,
}

impl MysqlRole {
    /// Asset file holding the configuration for this role.
    #[must_use]
    pub const fn config_file(self) -> &'static str {
        match self {
            Self::Master => "mysql_master_config.my.cnf",
            Self::Slave => "mysql_slave_config.my.cnf",
        }
    }
}

impl fmt::Display for MysqlRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Master => "master",
            Self::Slave => "slave",
        })
    }
}

impl FromStr for MysqlRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "master" => Ok(Self::Master),
            "slave" => Ok(Self::Slave),
            other => Err(format!("unknown MySQL role `{other}`, expected master or slave")),
        }
    }
}

/// Uploads `local` as [`MY_CNF`], drops the InnoDB log files, and restarts
/// MariaDB, unless the deployed file already carries the marker.
#[must_use]
pub fn my_cnf_step(local: &Utf8Path) -> IdempotentStep {
    IdempotentStep::new(format!("deploy {MY_CNF}"))
        .probe(Probe::present(format!("cat {MY_CNF}"), Marker::text(DEPLOYED_MARKER)))
        .upload(local, MY_CNF)
        .run("rm -f /var/lib/mysql/ib_logfile*")
        .service(MYSQL_SERVICE, ServiceOperation::Restart)
}
