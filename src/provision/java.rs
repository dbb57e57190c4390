//! Java runtime and JDBC driver installation.

use camino::Utf8Path;

use crate::error::ProvisionError;
use crate::step::{IdempotentStep, Marker, Probe};

/// Oracle JDK 8u161 RPM download. Oracle moves this link from time to time.
pub const JDK_URL: &str = "http://download.oracle.com/otn-pub/java/jdk/8u161-b12/2f38c3b165be4555a1fa6e98c45e0808/jdk-8u161-linux-x64.rpm";
/// Downloaded JDK package.
pub const JDK_RPM: &str = "/tmp/jdk-8u161-linux-x64.rpm";
/// MySQL Connector/J 5.1.45 archive.
pub const JDBC_DRIVER_URL: &str =
    "https://dev.mysql.com/get/Downloads/Connector-J/mysql-connector-java-5.1.45.tar.gz";

pub(super) const JAVA_PROFILE_ASSET: &str = "java.sh";

const JAVA_PROFILE: &str = "/etc/profile.d/java.sh";
const JDK_MARKER: &str = r"jdk1\.8";
const JDBC_RELEASE: &str = "mysql-connector-java-5.1.45";
const JDBC_DIR: &str = "/usr/share/java";
const JDBC_JAR: &str = "mysql-connector-java.jar";

/// Downloads and installs the JDK 8 RPM and deploys `profile` as the
/// `JAVA_HOME` profile script, unless a JDK 8 package is installed.
///
/// # Errors
///
/// Returns [`ProvisionError::InvalidMarker`] if the version marker does not
/// compile.
pub fn jdk_step(profile: &Utf8Path) -> Result<IdempotentStep, ProvisionError> {
    Ok(IdempotentStep::new("install JDK 8")
        .probe(Probe::present(
            "yum list installed | grep jdk",
            Marker::pattern(JDK_MARKER)?,
        ))
        .run(format!("cd /tmp; curl -L -b \"oraclelicense=a\" {JDK_URL} -O"))
        .upload(profile, JAVA_PROFILE)
        .run(format!("chmod 744 {JAVA_PROFILE}"))
        .run(format!("source {JAVA_PROFILE}"))
        .run(format!("yum localinstall -y {JDK_RPM}")))
}

/// Downloads Connector/J and installs the jar as
/// `/usr/share/java/mysql-connector-java.jar`, unless it is already there.
#[must_use]
pub fn jdbc_driver_step() -> IdempotentStep {
    IdempotentStep::new("install JDBC driver")
        .probe(Probe::present(format!("ls {JDBC_DIR}"), Marker::text(JDBC_JAR)))
        .run(format!("wget {JDBC_DRIVER_URL}"))
        .run(format!("tar -xzf {JDBC_RELEASE}.tar.gz"))
        .run(format!("mkdir -p {JDBC_DIR}"))
        .run(format!(
            "mv {JDBC_RELEASE}/{JDBC_RELEASE}-bin.jar {JDBC_DIR}/{JDBC_JAR}"
        ))
        .run(format!("rm -rf {JDBC_RELEASE}*"))
}
