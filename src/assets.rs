//! Local files pushed to hosts by provisioning recipes.
//!
//! Assets are resolved before any remote action runs so a missing file
//! fails the recipe without touching the host.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use thiserror::Error;

/// Errors raised while resolving local assets.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AssetError {
    /// The asset directory could not be opened.
    #[error("cannot open asset directory {path}: {message}")]
    Directory {
        /// Directory that was opened.
        path: Utf8PathBuf,
        /// Operating system error string.
        message: String,
    },
    /// The requested file does not exist in the asset directory.
    #[error("asset file missing: {path}")]
    Missing {
        /// Expected file path.
        path: Utf8PathBuf,
    },
}

/// Directory holding files such as `java.sh` and the MySQL configs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssetDir {
    root: Utf8PathBuf,
}

impl AssetDir {
    /// Uses `root` as the asset directory.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Asset directory root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns the path of `name`, failing when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::Directory`] when the root cannot be opened and
    /// [`AssetError::Missing`] when the file is absent.
    pub fn resolve(&self, name: &str) -> Result<Utf8PathBuf, AssetError> {
        let dir = Dir::open_ambient_dir(&self.root, ambient_authority()).map_err(|err| {
            AssetError::Directory {
                path: self.root.clone(),
                message: err.to_string(),
            }
        })?;
        let path = self.root.join(name);
        if dir.is_file(name) {
            Ok(path)
        } else {
            Err(AssetError::Missing { path })
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    #[rstest]
    fn resolve_finds_existing_files() {
        let tmp = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path");
        std::fs::write(root.join("java.sh"), "export JAVA_HOME=/usr/java/default\n")
            .expect("write asset");

        let assets = AssetDir::new(root.clone());

        assert_eq!(assets.resolve("java.sh"), Ok(root.join("java.sh")));
    }

    #[rstest]
    fn resolve_reports_missing_files() {
        let tmp = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path");

        let err = AssetDir::new(root.clone())
            .resolve("mysql_master_config.my.cnf")
            .expect_err("file is absent");

        assert_eq!(
            err,
            AssetError::Missing {
                path: root.join("mysql_master_config.my.cnf")
            }
        );
    }

    #[rstest]
    fn resolve_reports_missing_directory() {
        let err = AssetDir::new("/nonexistent/fleetprov-assets")
            .resolve("java.sh")
            .expect_err("directory is absent");

        assert!(matches!(err, AssetError::Directory { .. }));
    }
}
