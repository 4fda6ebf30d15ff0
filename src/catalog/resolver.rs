//! Portfolio root validation.

use std::path::{Path, PathBuf};

use crate::error::ConfigurationError;

/// A portfolio root that existed and was a directory when resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioRoot {
    path: PathBuf,
}

impl PortfolioRoot {
    /// Validate that `path` exists and is a directory.
    ///
    /// The path is canonicalized when possible so catalog entries carry
    /// absolute paths. No filesystem writes happen here.
    pub fn resolve(path: &Path) -> Result<Self, ConfigurationError> {
        if !path.exists() {
            return Err(ConfigurationError::RootNotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(ConfigurationError::RootNotDirectory(path.to_path_buf()));
        }

        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_root_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = PortfolioRoot::resolve(&missing).unwrap_err();
        assert_eq!(err, ConfigurationError::RootNotFound(missing));
    }

    #[test]
    fn file_root_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("root.csv");
        std::fs::write(&file, "a,b\n").unwrap();
        let err = PortfolioRoot::resolve(&file).unwrap_err();
        assert_eq!(err, ConfigurationError::RootNotDirectory(file));
    }

    #[test]
    fn existing_directory_resolves_to_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = PortfolioRoot::resolve(dir.path()).unwrap();
        assert!(root.path().is_absolute());
        assert!(root.path().is_dir());
    }
}
