//! Persisted path of the last opened database.
//!
//! The file holds a single line: the absolute path of the database.

use crate::error::{LootError, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config.txt";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    path: PathBuf,
}

impl SessionConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last saved database path, if the config file exists and is not blank.
    pub fn read_database_path(&self) -> Result<Option<PathBuf>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let line = content.trim();
        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(PathBuf::from(line)))
        }
    }

    /// Save `db_path` as the last opened database, made absolute.
    pub fn write_database_path(&self, db_path: &Path) -> Result<()> {
        let absolute = std::path::absolute(db_path).map_err(|e| {
            LootError::Config(format!("Cannot resolve {}: {}", db_path.display(), e))
        })?;
        let text = absolute.to_str().ok_or_else(|| {
            LootError::Config(format!("Path is not valid UTF-8: {}", absolute.display()))
        })?;
        std::fs::write(&self.path, text)?;
        tracing::debug!("Saved database path {} to {}", text, self.path.display());
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig::new(dir.path().join("config.txt"));
        assert_eq!(config.read_database_path().unwrap(), None);
    }

    #[test]
    fn test_blank_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.txt");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(SessionConfig::new(path).read_database_path().unwrap(), None);
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig::new(dir.path().join("config.txt"));
        let db = dir.path().join("compact.server.table.sqlite3");

        config.write_database_path(&db).unwrap();
        assert_eq!(config.read_database_path().unwrap(), Some(db));
    }

    #[test]
    fn test_read_trims_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.txt");
        std::fs::write(&path, "/srv/game/db.sqlite3\r\n").unwrap();
        assert_eq!(
            SessionConfig::new(path).read_database_path().unwrap(),
            Some(PathBuf::from("/srv/game/db.sqlite3"))
        );
    }
}
