//! Item catalog loaded from the `Data/items.txt` side-car file.
//!
//! Each line is `itemId;displayName`. The catalog is display-only, so lines
//! that don't fit that shape are skipped instead of failing the load.

use crate::file_utils::{base_dir, read_utf8_file};
use crate::models::UNKNOWN_ITEM_NAME;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Mapping from item id to display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemCatalog {
    names: HashMap<i32, String>,
}

impl ItemCatalog {
    /// Default catalog location: `Data/items.txt` next to the executable.
    pub fn default_path() -> PathBuf {
        base_dir().join("Data").join("items.txt")
    }

    /// Load the catalog from `path`. A missing or unreadable file yields an empty catalog.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("Item catalog not found at {}, all names resolve to {}", path.display(), UNKNOWN_ITEM_NAME);
            return Self::default();
        }

        match read_utf8_file(path) {
            Ok(content) => {
                let catalog = Self::parse(&content);
                tracing::debug!("Loaded {} item names from {}", catalog.len(), path.display());
                catalog
            }
            Err(e) => {
                tracing::warn!("Failed to read item catalog {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse catalog text. Later duplicates of an id replace earlier ones.
    pub fn parse(content: &str) -> Self {
        let mut names = HashMap::new();

        for (line_no, line) in content.lines().enumerate() {
            let parts: Vec<&str> = line.split(';').collect();
            if parts.len() != 2 {
                tracing::trace!("Skipping catalog line {}: expected 2 fields, got {}", line_no + 1, parts.len());
                continue;
            }
            match parts[0].trim().parse::<i32>() {
                Ok(item_id) => {
                    names.insert(item_id, parts[1].to_string());
                }
                Err(_) => {
                    tracing::trace!("Skipping catalog line {}: bad item id {:?}", line_no + 1, parts[0]);
                }
            }
        }

        Self { names }
    }

    /// Resolve an item id, falling back to `"Unknown"`.
    pub fn name_of(&self, item_id: i32) -> &str {
        self.names
            .get(&item_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_ITEM_NAME)
    }

    pub fn get(&self, item_id: i32) -> Option<&str> {
        self.names.get(&item_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
