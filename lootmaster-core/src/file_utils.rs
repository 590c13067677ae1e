//! File utility functions.

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Read a UTF-8 text file, dropping a leading byte-order mark if present.
/// Invalid sequences are replaced rather than rejected.
pub fn read_utf8_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(&bytes);
    if had_errors {
        tracing::warn!("{} contains invalid UTF-8, bad bytes were replaced", path.display());
    }
    Ok(text.into_owned())
}

/// Directory containing the running executable, falling back to the working directory.
pub fn base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}
