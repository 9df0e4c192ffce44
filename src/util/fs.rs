//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use anyhow::{Context, Result};
use glob::glob;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write bytes to a file, creating parent directories if needed.
pub fn write_bytes(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Make `path` absolute against the current directory without touching the
/// filesystem.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .with_context(|| format!("failed to resolve path: {}", path.display()))
}

/// Render a directory path with exactly one trailing separator, as MSBuild
/// expects for `IntDir` and `OutDir`.
pub fn dir_with_separator(path: &Path) -> String {
    let mut text = path.display().to_string();
    while text.ends_with(['/', '\\']) && text.len() > 1 {
        text.pop();
    }
    // a bare root keeps its only separator
    if !text.ends_with(['/', '\\']) {
        text.push(MAIN_SEPARATOR);
    }
    text
}

/// Expand glob patterns relative to a base directory.
///
/// Patterns without glob metacharacters are passed through unchanged, even
/// when the file does not exist, so the caller can report it.
pub fn glob_files(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            results.push(base.join(pattern));
            continue;
        }

        let full_pattern = base.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for entry in glob(&pattern_str).with_context(|| format!("invalid glob pattern: {}", pattern))? {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        results.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}
