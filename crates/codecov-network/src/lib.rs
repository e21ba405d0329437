//! File listing for the network section of the payload.
//!
//! Walks a source tree and returns the files worth reporting, skipping
//! virtualenvs, VCS metadata, caches, vendored code and images.

use anyhow::{Context, Result};
use log::debug;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use walkdir::WalkDir;

static EXCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"/(\.?virtualenvs?|",
        r"\.?v?envs?|",
        r"\.git|",
        r"\.tox|",
        r"\.pytest_cache|",
        r"\.coverage|",
        r"coverage\.xml|",
        r"[^/]*\.egg-info|",
        r"vendor|",
        r"__pycache__|",
        r"node_modules)(/|$)",
    ))
    .unwrap()
});

pub const EXCLUDED_EXTENSIONS: [&str; 5] = ["png", "gif", "jpg", "jpeg", "md"];

/// Whether a `/`-separated path relative to the walk root is excluded.
pub fn is_excluded(relative: &str) -> bool {
    let rooted = format!("/{}", relative.trim_start_matches('/'));
    if EXCLUDE_RE.is_match(&rooted) {
        return true;
    }
    Path::new(relative)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXCLUDED_EXTENSIONS.contains(&ext))
}

/// List regular files under `root`, relative and `/`-separated, sorted.
///
/// Excluded directories are not descended into. Entries that cannot be
/// read are skipped.
pub fn list_files(root: impl AsRef<Path>) -> Result<Vec<String>> {
    let root = root.as_ref();
    let meta = std::fs::metadata(root)
        .with_context(|| format!("Failed to read source root {}", root.display()))?;
    if !meta.is_dir() {
        anyhow::bail!("Source root {} is not a directory", root.display());
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| match relative_path(root, entry.path()) {
            Some(rel) => !EXCLUDE_RE.is_match(&format!("/{rel}")),
            None => true,
        });

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(rel) = relative_path(root, entry.path()) else {
            continue;
        };
        if !is_excluded(&rel) {
            files.push(rel);
        }
    }

    files.sort();
    debug!("listed {} network files under {}", files.len(), root.display());
    Ok(files)
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
