//! Recursive file listing for the file-list endpoint.

use std::path::Path;
use walkdir::WalkDir;

/// List every file under `root`, as `/`-separated paths relative to it.
/// Unreadable entries are logged and skipped rather than failing the listing.
pub fn list_files(root: &Path) -> Vec<String> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("skipping unreadable entry under {}: {e}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(root) {
            files.push(to_slash_path(rel));
        }
    }

    files
}

/// Normalize a relative path to forward slashes, the separator the browser
/// side and the event payloads use.
pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
