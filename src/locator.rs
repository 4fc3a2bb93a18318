//! Recursive discovery of source JSON files.

use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

const SOURCE_EXTENSION: &str = "json";

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn is_source_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        && !is_hidden(entry)
        && entry.path().extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION)
}

fn absolute(root: &Path) -> PathBuf {
    match root.canonicalize() {
        Ok(path) => path,
        Err(_) if root.is_absolute() => root.to_path_buf(),
        Err(_) => std::env::current_dir()
            .map(|cwd| cwd.join(root))
            .unwrap_or_else(|_| root.to_path_buf()),
    }
}

/// Returns every `.json` file under `root`, as absolute paths in
/// lexicographic order.
///
/// Hidden files are skipped, hidden directories are still walked. A missing
/// root yields no files; unreadable entries are logged and skipped.
pub fn find_json_files(root: &Path) -> Vec<PathBuf> {
    let root = absolute(root);
    if !root.is_dir() {
        warn!("{} is not a directory, no files to process", root.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(&root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Error accessing entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(is_source_file)
        .map(DirEntry::into_path)
        .collect();
    files.sort();
    files
}
