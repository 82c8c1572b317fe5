//! Lazy child listing over the live filesystem.
//!
//! Backs the interactive override editor: plain directory listing with
//! hidden/system/reparse filtering, annotated with any configured override
//! depth. Reads the filesystem, never the snapshot store.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::config::PartitionConfig;
use crate::error::{AppError, AppResult};
use crate::policy::normalize_key;
use crate::scanner::is_reparse_point;
use crate::types::FolderTreeNode;

/// Direct child directories of `parent`, sorted by name. Unreadable
/// children are silently skipped; an unreadable `parent` is an error.
pub fn list_children(parent: &Path, cfg: &PartitionConfig) -> AppResult<Vec<FolderTreeNode>> {
    if !parent.is_dir() {
        return Err(AppError::NotFound(format!("Directory does not exist: {}", parent.display())));
    }

    let override_map: HashMap<String, u32> = cfg
        .overrides
        .iter()
        .filter(|o| o.enabled)
        .map(|o| (normalize_key(Path::new(&o.path)), o.scan_depth))
        .collect();

    let mut nodes = Vec::new();
    for entry in fs::read_dir(parent)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry in {}: {}", parent.display(), e);
                continue;
            }
        };
        let md = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!("Could not stat {}: {}", entry.path().display(), e);
                continue;
            }
        };
        if !md.is_dir() || is_reparse_point(&md) || is_hidden_or_system(&entry, &md) {
            continue;
        }

        let path = entry.path();
        nodes.push(FolderTreeNode {
            name: entry.file_name().to_string_lossy().to_string(),
            override_depth: override_map.get(&normalize_key(&path)).copied(),
            has_children: has_subdirectories(&path),
            path: path.to_string_lossy().to_string(),
        });
    }

    nodes.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(nodes)
}

pub fn has_subdirectories(path: &Path) -> bool {
    match fs::read_dir(path) {
        Ok(rd) => rd
            .flatten()
            .any(|e| e.metadata().map(|m| m.is_dir()).unwrap_or(false)),
        Err(_) => false,
    }
}

#[cfg(windows)]
fn is_hidden_or_system(_entry: &fs::DirEntry, md: &fs::Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    const FILE_ATTRIBUTE_SYSTEM: u32 = 0x4;
    let attrs = md.file_attributes();
    (attrs & FILE_ATTRIBUTE_HIDDEN) != 0 || (attrs & FILE_ATTRIBUTE_SYSTEM) != 0
}

#[cfg(not(windows))]
fn is_hidden_or_system(entry: &fs::DirEntry, _md: &fs::Metadata) -> bool {
    // Unix has no hidden/system attributes; dotfile convention applies
    entry.file_name().to_string_lossy().starts_with('.')
}
