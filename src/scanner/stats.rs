//! Directory size aggregation primitives used by the tree walker.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use crate::policy::PolicyResolver;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FolderStats {
    pub size_bytes: u64,
    pub file_count: u64,
    pub subfolder_count: u64,
}

/// Files directly in `path` only: count and summed size, plus the number of
/// direct child directories. Unreadable entries contribute zero.
pub fn immediate_stats(path: &Path) -> io::Result<FolderStats> {
    let mut stats = FolderStats::default();
    for entry in fs::read_dir(path)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry in {}: {}", path.display(), e);
                continue;
            }
        };
        // DirEntry::metadata does not traverse symlinks
        let md = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!("Could not stat {}: {}", entry.path().display(), e);
                continue;
            }
        };
        if md.is_file() {
            stats.file_count += 1;
            stats.size_bytes = stats.size_bytes.saturating_add(md.len());
        } else if md.is_dir() {
            stats.subfolder_count += 1;
        }
    }
    Ok(stats)
}

/// Total files/size across the entire subtree rooted at `path`, used once
/// the depth frontier is reached. Excluded descendants do not contribute
/// and reparse points are never entered. The subfolder count stays the
/// count of direct children.
///
/// `walkdir` drives this with an explicit work list instead of language
/// recursion, so pathologically deep trees below the frontier cannot
/// overflow the stack.
pub fn recursive_stats(path: &Path, resolver: &PolicyResolver) -> io::Result<FolderStats> {
    // Surface an unreadable frontier directory as an error; deeper failures
    // only cost their own contribution.
    fs::read_dir(path)?;

    let mut stats = FolderStats::default();
    let walker = WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || (!e.path_is_symlink() && !resolver.is_excluded(e.path())));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!("Skipping unreadable subtree entry: {}", e);
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        let ft = entry.file_type();
        if ft.is_dir() {
            if entry.depth() == 1 {
                stats.subfolder_count += 1;
            }
        } else if ft.is_file() {
            match entry.metadata() {
                Ok(md) => {
                    stats.file_count += 1;
                    stats.size_bytes = stats.size_bytes.saturating_add(md.len());
                }
                Err(e) => {
                    tracing::debug!("Could not stat {}: {}", entry.path().display(), e);
                }
            }
        }
    }

    Ok(stats)
}
