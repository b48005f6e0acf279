//! Recursive filesystem enumeration with the skip-set and optional extension/size
//! filters. Never aborts on an unreadable directory; it skips the entry and keeps
//! walking.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::warn;

use crate::config::SKIP_ENTRIES;

fn is_skipped(path: &Path) -> bool {
    path.components().any(|c| {
        if let std::path::Component::Normal(name) = c {
            let name = name.to_string_lossy();
            if name.starts_with('.') && name != "." && name != ".." {
                return true;
            }
            SKIP_ENTRIES.iter().any(|skip| skip.eq_ignore_ascii_case(&name))
        } else {
            false
        }
    })
}

fn file_ext(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

fn walk(root: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .build()
        .filter_map(move |entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!("walk error under {}: {e}", root.display());
                None
            }
        })
        .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
        .map(|e| e.into_path())
        .filter(|p| !is_skipped(p))
}

/// Lazy sequence of regular files under `root` whose lowercased extension is in
/// `extensions`.
pub fn discover(root: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    walk(root)
        .filter(|p| extensions.iter().any(|e| e.eq_ignore_ascii_case(&file_ext(p))))
        .collect()
}

/// Lazy sequence of all regular files under `root`. If `max_size` is given, files
/// larger than the cap are skipped with a warning diagnostic.
pub fn discover_all(root: &Path, max_size: Option<u64>) -> Vec<PathBuf> {
    walk(root)
        .filter(|p| match max_size {
            None => true,
            Some(cap) => match std::fs::metadata(p) {
                Ok(m) if m.len() <= cap => true,
                Ok(m) => {
                    warn!("skipping {} ({} bytes, over {} cap)", p.display(), m.len(), cap);
                    false
                }
                Err(_) => {
                    warn!("skipping {} (stat failed)", p.display());
                    false
                }
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn discover_respects_extensions_and_skip_set() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "hi").unwrap();
        fs::write(dir.path().join("b.md"), "hi").unwrap();
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/c.txt"), "hi").unwrap();

        let found = discover(dir.path(), &["txt"]);
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("a.txt"));
    }

    #[test]
    fn discover_all_respects_size_cap() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("small.txt"), "hi").unwrap();
        fs::write(dir.path().join("big.txt"), vec![0u8; 100]).unwrap();

        let found = discover_all(dir.path(), Some(10));
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("small.txt"));
    }
}
