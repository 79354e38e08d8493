//! Source provider abstraction for deck input.
//!
//! The parser never touches `std::fs` directly: the root deck and every
//! `INCLUDE` file are read through a [`SourceProvider`], so decks can be
//! parsed from memory in tests and embedding hosts.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// File access used by the parser.
pub trait SourceProvider {
    /// Read the full text of `path`.
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error>;

    /// Resolve an `INCLUDE` path against the directory of the root deck.
    /// Absolute include paths are used as given.
    fn resolve_include(&self, base: &Path, include: &str) -> PathBuf;

    /// Canonical form of `path`, used to detect include cycles.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error>;
}

/// Reads decks from disk.
pub struct FileSystemProvider;

impl SourceProvider for FileSystemProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        let bytes = std::fs::read(path)?;
        // Decks written on old systems are often Latin-1; keep what decodes.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn resolve_include(&self, base: &Path, include: &str) -> PathBuf {
        base.join(include)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error> {
        path.canonicalize()
    }
}

/// Maps paths to deck text.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    files: HashMap<PathBuf, String>,
}

impl InMemoryProvider {
    pub fn new(files: HashMap<PathBuf, String>) -> Self {
        Self { files }
    }

    /// Add or replace one file.
    pub fn with_file(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.files
            .insert(normalize_path(path.as_ref()), text.into());
        self
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !components.is_empty() {
                    components.pop();
                }
            }
            other => components.push(other),
        }
    }
    components.iter().collect()
}

impl SourceProvider for InMemoryProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        let normalized = normalize_path(path);
        self.files.get(&normalized).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found in memory: {}", normalized.display()),
            )
        })
    }

    fn resolve_include(&self, base: &Path, include: &str) -> PathBuf {
        normalize_path(&base.join(include))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error> {
        let normalized = normalize_path(path);
        if self.files.contains_key(&normalized) {
            Ok(normalized)
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!(
                    "path not found in memory provider: {}",
                    normalized.display()
                ),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_resolves_dot_and_dotdot() {
        let p = Path::new("/a/b/../c/./d");
        assert_eq!(normalize_path(p), PathBuf::from("/a/c/d"));
    }

    #[test]
    fn in_memory_read_source_found() {
        let provider = InMemoryProvider::default().with_file("/deck/CASE.DATA", "RUNSPEC\n");
        let content = provider.read_source(Path::new("/deck/./CASE.DATA")).unwrap();
        assert_eq!(content, "RUNSPEC\n");
    }

    #[test]
    fn in_memory_read_source_not_found() {
        let provider = InMemoryProvider::new(HashMap::new());
        let err = provider
            .read_source(Path::new("/missing.DATA"))
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn include_resolves_relative_to_base() {
        let provider = InMemoryProvider::default();
        assert_eq!(
            provider.resolve_include(Path::new("/deck"), "include/../grid.inc"),
            PathBuf::from("/deck/grid.inc")
        );
        assert_eq!(
            provider.resolve_include(Path::new("/deck"), "/abs/wells.inc"),
            PathBuf::from("/abs/wells.inc")
        );
    }

    #[test]
    fn in_memory_canonicalize() {
        let provider = InMemoryProvider::default().with_file("/a/b/X.inc", "");
        assert_eq!(
            provider.canonicalize(Path::new("/a/b/../b/X.inc")).unwrap(),
            PathBuf::from("/a/b/X.inc")
        );
        assert_eq!(
            provider
                .canonicalize(Path::new("/nonexistent"))
                .unwrap_err()
                .kind(),
            std::io::ErrorKind::NotFound
        );
    }
}
