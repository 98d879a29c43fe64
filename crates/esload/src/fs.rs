//! Input filesystem abstraction
//!
//! The loader only needs to know whether a resource exists on disk: if it does,
//! esbuild reads the file itself; if not, the in-memory source is sent as stdin.
//! `MemoryFileSystem` lets embedders and tests declare files without touching disk.

use parking_lot::RwLock;
use path_clean::PathClean;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Filesystem queries the host answers for loaders.
pub trait InputFileSystem: Send + Sync + std::fmt::Debug {
    /// Whether a real file exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// Checks the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFileSystem;

impl InputFileSystem for NativeFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// In-memory file set
///
/// Paths are normalized against `cwd` before storage and lookup, so "/foo/bar.js"
/// and "./bar.js" (when cwd is /foo) refer to the same entry.
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    files: Arc<RwLock<FxHashMap<PathBuf, Vec<u8>>>>,
    cwd: PathBuf,
}

impl MemoryFileSystem {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            files: Arc::new(RwLock::new(FxHashMap::default())),
            cwd: cwd.into(),
        }
    }

    pub fn add_file(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        let normalized = self.normalize(&path.into());
        self.files.write().insert(normalized, content.into());
    }

    pub fn read(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.read().get(&self.normalize(path)).cloned()
    }

    fn normalize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf().clean()
        } else {
            self.cwd.join(path).clean()
        }
    }
}

impl InputFileSystem for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.read().contains_key(&self.normalize(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn native_exists_only_for_files() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("app.js");
        std::fs::write(&file_path, b"export {}").unwrap();

        let fs = NativeFileSystem;
        assert!(fs.exists(&file_path));
        assert!(!fs.exists(temp_dir.path()));
        assert!(!fs.exists(&temp_dir.path().join("missing.js")));
    }

    #[test]
    fn memory_paths_are_normalized() {
        let fs = MemoryFileSystem::new("/project");
        fs.add_file("./src/app.js", b"a()".to_vec());

        assert!(fs.exists(Path::new("/project/src/app.js")));
        assert!(fs.exists(Path::new("src/../src/app.js")));
        assert!(!fs.exists(Path::new("/project/src/other.js")));
        assert_eq!(fs.read(Path::new("src/app.js")).unwrap(), b"a()");
    }
}
