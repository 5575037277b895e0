//! Local filesystem adapter for output files

use std::io;
use std::path::Path;

use crate::application::ports::OutputFiles;

/// Output files on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

impl OutputFiles for LocalFiles {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        std::fs::write(&path, b"old").unwrap();

        assert!(LocalFiles.exists(&path));
        LocalFiles.remove(&path).unwrap();
        assert!(!LocalFiles.exists(&path));
    }

    #[test]
    fn removing_a_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LocalFiles.exists(dir.path()));
        assert!(LocalFiles.remove(dir.path()).is_err());
    }
}
