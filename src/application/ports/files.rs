//! Output file port

use std::io;
use std::path::Path;

/// Port for checking and clearing the output location before recording
pub trait OutputFiles {
    fn exists(&self, path: &Path) -> bool;

    fn remove(&self, path: &Path) -> io::Result<()>;
}
