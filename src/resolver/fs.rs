//! The filesystem seen by the resolver.

use std::fs;
use std::io;
use std::path::Path;

/// What a path names on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Sockets, FIFOs, devices and anything else that is not served.
    Other,
}

/// Filesystem operations needed to resolve a request.
///
/// A missing path is reported as an error of kind
/// [`io::ErrorKind::NotFound`].
pub trait FileSystem: Send + Sync {
    /// Classify `path`, following symlinks.
    fn kind(&self, path: &Path) -> io::Result<EntryKind>;

    /// Read the whole file at `path`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Names of the immediate children of the directory at `path`, in the
    /// order the filesystem yields them.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<String>>;
}

/// The local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn kind(&self, path: &Path) -> io::Result<EntryKind> {
        let file_type = fs::metadata(path)?.file_type();
        Ok(if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Other
        })
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect()
    }
}
