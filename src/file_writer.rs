#![deny(warnings)]

// Whole-file writer bound to a single path

use crate::error::{FileWriterError, Result};
use rustix::fs::{flock, FlockOperation};
use std::fs::{self, DirBuilder, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Mode used when creating missing parent directories (rwxr-xr-x)
const DIR_MODE: u32 = 0o755;

/// Writes whole-file content to one path.
///
/// The file on disk is the only state. Every mutating call probes for the
/// file again and recreates it if it was deleted in the meantime, so a
/// writer stays usable after [`FileWriter::delete`].
///
/// Each write holds an exclusive advisory lock for its duration. The
/// read-then-write sequence of [`FileWriter::append`] and
/// [`FileWriter::prepend`] is not covered by that lock: two writers
/// appending at the same time can both read the old content and one of the
/// appends is lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWriter {
    path: PathBuf,
}

impl FileWriter {
    /// Bind a writer to `path`, creating its parent directory and an empty
    /// file if they are missing.
    ///
    /// Construction never fails. If the filesystem refuses either step the
    /// failure is logged and shows up on the first operation instead.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let writer = Self::bind(path);

        if let Err(e) = writer.ensure_directory() {
            debug!(path = %writer.path.display(), error = %e, "parent directory not ensured");
        }
        if let Err(e) = writer.create_if_needed() {
            debug!(path = %writer.path.display(), error = %e, "file not ensured");
        }

        writer
    }

    /// Bind a writer to `path` without touching the filesystem.
    ///
    /// The next mutating operation still creates the file, but not a missing
    /// parent directory.
    pub fn bind(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path this writer is bound to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file currently exists on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the full current content
    pub fn read(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|source| FileWriterError::Read {
            path: self.path.clone(),
            source,
        })
    }

    /// Read the full current content as UTF-8
    pub fn read_to_string(&self) -> Result<String> {
        let bytes = self.read()?;
        String::from_utf8(bytes).map_err(|e| FileWriterError::Read {
            path: self.path.clone(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })
    }

    /// Replace the whole content, returning `false` on any failure
    pub fn overwrite(&self, content: impl AsRef<[u8]>) -> bool {
        self.report("overwrite", self.try_overwrite(content))
    }

    /// Append to the current content, returning `false` on any failure
    pub fn append(&self, content: impl AsRef<[u8]>) -> bool {
        self.report("append", self.try_append(content))
    }

    /// Prepend to the current content, returning `false` on any failure
    pub fn prepend(&self, content: impl AsRef<[u8]>) -> bool {
        self.report("prepend", self.try_prepend(content))
    }

    /// Remove the file. Returns `false` if it did not exist or removal failed.
    pub fn delete(&self) -> bool {
        self.report("delete", self.try_delete())
    }

    /// Replace the whole content with `content`
    pub fn try_overwrite(&self, content: impl AsRef<[u8]>) -> Result<()> {
        self.create_if_needed()?;
        self.write_locked(content.as_ref())
    }

    /// Write `current + content`. The file is left untouched if the read fails.
    pub fn try_append(&self, content: impl AsRef<[u8]>) -> Result<()> {
        self.create_if_needed()?;
        let mut combined = self.read()?;
        combined.extend_from_slice(content.as_ref());
        self.write_locked(&combined)
    }

    /// Write `content + current`. The file is left untouched if the read fails.
    pub fn try_prepend(&self, content: impl AsRef<[u8]>) -> Result<()> {
        self.create_if_needed()?;
        let current = self.read()?;
        let content = content.as_ref();

        let mut combined = Vec::with_capacity(content.len() + current.len());
        combined.extend_from_slice(content);
        combined.extend_from_slice(&current);
        self.write_locked(&combined)
    }

    /// Remove the file, failing with [`FileWriterError::NotFound`] if it is absent
    pub fn try_delete(&self) -> Result<()> {
        if !self.path.exists() {
            return Err(FileWriterError::NotFound {
                path: self.path.clone(),
            });
        }

        fs::remove_file(&self.path).map_err(|source| FileWriterError::Delete {
            path: self.path.clone(),
            source,
        })
    }

    fn report(&self, operation: &str, result: Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                debug!(operation, path = %self.path.display(), error = %e, "operation failed");
                false
            }
        }
    }

    fn ensure_directory(&self) -> Result<()> {
        // A bare file name lives in the current directory.
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => return Ok(()),
        };
        if parent.is_dir() {
            return Ok(());
        }

        DirBuilder::new()
            .recursive(true)
            .mode(DIR_MODE)
            .create(parent)
            .map_err(|source| FileWriterError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })
    }

    fn create_if_needed(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }

        self.write_locked(b"").map_err(|e| match e {
            FileWriterError::Write { path, source } => FileWriterError::CreateFile { path, source },
            other => other,
        })
    }

    /// Open without truncating, lock, then truncate and write. The file is
    /// only ever truncated while the lock is held; the lock is released when
    /// the descriptor closes.
    fn write_locked(&self, content: &[u8]) -> Result<()> {
        let write_error = |source: io::Error| FileWriterError::Write {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(write_error)?;

        flock(&file, FlockOperation::LockExclusive).map_err(|errno| FileWriterError::Lock {
            path: self.path.clone(),
            source: io::Error::from(errno),
        })?;

        file.set_len(0).map_err(write_error)?;
        file.write_all(content).map_err(write_error)?;
        file.flush().map_err(write_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_parent_chain_and_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("file.txt");

        let writer = FileWriter::new(&path);

        assert!(path.is_file());
        assert_eq!(fs::read(&path).unwrap(), b"");
        assert_eq!(writer.path(), path.as_path());
    }

    #[test]
    fn test_new_sets_directory_mode() {
        let dir = TempDir::new().unwrap();
        let parent = dir.path().join("made");

        FileWriter::new(parent.join("file.txt"));

        let mode = fs::metadata(&parent).unwrap().permissions().mode();
        // umask may only clear bits
        assert_eq!(mode & 0o777 & !DIR_MODE, 0);
        assert_ne!(mode & 0o700, 0);
    }

    #[test]
    fn test_new_keeps_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("existing.txt");
        fs::write(&path, "keep me").unwrap();

        let writer = FileWriter::new(&path);
        assert_eq!(writer.read_to_string().unwrap(), "keep me");
    }

    #[test]
    fn test_bind_does_not_create() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("later.txt");

        let writer = FileWriter::bind(&path);
        assert!(!writer.exists());
        assert!(!writer.delete());

        assert!(writer.prepend("created"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "created");
    }

    #[test]
    fn test_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.txt");
        fs::write(&path, "a much longer previous content").unwrap();

        let writer = FileWriter::new(&path);
        assert!(writer.overwrite("short"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "short");

        assert!(writer.overwrite("short"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "short");
    }

    #[test]
    fn test_append_and_prepend() {
        let dir = TempDir::new().unwrap();
        let writer = FileWriter::new(dir.path().join("test.txt"));

        assert!(writer.overwrite("Initial content\n"));
        assert!(writer.append("Appended content\n"));
        assert_eq!(
            writer.read_to_string().unwrap(),
            "Initial content\nAppended content\n"
        );

        assert!(writer.prepend("Prepended content\n"));
        assert_eq!(
            writer.read_to_string().unwrap(),
            "Prepended content\nInitial content\nAppended content\n"
        );
    }

    #[test]
    fn test_append_keeps_non_utf8_bytes() {
        let dir = TempDir::new().unwrap();
        let writer = FileWriter::new(dir.path().join("raw.bin"));

        assert!(writer.overwrite([0xffu8, 0xfe]));
        assert!(writer.append(b"ok"));
        assert_eq!(writer.read().unwrap(), vec![0xff, 0xfe, b'o', b'k']);
        assert!(matches!(
            writer.read_to_string(),
            Err(FileWriterError::Read { .. })
        ));
    }

    #[test]
    fn test_delete() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.txt");
        let writer = FileWriter::new(&path);

        assert!(writer.delete());
        assert!(!path.exists());
        assert!(!writer.delete());
        assert!(matches!(
            writer.try_delete(),
            Err(FileWriterError::NotFound { .. })
        ));
    }

    #[test]
    fn test_operations_recreate_deleted_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.txt");
        let writer = FileWriter::new(&path);
        writer.overwrite("gone soon");

        assert!(writer.delete());
        assert!(writer.append("fresh"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh");

        assert!(writer.delete());
        assert!(writer.overwrite("again"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "again");
    }

    #[test]
    fn test_removed_parent_directory_is_not_recreated() {
        let dir = TempDir::new().unwrap();
        let parent = dir.path().join("sub");
        let writer = FileWriter::new(parent.join("test.txt"));
        fs::remove_dir_all(&parent).unwrap();

        assert!(!writer.overwrite("content"));
        assert!(matches!(
            writer.try_overwrite("content"),
            Err(FileWriterError::CreateFile { .. })
        ));
        assert!(!parent.exists());
    }

    #[test]
    fn test_unreadable_target_leaves_contents_untouched() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("inner"), "x").unwrap();

        let writer = FileWriter::new(&target);

        assert!(!writer.append("more"));
        assert!(!writer.prepend("more"));
        assert!(matches!(
            writer.try_append("more"),
            Err(FileWriterError::Read { .. })
        ));
        assert!(matches!(
            writer.try_prepend("more"),
            Err(FileWriterError::Read { .. })
        ));

        assert!(target.is_dir());
        let entries: Vec<_> = fs::read_dir(&target)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("inner")]);
        assert_eq!(fs::read_to_string(target.join("inner")).unwrap(), "x");
    }

    #[test]
    fn test_delete_failure_returns_false() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target");
        fs::create_dir(&target).unwrap();

        let writer = FileWriter::bind(&target);

        assert!(!writer.delete());
        assert!(matches!(
            writer.try_delete(),
            Err(FileWriterError::Delete { .. })
        ));
        assert!(target.is_dir());
    }

    #[test]
    fn test_file_in_parent_chain_fails_on_first_operation() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "plain file").unwrap();
        let path = blocker.join("sub").join("test.txt");

        let writer = FileWriter::new(&path);

        assert!(!writer.overwrite("content"));
        assert!(matches!(
            writer.try_overwrite("content"),
            Err(FileWriterError::CreateFile { .. })
        ));
        assert!(!writer.append("content"));
        assert!(blocker.is_file());
        assert_eq!(fs::read_to_string(&blocker).unwrap(), "plain file");
    }

    #[test]
    fn test_read_only_directory_fails_on_first_operation() {
        if nix::unistd::geteuid().is_root() {
            // root bypasses directory permissions
            return;
        }

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        let path = locked.join("test.txt");
        let writer = FileWriter::new(&path);
        let result = writer.try_overwrite("content");

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(!path.exists());
        match result {
            Err(e @ FileWriterError::CreateFile { .. }) => {
                assert_eq!(e.io_kind(), Some(io::ErrorKind::PermissionDenied));
            }
            other => panic!("expected CreateFile error, got {other:?}"),
        }
    }

    #[test]
    fn test_concurrent_overwrites_do_not_interleave() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shared.txt");
        let payloads: Vec<String> = (0..4)
            .map(|i| char::from(b'a' + i).to_string().repeat(64 * 1024))
            .collect();

        std::thread::scope(|scope| {
            for payload in &payloads {
                let writer = FileWriter::new(&path);
                scope.spawn(move || {
                    for _ in 0..8 {
                        assert!(writer.overwrite(payload));
                    }
                });
            }
        });

        let content = fs::read_to_string(&path).unwrap();
        assert!(payloads.contains(&content));
    }
}
