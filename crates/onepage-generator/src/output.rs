//! All-or-nothing file updates.
//!
//! Output is written to a temporary file in the destination directory and
//! renamed over the target, so a concurrent reader sees either the previous
//! file or the new one, never a partial write.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::debug;

const TEMP_PREFIX: &str = ".onepage-";

/// A fully written temporary file waiting to replace its target.
///
/// Dropping it without [`StagedFile::commit`] removes the temporary file and
/// leaves the target untouched.
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
    bytes: usize,
}

impl StagedFile {
    /// File this stage will replace.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Rename the staged file over its target.
    pub fn commit(self) -> io::Result<()> {
        persist(self.temp, &self.target)?;
        debug!(path = %self.target.display(), bytes = self.bytes, "wrote file");
        Ok(())
    }
}

/// Write `bytes` to a temporary file next to `target` without touching it.
///
/// The parent directory is created if missing.
pub fn stage(target: &Path, bytes: &[u8]) -> io::Result<StagedFile> {
    let mut temp = temp_beside(target)?;
    temp.write_all(bytes)?;
    // Temp files are created 0600; published pages should be world-readable.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
    }
    temp.as_file().sync_all()?;

    Ok(StagedFile {
        temp,
        target: target.to_path_buf(),
        bytes: bytes.len(),
    })
}

/// Atomically replace `target` with `bytes`.
///
/// The parent directory is created if missing.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> io::Result<()> {
    stage(target, bytes)?.commit()
}

/// Atomically replace `target` with a copy of `source`.
pub fn copy_atomic(source: &Path, target: &Path) -> io::Result<u64> {
    let temp = temp_beside(target)?;
    let copied = fs::copy(source, temp.path())?;
    persist(temp, target)?;

    debug!(
        src = %source.display(),
        dest = %target.display(),
        bytes = copied,
        "copied file"
    );
    Ok(copied)
}

fn temp_beside(target: &Path) -> io::Result<NamedTempFile> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".tmp")
        .tempfile_in(dir)
}

fn persist(temp: NamedTempFile, target: &Path) -> io::Result<()> {
    // The temp file is removed on drop if the rename fails.
    temp.persist(target).map(|_| ()).map_err(|e| e.error)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_write_creates_parent() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("dist").join("index.html");

        write_atomic(&target, b"<h1>Hi</h1>").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "<h1>Hi</h1>");
    }

    #[test]
    fn test_write_replaces_not_appends() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("index.html");

        write_atomic(&target, b"first version, longer").unwrap();
        write_atomic(&target, b"second").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "second");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("index.html");

        write_atomic(&target, b"a").unwrap();
        write_atomic(&target, b"b").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("index.html")]);
    }

    #[test]
    fn test_copy_atomic() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("resume.pdf");
        fs::write(&source, b"%PDF-1.4").unwrap();
        let target = dir.path().join("dist").join("resume.pdf");

        let copied = copy_atomic(&source, &target).unwrap();

        assert_eq!(copied, 8);
        assert_eq!(fs::read(&target).unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn test_copy_missing_source_leaves_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("resume.pdf");
        fs::write(&target, b"old").unwrap();

        assert!(copy_atomic(&dir.path().join("nope.pdf"), &target).is_err());
        assert_eq!(fs::read(&target).unwrap(), b"old");
    }

    #[test]
    fn test_dropped_stage_leaves_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("index.html");
        write_atomic(&target, b"old").unwrap();

        let staged = stage(&target, b"new").unwrap();
        assert_eq!(staged.target(), target.as_path());
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");
        drop(staged);

        assert_eq!(fs::read_to_string(&target).unwrap(), "old");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_committed_stage_replaces_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("index.html");
        write_atomic(&target, b"old").unwrap();

        stage(&target, b"new").unwrap().commit().unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    }
}
