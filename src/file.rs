use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use crate::{ToolError, ToolResult};

pub fn read_to_string<P: AsRef<Path>>(path: P) -> ToolResult<String> {
    debug!("read_to_string: {:?}", path.as_ref());
    let path = path.as_ref();
    let contents =
        fs::read_to_string(path).map_err(|err| ToolError::FileError(err, path.to_path_buf()))?;
    Ok(contents)
}

pub fn write<P: AsRef<Path>>(path: P, contents: &str) -> ToolResult<()> {
    debug!("write: {:?}", path.as_ref());
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        mkdirp(parent)?;
    }
    fs::write(path, contents).map_err(|err| ToolError::FileError(err, path.to_path_buf()))?;
    Ok(())
}

pub fn mkdirp<P: AsRef<Path>>(path: P) -> ToolResult<()> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() || path.exists() {
        return Ok(());
    }
    debug!("mkdirp: {:?}", path);
    fs::create_dir_all(path).map_err(|err| ToolError::FileError(err, path.to_path_buf()))?;
    Ok(())
}

/// Removes `path`, treating an already missing file as success.
pub fn remove_file<P: AsRef<Path>>(path: P) -> ToolResult<()> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("remove_file: {:?}", path);
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(ToolError::FileError(err, path.to_path_buf())),
    }
}

/// Removes the directory `path` and everything below it, treating an
/// already missing directory as success.
pub fn remove_all<P: AsRef<Path>>(path: P) -> ToolResult<()> {
    let path = path.as_ref();
    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!("remove_all: {:?}", path);
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(ToolError::FileError(err, path.to_path_buf())),
    }
}

/// Creates `path` if needed and bumps its modification time to now.
///
/// The parent directory must already exist.
pub fn touch(path: &Path) -> ToolResult<()> {
    trace!("touch {}", path.display());
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| ToolError::FileError(err, path.to_path_buf()))?;
    let now = filetime::FileTime::now();
    filetime::set_file_times(path, now, now)
        .map_err(|err| ToolError::FileError(err, path.to_path_buf()))?;
    Ok(())
}

pub fn ls(path: &Path) -> ToolResult<Vec<PathBuf>> {
    debug!("ls: {:?}", path);
    let entries =
        fs::read_dir(path).map_err(|err| ToolError::FileError(err, path.to_path_buf()))?;
    let mut files = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|err| ToolError::FileError(err, path.to_path_buf()))?;
        files.insert(entry.path());
    }
    Ok(files.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_str_eq;

    use crate::test;

    use super::*;

    #[test]
    fn test_read_to_string() {
        let tmpdir = test::tempdir();
        let path = tmpdir.path().join("nested/test.txt");
        write(&path, "Hello, world!").unwrap();
        assert_str_eq!(read_to_string(&path).unwrap(), "Hello, world!");
    }

    #[test]
    fn test_read_file_not_found() {
        let tmpdir = test::tempdir();
        let path = tmpdir.path().join("test.txt");
        let err = read_to_string(path).unwrap_err();
        assert!(matches!(err, ToolError::FileError(ref e, _) if e.kind() == io::ErrorKind::NotFound));
    }

    #[test]
    fn test_remove_missing_file_is_ok() {
        let tmpdir = test::tempdir();
        let path = tmpdir.path().join("gone.txt");
        remove_file(&path).unwrap();
        write(&path, "x").unwrap();
        remove_file(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_all() {
        let tmpdir = test::tempdir();
        let dir = tmpdir.path().join("pkg");
        remove_all(&dir).unwrap();
        write(dir.join("build/stale.o"), "").unwrap();
        remove_all(&dir).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn test_touch_creates_and_bumps_mtime() {
        let tmpdir = test::tempdir();
        let path = tmpdir.path().join("stamp");
        touch(&path).unwrap();
        assert!(path.exists());

        let old = filetime::FileTime::from_unix_time(1_000_000, 0);
        filetime::set_file_mtime(&path, old).unwrap();
        touch(&path).unwrap();
        let meta = fs::metadata(&path).unwrap();
        assert!(filetime::FileTime::from_last_modification_time(&meta) > old);
    }

    #[test]
    fn test_ls_is_sorted() {
        let tmpdir = test::tempdir();
        write(tmpdir.path().join("b"), "").unwrap();
        write(tmpdir.path().join("a"), "").unwrap();
        let names: Vec<_> = ls(tmpdir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
