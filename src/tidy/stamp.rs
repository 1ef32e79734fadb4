use std::path::{Path, PathBuf};

use crate::file;

/// Owns the stamp file of one dispatch round trip.
///
/// The file is removed when the guard drops unless [`StampGuard::keep`] was
/// called, so every early return cleans up as well.
#[derive(Debug)]
pub struct StampGuard {
    path: PathBuf,
    keep: bool,
}

impl StampGuard {
    pub fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn keep(&mut self) {
        self.keep = true;
    }
}

impl Drop for StampGuard {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(err) = file::remove_file(&self.path) {
            warn!("failed to remove stamp: {err}");
        }
    }
}
