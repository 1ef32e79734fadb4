use std::path::{Path, PathBuf};

use duct::cmd;

use crate::{ToolError, ToolResult};

pub struct Git {
    pub dir: PathBuf,
}

macro_rules! git_cmd {
    ( $dir:expr $(, $arg:expr )* $(,)? ) => {
        {
            let safe = format!("safe.directory={}", $dir.display());
            cmd!("git", "-C", $dir, "-c", safe $(, $arg)*)
        }
    }
}

impl Git {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Tests whether `file` is identical to its state at `reference`.
    ///
    /// `git diff --exit-code` answers 0 for unchanged and 1 for changed;
    /// any other status is a failure of git itself.
    pub fn is_file_unchanged(&self, file: &Path, reference: &str) -> ToolResult<bool> {
        debug!(
            "testing '{}' for changes since {reference}",
            file.display()
        );
        let res = git_cmd!(&self.dir, "diff", reference, "--exit-code", file)
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()
            .map_err(|err| ToolError::GitError(format!("{err:#}"), self.dir.clone()))?;
        match res.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(ToolError::GitError(
                String::from_utf8_lossy(&res.stdout).trim().to_string(),
                file.to_path_buf(),
            )),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;

    use crate::test;

    use super::*;

    fn git(dir: &Path, args: &[&str]) {
        let status = std::process::Command::new("git")
            .arg("-C")
            .arg(dir)
            .args([
                "-c",
                "user.name=test",
                "-c",
                "user.email=test@example.com",
                "-c",
                "commit.gpgsign=false",
            ])
            .args(args)
            .status()
            .unwrap();
        assert!(status.success());
    }

    #[test]
    fn test_is_file_unchanged() {
        let tmpdir = test::tempdir();
        let dir = tmpdir.path();
        git(dir, &["init", "-q"]);
        let file = dir.join("tracked.txt");
        fs::write(&file, "one\n").unwrap();
        git(dir, &["add", "tracked.txt"]);
        git(dir, &["commit", "-q", "-m", "init"]);

        let repo = Git::new(dir.to_path_buf());
        assert!(repo.is_file_unchanged(&file, "HEAD").unwrap());

        fs::write(&file, "two\n").unwrap();
        assert!(!repo.is_file_unchanged(&file, "HEAD").unwrap());
    }

    #[test]
    fn test_unknown_reference_is_an_error() {
        let tmpdir = test::tempdir();
        let dir = tmpdir.path();
        git(dir, &["init", "-q"]);
        let file = dir.join("tracked.txt");
        fs::write(&file, "one\n").unwrap();

        let repo = Git::new(dir.to_path_buf());
        let err = repo
            .is_file_unchanged(&file, "no-such-ref")
            .unwrap_err();
        assert!(matches!(err, ToolError::GitError(..)));
    }
}
