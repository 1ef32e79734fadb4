//! Collects compile flags from the `flags.make` files of a CMake build tree.

use std::path::{Path, PathBuf};

use clap::Parser;
use walkdir::WalkDir;

use crate::{ToolError, ToolResult, file, regex};

#[derive(Parser, Debug)]
#[command(name = "compile-flags")]
#[command(about = "Searches a CMake build tree for flags.make files and prints the compile flags", long_about = None)]
pub struct FlagsArgs {
    /// Root of the build tree, defaults to the current directory
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,
}

pub fn run(args: &FlagsArgs) -> ToolResult<Vec<String>> {
    let root = match &args.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()
            .map_err(|err| ToolError::FileError(err, PathBuf::from(".")))?,
    };
    let mut flags = Vec::new();
    for path in find_flags_files(&root)? {
        let text = file::read_to_string(&path)?;
        merge_unique(&mut flags, scan(&text));
    }
    Ok(flags)
}

/// All `flags.make` files below `dir`, in sorted traversal order.
///
/// Symlinks are not followed.
pub fn find_flags_files(dir: &Path) -> ToolResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(dir).to_path_buf();
            ToolError::FileError(err.into(), path)
        })?;
        if entry.file_type().is_file() && entry.file_name() == "flags.make" {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// Extracts the values of `<LANG>_FLAGS` and `<LANG>_DEFINES` assignments.
pub fn scan(text: &str) -> Vec<String> {
    let re = regex!(r"(?m)[a-zA-Z]+_(?:FLAGS|DEFINES)\s*=[ \t]*(.*)$");
    let mut flags = Vec::new();
    for caps in re.captures_iter(text) {
        let value = caps.get(1).map_or("", |m| m.as_str());
        merge_unique(&mut flags, value.split_whitespace().map(String::from));
    }
    flags
}

fn merge_unique(into: &mut Vec<String>, flags: impl IntoIterator<Item = String>) {
    for flag in flags {
        if !into.contains(&flag) {
            into.push(flag);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::test;

    use super::*;

    const FLAGS_MAKE: &str = "\
# CMAKE generated file: DO NOT EDIT!
CXX_DEFINES = -DFOO -DBAR=1

CXX_INCLUDES = -I/src/include

CXX_FLAGS = -O2 -g   -std=c++17 -DFOO
";

    #[test]
    fn test_scan() {
        assert_eq!(
            scan(FLAGS_MAKE),
            vec!["-DFOO", "-DBAR=1", "-O2", "-g", "-std=c++17"]
        );
    }

    #[test]
    fn test_run_walks_tree() {
        let tmpdir = test::tempdir();
        let root = tmpdir.path();
        file::write(root.join("a/CMakeFiles/a.dir/flags.make"), FLAGS_MAKE).unwrap();
        file::write(
            root.join("b/CMakeFiles/b.dir/flags.make"),
            "C_FLAGS = -Wall -O2\n",
        )
        .unwrap();
        file::write(root.join("b/CMakeFiles/b.dir/other.make"), "C_FLAGS = -Wextra\n").unwrap();

        let flags = run(&FlagsArgs {
            root: Some(root.to_path_buf()),
        })
        .unwrap();
        assert_eq!(
            flags,
            vec!["-DFOO", "-DBAR=1", "-O2", "-g", "-std=c++17", "-Wall"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_is_not_followed() {
        let tmpdir = test::tempdir();
        let root = tmpdir.path();
        file::write(root.join("a/flags.make"), "CXX_FLAGS = -O2\n").unwrap();
        std::os::unix::fs::symlink(root, root.join("a/loop")).unwrap();

        assert_eq!(find_flags_files(root).unwrap(), vec![root.join("a/flags.make")]);
    }

    #[test]
    fn test_missing_root_is_reported() {
        let tmpdir = test::tempdir();
        let err = find_flags_files(&tmpdir.path().join("missing")).unwrap_err();
        assert!(matches!(err, ToolError::FileError(..)));
    }
}
