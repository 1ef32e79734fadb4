//! Reformats C++ sources with uncrustify.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::env::{self, EnvLookup};
use crate::{ToolError, ToolResult, file, process};

/// Overrides the uncrustify executable when `--uncrustify` is not given.
pub const UNCRUSTIFY_ENV: &str = "UNCRUSTIFY";
/// Config looked up next to the executable when `--cfg` is not given.
pub const DEFAULT_CFG: &str = "autoformat.cfg.in";

#[derive(Parser, Debug)]
#[command(name = "cpp-format")]
#[command(about = "Formatting for C++", long_about = None)]
pub struct FormatArgs {
    /// Uncrustify config to be used
    #[arg(short = 'c', long = "cfg", value_name = "CFG")]
    pub cfg: Option<PathBuf>,

    /// Path to uncrustify
    #[arg(short = 'u', long = "uncrustify", value_name = "PATH")]
    pub uncrustify: Option<PathBuf>,

    /// The files to be processed
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<PathBuf>,
}

pub fn run(args: &FormatArgs, env: &impl EnvLookup, self_exe: &Path) -> ToolResult<i32> {
    let uncrustify = args
        .uncrustify
        .clone()
        .or_else(|| env::var_path(env, UNCRUSTIFY_ENV))
        .or_else(|| which::which("uncrustify").ok())
        .ok_or_else(|| ToolError::ToolNotFound {
            tool: "uncrustify".into(),
            env: UNCRUSTIFY_ENV,
        })?;
    let cfg = args.cfg.clone().unwrap_or_else(|| {
        self_exe
            .parent()
            .map(|dir| dir.join(DEFAULT_CFG))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CFG))
    });
    debug!("formatting with {} using {}", uncrustify.display(), cfg.display());

    let mut result = 0;
    for path in &args.files {
        let cmd = process::cmd(&uncrustify, ["-c"])
            .arg(&cfg)
            .args(["--no-backup", "--mtime"])
            .arg(path);
        let out = process::run_tool(cmd, &uncrustify, UNCRUSTIFY_ENV)?;
        if !out.success() {
            warn!("uncrustify failed on {} with {}", path.display(), out.code);
            result = out.code;
        }
        strip_file(path)?;
    }
    Ok(result)
}

/// Rewrites `path` without trailing whitespace, leaving it untouched when clean.
fn strip_file(path: &Path) -> ToolResult<()> {
    let text = file::read_to_string(path)?;
    let stripped = strip_trailing_whitespace(&text);
    if stripped != text {
        file::write(path, &stripped)?;
    }
    Ok(())
}

/// Trims every line and terminates each with a single `\n`.
pub fn strip_trailing_whitespace(text: &str) -> String {
    text.lines().map(|line| format!("{}\n", line.trim_end())).collect()
}
