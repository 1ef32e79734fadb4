//! Conditional command runner.
//!
//! Runs a command unless a watched file is unchanged relative to a git
//! reference, and touches a stamp file when the command succeeded (or was
//! skipped).

use std::path::PathBuf;

use clap::Parser;

use crate::git::Git;
use crate::{ToolError, ToolResult, file, process, usage};

/// Prefix of the logging variables (`RUN_IF_LOGFILE`, `RUN_IF_VERBOSE`).
pub const ENV_PREFIX: &str = "RUN_IF";

#[derive(Parser, Debug)]
#[command(name = "run-if")]
#[command(about = "Utility to invoke a subprocess based on conditions", long_about = None)]
pub struct RunIfArgs {
    /// Modifications to the environment used for invoking CMD
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// A file and git reference such as "origin/master" to diff against.
    /// CMD will only be invoked when a change to FILE since REFERENCE was detected
    #[arg(long = "diff", value_name = "FILE:REFERENCE")]
    pub diff: Option<String>,

    /// A file to touch upon successful completion of CMD. Parent paths must exist
    #[arg(long = "touch", value_name = "FILE")]
    pub touch: Option<PathBuf>,

    /// The command to be invoked followed by its arguments, all of which are
    /// passed through untouched
    #[arg(
        value_name = "CMD",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

pub fn run(args: &RunIfArgs) -> ToolResult<i32> {
    let env = parse_env(&args.env)?;

    let skip = match &args.diff {
        Some(diff) => {
            let (path, reference) = parse_diff(diff)?;
            is_unchanged(&path, reference)?
        }
        None => false,
    };

    let code = if skip { 0 } else { invoke(args, env)? };
    if code == 0
        && let Some(touch) = &args.touch
    {
        file::touch(touch)?;
    }
    Ok(code)
}

fn invoke(args: &RunIfArgs, env: Vec<(String, String)>) -> ToolResult<i32> {
    let Some((program, program_args)) = args.command.split_first() else {
        usage!("Missing command to invoke");
    };
    let cmd = process::cmd(program, program_args).envs(env);
    Ok(match cmd.run() {
        Ok(out) => {
            if !out.success() {
                debug!("{program} failed with {}", out.code);
            }
            out.code
        }
        Err(err) => {
            error!("Failed to invoke {program}: {err}");
            1
        }
    })
}

fn parse_env(entries: &[String]) -> ToolResult<Vec<(String, String)>> {
    entries
        .iter()
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(ToolError::Usage(format!(
                "Invalid --env '{entry}', expected KEY=VALUE"
            ))),
        })
        .collect()
}

/// Splits `FILE:REFERENCE` at the last colon so drive letters survive.
fn parse_diff(diff: &str) -> ToolResult<(PathBuf, &str)> {
    let Some((path, reference)) = diff.rsplit_once(':') else {
        usage!("Invalid --diff '{diff}', expected FILE:REFERENCE");
    };
    if reference.is_empty() {
        usage!("Failed to test '{path}' for changes - No diff reference provided");
    }
    let path = std::path::absolute(path)
        .map_err(|err| ToolError::FileError(err, PathBuf::from(path)))?;
    Ok((path, reference))
}

fn is_unchanged(path: &std::path::Path, reference: &str) -> ToolResult<bool> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !path.exists() {
        usage!("Failed to test '{name}' for changes - File does not exist");
    }
    let dir = path.parent().map(PathBuf::from).unwrap_or_default();
    let unchanged = Git::new(dir).is_file_unchanged(path, reference)?;
    if unchanged {
        debug!("Skipping '{name}' - no changes since {reference}");
    }
    Ok(unchanged)
}
