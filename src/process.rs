//! Process execution utilities
//!
//! A thin builder over `duct` for running the external tools (ccache,
//! clang-tidy, git, uncrustify, user commands). Non-zero exits are not errors
//! here: callers get the exit code back and decide what it means. Only a
//! failure to spawn or wait on the child is reported as [`ToolError`].
//!
//! ```rust,no_run
//! use build_helpers::process;
//!
//! # fn main() -> build_helpers::ToolResult<()> {
//! let out = process::cmd("clang-tidy", ["--version"]).capture().run()?;
//! println!("exit {} said {}", out.code, out.output);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::ExitStatus;

use duct::IntoExecutablePath;

use crate::{ToolError, ToolResult};

/// Outcome of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub code: i32,
    /// Combined stdout and stderr when captured, empty otherwise.
    pub output: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Maps an exit status to a process exit code; signals count as 1.
pub fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

#[derive(Default)]
pub struct ToolCommand {
    program: OsString,
    args: Vec<OsString>,
    env_vars: BTreeMap<OsString, OsString>,
    capture: bool,
}

pub fn cmd<T, U>(program: T, args: U) -> ToolCommand
where
    T: IntoExecutablePath,
    U: IntoIterator,
    U::Item: Into<OsString>,
{
    let program = program.to_executable();
    let args = args.into_iter().map(|arg| arg.into()).collect::<Vec<_>>();
    ToolCommand {
        program,
        args,
        ..Default::default()
    }
}

impl ToolCommand {
    /// Capture stdout and stderr into a single text instead of inheriting them.
    pub fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<OsString>>) -> Self {
        self.args.extend(args.into_iter().map(|arg| arg.into()));
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        for (k, v) in vars {
            self.env_vars.insert(k.into(), v.into());
        }
        self
    }

    /// Runs to completion and reports the exit code; never fails on a non-zero exit.
    pub fn run(&self) -> ToolResult<ToolOutput> {
        debug!("$ {self}");
        let output = self
            .build_expr()
            .run()
            .map_err(|err| ToolError::ProcessError(err, self.to_string()))?;
        Ok(ToolOutput {
            code: exit_code(output.status),
            output: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    fn build_expr(&self) -> duct::Expression {
        let mut expr = duct::cmd(self.program.clone(), self.args.clone()).unchecked();
        if self.capture {
            expr = expr.stderr_to_stdout().stdout_capture();
        }
        for (k, v) in &self.env_vars {
            expr = expr.env(k, v);
        }
        expr
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Runs `cmd`, turning a missing executable into [`ToolError::ToolNotFound`]
/// naming the variable that overrides `tool`.
pub fn run_tool(cmd: ToolCommand, tool: &Path, env: &'static str) -> ToolResult<ToolOutput> {
    cmd.run().map_err(|err| {
        if err.is_not_found() {
            ToolError::ToolNotFound {
                tool: tool.display().to_string(),
                env,
            }
        } else {
            err
        }
    })
}

impl ToolError {
    /// True when a spawn failed because the program does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            ToolError::ProcessError(err, _) => err.kind() == std::io::ErrorKind::NotFound,
            ToolError::ToolNotFound { .. } => true,
            _ => false,
        }
    }
}
