//! cache-tidy - run clang-tidy through ccache
//!
//! Accepts the same command line as clang-tidy.

use std::path::PathBuf;

use build_helpers::env::ProcessEnv;
use build_helpers::logger::{LogSettings, ToolLogger};
use build_helpers::tidy::{self, TidyConfig};
use build_helpers::{ToolError, ToolResult};
use log::error;

fn main() {
    ToolLogger::init(
        "cache-tidy",
        &LogSettings::from_env(&ProcessEnv, tidy::ENV_PREFIX),
    );
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            1
        }
    };
    log::logger().flush();
    std::process::exit(code);
}

fn run() -> ToolResult<i32> {
    let mut argv = std::env::args_os();
    let argv0 = argv.next().map(PathBuf::from).unwrap_or_default();
    let args = argv
        .map(|arg| {
            arg.into_string()
                .map_err(|arg| ToolError::Usage(format!("argument is not UTF-8: {arg:?}")))
        })
        .collect::<ToolResult<Vec<_>>>()?;
    let self_exe = std::env::current_exe().unwrap_or(argv0);
    let config = TidyConfig::from_env(&ProcessEnv, self_exe);
    tidy::run(&config, &args)
}
