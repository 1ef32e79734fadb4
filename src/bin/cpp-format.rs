//! cpp-format - reformat C++ sources with uncrustify

use std::path::PathBuf;

use build_helpers::env::ProcessEnv;
use build_helpers::format::{self, FormatArgs};
use build_helpers::logger::{LogSettings, ToolLogger};
use clap::Parser;
use log::error;

fn main() {
    ToolLogger::init(
        "cpp-format",
        &LogSettings::from_env(&ProcessEnv, "CPP_FORMAT"),
    );
    let args = FormatArgs::parse();
    let self_exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("cpp-format"));
    let code = match format::run(&args, &ProcessEnv, &self_exe) {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            1
        }
    };
    log::logger().flush();
    std::process::exit(code);
}
