//! compile-flags - print the compile flags used in a CMake build tree

use std::process::ExitCode;

use build_helpers::env::ProcessEnv;
use build_helpers::flags::{self, FlagsArgs};
use build_helpers::logger::{LogSettings, ToolLogger};
use clap::Parser;
use log::error;

fn main() -> ExitCode {
    ToolLogger::init(
        "compile-flags",
        &LogSettings::from_env(&ProcessEnv, "COMPILE_FLAGS"),
    );
    let args = FlagsArgs::parse();
    match flags::run(&args) {
        Ok(flags) => {
            for flag in flags {
                println!("{flag}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
