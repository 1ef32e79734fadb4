//! cmake-presets - merge CMake presets files into one

use std::process::ExitCode;

use build_helpers::env::ProcessEnv;
use build_helpers::logger::{LogSettings, ToolLogger};
use build_helpers::presets::{self, PresetsArgs};
use clap::Parser;
use log::error;

fn main() -> ExitCode {
    ToolLogger::init(
        "cmake-presets",
        &LogSettings::from_env(&ProcessEnv, "CMAKE_PRESETS"),
    );
    let args = PresetsArgs::parse();
    match presets::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
