//! recode - enforce an encoding on a stream passed through stdin

use std::process::ExitCode;

use build_helpers::env::ProcessEnv;
use build_helpers::logger::{LogSettings, ToolLogger};
use build_helpers::recode::{self, RecodeArgs};
use clap::Parser;
use log::error;

fn main() -> ExitCode {
    ToolLogger::init("recode", &LogSettings::from_env(&ProcessEnv, "RECODE"));
    let args = RecodeArgs::parse();
    match recode::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
