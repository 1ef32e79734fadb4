//! run-if - invoke a command only when a watched file changed

use build_helpers::env::ProcessEnv;
use build_helpers::logger::{LogSettings, ToolLogger};
use build_helpers::run_if::{self, RunIfArgs};
use clap::Parser;
use log::{debug, error};

fn main() {
    ToolLogger::init(
        "run-if",
        &LogSettings::from_env(&ProcessEnv, run_if::ENV_PREFIX),
    );
    debug!("Invoked as {:?}", std::env::args_os().collect::<Vec<_>>());
    let args = RunIfArgs::parse();
    let code = match run_if::run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            1
        }
    };
    log::logger().flush();
    std::process::exit(code);
}
