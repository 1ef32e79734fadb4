//! conan-package - test and deploy conan packages

use std::process::ExitCode;

use build_helpers::conan::{self, ConanArgs};
use build_helpers::env::{self, ProcessEnv};
use build_helpers::logger::{LogSettings, ToolLogger};
use clap::Parser;
use log::error;

fn main() -> ExitCode {
    let args = ConanArgs::parse();
    let mut settings = LogSettings::from_env(&ProcessEnv, conan::ENV_PREFIX);
    settings.verbose |= args.verbose || env::var_non_empty(&ProcessEnv, conan::VERBOSE_ENV).is_some();
    ToolLogger::init("conan-package", &settings);

    let code = match conan::run(&args, &ProcessEnv) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    };
    log::logger().flush();
    code
}
