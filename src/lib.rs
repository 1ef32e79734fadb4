#[macro_use]
extern crate log;

pub use error::{ToolError, ToolResult};

pub mod conan;
pub mod env;
pub mod error;
pub mod file;
pub mod flags;
pub mod format;
pub mod git;
pub mod logger;
pub mod presets;
pub mod process;
pub mod recode;
pub mod regex;
pub mod run_if;
pub mod tidy;
