//! clang-tidy accelerated through ccache.
//!
//! ccache only knows how to cache compiler invocations, so `cache-tidy`
//! poses as one. The first invocation (dispatch) packs the clang-tidy command
//! line into a [`ForwardingDescriptor`], stores it in the environment and
//! calls `ccache <self> -o <stamp> -c <source>`. ccache then runs us twice
//! more (replay): once with `-E` to obtain "preprocessed" text it hashes into
//! the cache key, and once to perform the real analysis, whose diagnostics and
//! stamp file it caches.

use crate::ToolResult;

mod args;
pub mod compdb;
mod config;
mod descriptor;
mod dispatch;
pub mod output;
mod replay;
mod stamp;

pub use args::TidyArgs;
pub use config::TidyConfig;
pub use descriptor::ForwardingDescriptor;
pub use stamp::StampGuard;

/// Prefix of the logging variables (`CACHE_TIDY_LOGFILE`, `CACHE_TIDY_VERBOSE`).
pub const ENV_PREFIX: &str = "CACHE_TIDY";
/// Overrides the clang-tidy executable.
pub const CLANG_TIDY_ENV: &str = "CLANG_TIDY";
/// Overrides the ccache executable.
pub const CCACHE_ENV: &str = "CCACHE";
/// Carries the encoded [`ForwardingDescriptor`] into the replay phase.
pub const FORWARD_ENV: &str = "CACHE_TIDY_FORWARD_ARGS";
/// Extra files ccache hashes into every key.
pub const EXTRAFILES_ENV: &str = "CCACHE_EXTRAFILES";

/// Written to the stamp file after a successful analysis.
pub const STAMP_MARKER: &str = "Success";
/// Extension of the stamp file derived from the source name.
pub const STAMP_EXTENSION: &str = "cache-tidy";

/// Runs one invocation, returning the process exit code.
///
/// `args` excludes the program name.
pub fn run(config: &TidyConfig, args: &[String]) -> ToolResult<i32> {
    debug!("Invoked as {args:?}");
    match config.forwarded() {
        Some(descriptor) => replay::replay(config, &descriptor, args),
        None => dispatch::dispatch(config, args),
    }
}
