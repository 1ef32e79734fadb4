//! Environment variable utilities
//!
//! Small readers for the handful of variables the tools are configured with.
//! Every reader takes an explicit lookup so configuration can be assembled
//! from a captured environment in tests instead of the live process one.
//!
//! ```rust
//! use build_helpers::env;
//!
//! let lookup = |key: &str| (key == "CACHE_TIDY_VERBOSE").then(|| "1".to_string());
//! assert!(env::var_is_set(&lookup, "CACHE_TIDY_VERBOSE"));
//! ```

use std::path::PathBuf;

/// A read-only view of environment variables.
pub trait EnvLookup {
    fn get(&self, key: &str) -> Option<String>;
}

impl<F> EnvLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// The environment of the running process.
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Check if an environment variable is present at all, regardless of value
pub fn var_is_set(env: &impl EnvLookup, key: &str) -> bool {
    env.get(key).is_some()
}

/// Read a non-empty environment variable
pub fn var_non_empty(env: &impl EnvLookup, key: &str) -> Option<String> {
    env.get(key).filter(|val| !val.is_empty())
}

/// Parse an environment variable as a path with tilde expansion
///
/// Expands "~" to the home directory if present at the start of the path.
pub fn var_path(env: &impl EnvLookup, key: &str) -> Option<PathBuf> {
    var_non_empty(env, key).map(|val| {
        if let Some(stripped) = val.strip_prefix("~/") {
            if let Some(home) = homedir::my_home().ok().flatten() {
                home.join(stripped)
            } else {
                PathBuf::from(val)
            }
        } else {
            PathBuf::from(val)
        }
    })
}
