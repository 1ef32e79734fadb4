use std::path::PathBuf;

use crate::env::{self, EnvLookup};
use crate::process::{self, ToolOutput, run_tool};
use crate::tidy::{
    CCACHE_ENV, CLANG_TIDY_ENV, EXTRAFILES_ENV, FORWARD_ENV, ForwardingDescriptor, TidyArgs,
};
use crate::{ToolError, ToolResult};

/// Everything `cache-tidy` reads from its environment, resolved once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TidyConfig {
    pub clang_tidy: Option<PathBuf>,
    pub ccache: Option<PathBuf>,
    /// Path ccache is told to call as "the compiler".
    pub self_exe: PathBuf,
    /// Raw forwarding channel value, present only in the replay phase.
    pub forward: Option<String>,
    /// User supplied `CCACHE_EXTRAFILES` entries.
    pub extrafiles: Vec<PathBuf>,
}

impl TidyConfig {
    pub fn from_env(env: &impl EnvLookup, self_exe: PathBuf) -> Self {
        let extrafiles = env::var_non_empty(env, EXTRAFILES_ENV)
            .map(|val| {
                std::env::split_paths(&val)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            clang_tidy: resolve_tool(env, CLANG_TIDY_ENV, "clang-tidy"),
            ccache: resolve_tool(env, CCACHE_ENV, "ccache"),
            self_exe,
            forward: env::var_non_empty(env, FORWARD_ENV),
            extrafiles,
        }
    }

    /// Applies `--cache-tidy-CCACHE=` / `--cache-tidy-CLANG_TIDY=` overrides.
    pub fn with_overrides(&self, args: &TidyArgs) -> Self {
        let mut config = self.clone();
        if let Some(ccache) = &args.ccache {
            config.ccache = Some(ccache.clone());
        }
        if let Some(clang_tidy) = &args.clang_tidy {
            config.clang_tidy = Some(clang_tidy.clone());
        }
        config
    }

    /// Decodes the forwarding channel, if it holds one of our descriptors.
    pub fn forwarded(&self) -> Option<ForwardingDescriptor> {
        let raw = self.forward.as_deref()?;
        match ForwardingDescriptor::decode(raw) {
            Ok(descriptor) => Some(descriptor),
            Err(err) => {
                warn!("ignoring {FORWARD_ENV}: {err}");
                None
            }
        }
    }

    pub fn ccache_path(&self) -> ToolResult<&PathBuf> {
        self.ccache.as_ref().ok_or_else(|| ToolError::ToolNotFound {
            tool: "ccache".into(),
            env: CCACHE_ENV,
        })
    }

    pub fn clang_tidy_path(&self) -> ToolResult<&PathBuf> {
        self.clang_tidy.as_ref().ok_or_else(|| ToolError::ToolNotFound {
            tool: "clang-tidy".into(),
            env: CLANG_TIDY_ENV,
        })
    }

    /// Runs clang-tidy with `args`, capturing its combined output.
    pub fn run_clang_tidy<I, S>(&self, args: I) -> ToolResult<ToolOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<std::ffi::OsString>,
    {
        let tool = self.clang_tidy_path()?;
        run_tool(process::cmd(tool, args).capture(), tool, CLANG_TIDY_ENV)
    }
}

fn resolve_tool(env: &impl EnvLookup, key: &str, default: &str) -> Option<PathBuf> {
    match env::var_non_empty(env, key) {
        Some(val) => Some(which::which(&val).unwrap_or_else(|_| PathBuf::from(val))),
        None => which::which(default).ok(),
    }
}
