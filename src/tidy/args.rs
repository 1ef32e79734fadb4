use std::path::{Path, PathBuf};

use crate::{ToolResult, usage};

/// clang-tidy flags whose value is a separate argument that must not be
/// mistaken for a source file.
const VALUE_FLAGS: &[&str] = &[
    "--config-file",
    "-config-file",
    "--export-fixes",
    "-export-fixes",
    "-load",
    "--load",
    "--vfsoverlay",
    "-vfsoverlay",
];

/// Options consumed by cache-tidy itself and never forwarded.
const OWN_PREFIX: &str = "--cache-tidy-";

/// A clang-tidy command line split into what cache-tidy needs to know.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TidyArgs {
    pub help: bool,
    /// `compile_commands.json` found below the `-p` directory.
    pub compdb: Option<PathBuf>,
    pub sources: Vec<PathBuf>,
    /// Everything forwarded to clang-tidy verbatim, sources excluded.
    pub tidy_args: Vec<String>,
    /// Explicit stamp file from `--cache-tidy-o=`.
    pub object_file: Option<PathBuf>,
    pub ccache: Option<PathBuf>,
    pub clang_tidy: Option<PathBuf>,
}

impl TidyArgs {
    /// Parses `args` (program name excluded). Positional arguments naming an
    /// existing path are sources; everything after `--` is passed through.
    ///
    /// A help flag anywhere before `--` wins over every other argument.
    pub fn parse(args: &[String]) -> ToolResult<Self> {
        if let Some(help) = args
            .iter()
            .take_while(|arg| *arg != "--")
            .find(|arg| matches!(arg.as_str(), "-h" | "--help"))
        {
            return Ok(Self {
                help: true,
                tidy_args: vec![help.clone()],
                ..Default::default()
            });
        }

        let mut parsed = Self::default();
        let mut iter = args.iter();
        let mut passthrough = false;
        while let Some(arg) = iter.next() {
            if passthrough {
                parsed.tidy_args.push(arg.clone());
                continue;
            }
            match arg.as_str() {
                "--" => {
                    passthrough = true;
                    parsed.tidy_args.push(arg.clone());
                }
                "-p" => {
                    let Some(dir) = iter.next() else {
                        usage!("Missing value for -p");
                    };
                    parsed.compdb = Some(compile_database(dir)?);
                    parsed.tidy_args.push(arg.clone());
                    parsed.tidy_args.push(dir.clone());
                }
                flag if VALUE_FLAGS.contains(&flag) => {
                    let Some(value) = iter.next() else {
                        usage!("Missing value for {flag}");
                    };
                    parsed.tidy_args.push(arg.clone());
                    parsed.tidy_args.push(value.clone());
                }
                _ => {
                    if let Some(dir) = arg.strip_prefix("-p=") {
                        parsed.compdb = Some(compile_database(dir)?);
                        parsed.tidy_args.push(arg.clone());
                    } else if let Some(own) = arg.strip_prefix(OWN_PREFIX) {
                        parsed.apply_own_option(own)?;
                    } else if !arg.starts_with('-') && Path::new(arg).exists() {
                        parsed.sources.push(PathBuf::from(arg));
                    } else {
                        parsed.tidy_args.push(arg.clone());
                    }
                }
            }
        }
        Ok(parsed)
    }

    fn apply_own_option(&mut self, option: &str) -> ToolResult<()> {
        let Some((key, value)) = option.split_once('=') else {
            usage!("Unknown option {OWN_PREFIX}{option}");
        };
        let value = PathBuf::from(value);
        match key {
            "o" => self.object_file = Some(value),
            "CCACHE" => self.ccache = Some(value),
            "CLANG_TIDY" => self.clang_tidy = Some(value),
            _ => usage!("Unknown option {OWN_PREFIX}{option}"),
        }
        Ok(())
    }
}

fn compile_database(dir: &str) -> ToolResult<PathBuf> {
    let candidate = Path::new(dir).join("compile_commands.json");
    if !candidate.is_file() {
        usage!("No compile_commands.json found below '{dir}'");
    }
    Ok(candidate)
}
